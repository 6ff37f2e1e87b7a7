//! A concurrent application runner that manages long-running processes with graceful shutdown.
//!
//! The runner orchestrates named app processes and cleanup functions:
//! - Processes run concurrently until one fails or a shutdown signal is received
//! - On SIGTERM/SIGINT the shared cancellation token is cancelled; processes are
//!   expected to stop pulling new work and finish what is in flight
//! - Closers execute afterward, one at a time in registration order, so
//!   resources release in reverse-acquisition order when registered that way
//!
//! # Example
//!
//! ```no_run
//! use logsink_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new()
//!         .with_named_process("ticker", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {
//!                         tracing::info!("Process stopping gracefully");
//!                         break;
//!                     }
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("Process working...");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("Cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5));
//!
//!     runner.run().await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Type alias for an app process function.
/// Takes a cancellation token and returns a future that resolves to Result<(), anyhow::Error>
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// Type alias for a closer function.
/// Returns a future that resolves to Result<(), anyhow::Error>
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

/// A concurrent application runner that manages long-running processes with graceful shutdown.
pub struct Runner {
    processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a new Runner with default configuration.
    ///
    /// Default settings:
    /// - Closer timeout: 10 seconds
    /// - No app processes or closers
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named app process to the runner.
    ///
    /// Processes run concurrently. If any process returns an error, all
    /// processes are cancelled and closers are executed. The name appears in
    /// lifecycle logs.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes
            .push((name.into(), Box::new(move |token| Box::pin(process(token)))));
        self
    }

    /// Adds a closer to the runner.
    ///
    /// Closers are executed after all app processes have stopped, regardless
    /// of whether they stopped due to error or cancellation. They run
    /// sequentially in registration order; register them in
    /// reverse-acquisition order of the resources they release. All closers
    /// attempt to execute even if earlier ones fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for the shutdown phases.
    ///
    /// The timeout bounds both the wait for in-flight process work after
    /// cancellation and the execution of all closers. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets a custom cancellation token, allowing external control over
    /// process cancellation.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all app processes and waits for completion or a shutdown signal.
    ///
    /// This method:
    /// 1. Spawns all app processes concurrently
    /// 2. Monitors for SIGTERM/SIGINT signals
    /// 3. Cancels all processes when a signal is received or any process fails
    /// 4. Waits (bounded) for in-flight work to finish, then executes closers
    /// 5. Exits the process with code 0, or 1 if any process failed
    pub async fn run(self) {
        let Self {
            processes,
            closers,
            closer_timeout,
            cancellation_token: token,
        } = self;

        let mut join_set = JoinSet::new();

        for (name, process) in processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        let signal_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received interrupt signal");
                    signal_token.cancel();
                }
                Err(err) => {
                    error!("Error setting up signal handler: {}", err);
                }
            }
        });

        #[cfg(unix)]
        {
            let sigterm_token = token.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                        info!("Received terminate signal");
                        sigterm_token.cancel();
                    }
                    Err(err) => {
                        error!("Error setting up SIGTERM handler: {}", err);
                    }
                }
            });
        }

        // Wait for any process to complete, fail, or for a shutdown signal
        let mut first_error = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "App process completed");
                }
                Ok((name, Err(err))) => {
                    error!(process = %name, "App process error: {:#}", err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    if !token.is_cancelled() {
                        token.cancel();
                    }
                }
                Err(err) => {
                    error!("App process panicked: {}", err);
                    if !token.is_cancelled() {
                        token.cancel();
                    }
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        // Remaining processes observe the cancelled token, stop pulling new
        // work, and finish what is in flight. Abort only if they exceed the
        // shutdown budget.
        let drained = tokio::time::timeout(closer_timeout, async {
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok((name, Ok(()))) => debug!(process = %name, "App process completed"),
                    Ok((name, Err(err))) => {
                        error!(process = %name, "App process error during shutdown: {:#}", err)
                    }
                    Err(err) => error!("App process panicked during shutdown: {}", err),
                }
            }
        })
        .await;
        if drained.is_err() {
            error!(
                "Timed out after {:?} waiting for app processes to stop, aborting them",
                closer_timeout
            );
            join_set.shutdown().await;
        }

        if !closers.is_empty() {
            info!("Running closers with timeout of {:?}", closer_timeout);

            match tokio::time::timeout(closer_timeout, Self::run_closers(closers)).await {
                Ok(()) => {
                    info!("All closers completed");
                }
                Err(_) => {
                    error!("Closers timed out after {:?}", closer_timeout);
                }
            }
        }

        if let Some(err) = first_error {
            error!("Application exiting with error: {:#}", err);
            std::process::exit(1);
        } else {
            info!("Application exiting normally");
            std::process::exit(0);
        }
    }

    /// Runs closers one at a time in registration order.
    async fn run_closers(closers: Vec<Closer>) {
        for closer in closers {
            match closer().await {
                Ok(()) => {
                    debug!("Closer completed");
                }
                Err(err) => {
                    error!("Closer error: {:#}", err);
                }
            }
        }
    }
}
