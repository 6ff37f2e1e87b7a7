use logsink_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    Runner::new()
        .with_named_process("heartbeat", |ctx| async move {
            let mut beats = 0u32;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!(beats, "heartbeat stopping");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        beats += 1;
                        tracing::info!(beats, "beat");
                    }
                }
            }
            Ok(())
        })
        .with_closer(|| async move {
            tracing::info!("releasing resources");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(5))
        .run()
        .await;
}
