mod amqp;
mod domain;
mod redis;
mod secrets;
mod telemetry;

pub use amqp::*;
pub use domain::*;
pub use redis::*;
pub use secrets::*;
pub use telemetry::*;

// Re-export mocks when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDeadLetterPublisher;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockLogRepository;
