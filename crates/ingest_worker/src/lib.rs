pub mod amqp;
pub mod domain;
pub mod ingest_worker;
pub mod redis;

pub use amqp::*;
pub use domain::*;
pub use ingest_worker::*;
pub use redis::*;
