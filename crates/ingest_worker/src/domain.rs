mod ingest_service;
mod retry_tracker;

pub use ingest_service::*;
pub use retry_tracker::*;
