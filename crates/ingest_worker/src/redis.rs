mod log_repository;

pub use log_repository::*;
