mod log_event_processor;

pub use log_event_processor::*;
