mod log_message;
mod result;
mod traits;

pub use log_message::*;
pub use result::*;
pub use traits::*;
