pub mod log_control;

pub use log_control::{LogControl, Verbosity};
