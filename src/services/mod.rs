pub mod capabilities;
pub mod change_detector;
pub mod config_store;
pub mod daemon;
pub mod display_server;
pub mod layout_probe;
pub mod restorer;
pub mod window_enumerator;

pub use capabilities::check_support;
pub use daemon::Daemon;
pub use display_server::{DisplayServer, DryRunServer, X11Server};
