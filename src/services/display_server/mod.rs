//! DisplayServer: responsibility and boundaries
//!
//! This module and its submodules are the ONLY place that speaks the X11 protocol.
//! Everything above it (layout probe, window enumerator, restorer, change detector)
//! works against the `DisplayServer` trait and never sees atoms, cookies or raw events.

mod atoms;
mod dry_run;
#[cfg(test)]
pub mod fake;
mod r#trait;
mod x11;

pub use self::dry_run::DryRunServer;
pub use self::r#trait::{
    Capabilities, CrtcGeometry, CrtcId, DisplayServer, OutputId, OutputInfo, ScreenResources,
    ServerEvent, SupportedHints, Timestamp,
};
pub use self::x11::X11Server;
