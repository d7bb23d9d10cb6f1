pub mod layout;
pub mod window;

pub use layout::{DisplayLayout, OutputGeometry};
pub use window::{
    parse_wm_class, MoveResizeRequest, WindowGeometry, WindowId, WindowSnapshot, WindowState,
    ALL_DESKTOPS,
};
