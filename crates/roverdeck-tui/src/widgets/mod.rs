//! Custom widget components

mod dpad;
mod endpoint_dialog;
mod header;
mod status_panel;
mod stick;

pub use dpad::Dpad;
pub use endpoint_dialog::{centered_rect, EndpointDialog};
pub use header::Header;
pub use status_panel::StatusPanel;
pub use stick::StickPad;
