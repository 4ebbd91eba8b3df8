//! Terminal UI components.
//!
//! The screen is split into the "SVG Code" editor on the left and the
//! "Preview" pane on the right, with a status line at the bottom. The
//! download button sits in the preview header. [`screen_layout`] is shared
//! with mouse hit-testing so clicks land where things are drawn.

mod images;
mod overlays;
mod render;
mod status;

pub use overlays::{alert_rect, centered_popup_rect};
pub use render::{ScreenLayout, line_number_width, render, screen_layout};

pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;
/// Rows taken by the error banner under an invalid document.
pub const BANNER_HEIGHT: u16 = 3;
pub const DOWNLOAD_BUTTON_LABEL: &str = "[ Download SVG ]";

#[cfg(test)]
mod tests;
