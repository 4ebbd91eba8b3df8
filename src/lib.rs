// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. export::ExportError)
    clippy::module_name_repetitions
)]

//! # svgpad
//!
//! A terminal SVG editor with a live preview.
//!
//! svgpad edits SVG markup in the terminal with:
//! - Syntax-highlighted markup and line numbers
//! - A rasterized preview (Kitty, Sixel, iTerm2, half-block fallback)
//! - Validation on every edit, with an error banner for broken markup
//! - A download action that writes the buffer verbatim to `image.svg`
//!
//! ## Architecture
//!
//! svgpad uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`editor`]: Text buffer behind the code pane
//! - [`validate`]: Well-formedness checking
//! - [`preview`]: SVG rasterization
//! - [`export`]: Writing `image.svg`
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Syntax highlighting
//! - [`image`]: Terminal graphics protocol selection
//! - [`config`]: Saved default flags

pub mod app;
pub mod config;
pub mod editor;
pub mod export;
pub mod highlight;
pub mod image;
pub mod perf;
pub mod preview;
pub mod ui;
pub mod validate;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::export::{ExportError, Exporter};
    pub use crate::validate::{ValidationResult, validate};
}
