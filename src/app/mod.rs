//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Writing `image.svg` is the one side effect; it runs after `update` in
//! `effects.rs`.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, PRESET_SVG, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug)]
pub struct App {
    initial_text: String,
    source_path: Option<PathBuf>,
    out_dir: PathBuf,
    images_enabled: bool,
    force_half_cell: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application editing the preset document.
    pub fn new() -> Self {
        Self {
            initial_text: PRESET_SVG.to_string(),
            source_path: None,
            out_dir: PathBuf::from("."),
            images_enabled: true,
            force_half_cell: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Seed the buffer with the contents of `path` instead of the preset.
    ///
    /// The file is only read; exports always go to the output directory.
    #[must_use]
    pub fn with_seed(mut self, path: PathBuf, text: String) -> Self {
        self.source_path = Some(path);
        self.initial_text = text;
        self
    }

    /// Directory that receives `image.svg`.
    #[must_use]
    pub fn with_out_dir(mut self, dir: PathBuf) -> Self {
        self.out_dir = dir;
        self
    }

    /// Enable or disable the graphical preview.
    #[must_use]
    pub const fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Force half-block rendering, bypassing protocol detection.
    #[must_use]
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
