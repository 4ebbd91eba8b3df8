use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::editor::InputBuffer;
use crate::export::{ExportState, Exporter, FileSaver};
use crate::highlight::HighlightSpan;
use crate::preview::PreviewState;
use crate::ui::ScreenLayout;
use crate::validate::{SyntaxError, ValidationResult};

/// Document loaded when no seed file is given.
pub const PRESET_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
  <circle cx="50" cy="50" r="40" stroke="black" stroke-width="3" fill="deepskyblue" />
</svg>
"#;

/// Font cell size assumed when no picker has measured the terminal.
const FALLBACK_FONT_SIZE: (u16, u16) = (10, 20);

/// Hash a byte slice for content comparison.
pub(super) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Revision and pane size the cached preview was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreviewKey {
    revision: u64,
    width: u16,
    height: u16,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// The markup being edited
    pub buffer: InputBuffer,
    /// Verdict for `validated_revision` of the buffer
    pub(super) validation: ValidationResult,
    /// Location and kind of the syntax error, when invalid
    pub(super) syntax_error: Option<SyntaxError>,
    validated_revision: Option<u64>,
    /// Document restored by Ctrl+R
    pub initial_text: String,
    /// Seed file the document was read from, if any
    pub source_path: Option<PathBuf>,
    pub(super) exporter: Exporter,
    pub(super) saver: FileSaver,
    /// Hash of the text last exported (or loaded)
    pub(super) baseline_hash: u64,
    /// Blocking alert; input is swallowed until dismissed
    pub alert: Option<String>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Set after first quit attempt with unexported changes; allows second quit to proceed
    pub quit_confirmed: bool,
    /// Scroll offset for the editor viewport (line index of first visible line)
    pub editor_scroll_offset: usize,
    /// Terminal size in cells
    pub terminal_size: (u16, u16),
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Whether the graphical preview is enabled
    pub images_enabled: bool,
    /// Preview for `preview_key`
    pub preview: PreviewState,
    /// Terminal protocol drawing `preview`, when it holds an image
    pub preview_protocol: Option<StatefulProtocol>,
    preview_key: Option<PreviewKey>,
    highlighted: Option<(u64, Vec<Vec<HighlightSpan>>)>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("revision", &self.buffer.revision())
            .field("validation", &self.validation)
            .field("alert", &self.alert)
            .field("terminal_size", &self.terminal_size)
            .field("images_enabled", &self.images_enabled)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model editing `text`, exporting into the current directory.
    pub fn new(text: &str, terminal_size: (u16, u16)) -> Self {
        let mut model = Self {
            buffer: InputBuffer::from_text(text),
            initial_text: text.to_string(),
            baseline_hash: hash_bytes(text.as_bytes()),
            terminal_size,
            ..Self::default()
        };
        model.sync_validation();
        model
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    /// Export into `dir` instead of the current directory.
    #[must_use]
    pub fn with_out_dir(mut self, dir: PathBuf) -> Self {
        self.saver = FileSaver::new(dir);
        self
    }

    pub const fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub const fn syntax_error(&self) -> Option<&SyntaxError> {
        self.syntax_error.as_ref()
    }

    pub fn export_state(&self) -> ExportState {
        ExportState::of(&self.buffer.text(), &self.validation)
    }

    pub fn can_export(&self) -> bool {
        self.export_state().is_exportable()
    }

    pub const fn saver(&self) -> &FileSaver {
        &self.saver
    }

    /// Save handles alive right now; zero outside an export.
    pub fn live_save_handles(&self) -> usize {
        self.exporter.live_handles()
    }

    /// Whether the document differs from what was last exported or loaded.
    pub fn has_unexported_changes(&self) -> bool {
        hash_bytes(self.buffer.text().as_bytes()) != self.baseline_hash
    }

    pub fn layout(&self) -> ScreenLayout {
        let (width, height) = self.terminal_size;
        crate::ui::screen_layout(
            Rect::new(0, 0, width, height),
            !self.validation.is_valid(),
        )
    }

    /// Re-validate the buffer if it changed since the last verdict.
    pub(super) fn sync_validation(&mut self) {
        let revision = self.buffer.revision();
        if self.validated_revision == Some(revision) {
            return;
        }
        let _scope = crate::perf::scope("validate");
        let text = self.buffer.text();
        let previous = self.validation.is_valid();
        self.validation = crate::validate::validate(&text);
        self.syntax_error = if self.validation.is_valid() {
            None
        } else {
            crate::validate::check_well_formed(&text).err()
        };
        self.validated_revision = Some(revision);
        if previous != self.validation.is_valid() {
            tracing::debug!(
                revision,
                valid = self.validation.is_valid(),
                "validation changed"
            );
        }
        crate::perf::log_event(
            "validate",
            format!(
                "revision={revision} bytes={} state={:?}",
                text.len(),
                ExportState::of(&text, &self.validation)
            ),
        );
    }

    /// Rows of text visible in the editor pane.
    pub fn editor_visible_rows(&self) -> usize {
        usize::from(self.layout().editor_inner().height)
    }

    /// Highlighted lines for the current revision.
    pub fn highlighted_lines(&self) -> Option<&[Vec<HighlightSpan>]> {
        self.highlighted
            .as_ref()
            .filter(|(revision, _)| *revision == self.buffer.revision())
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn refresh_highlight(&mut self) {
        let revision = self.buffer.revision();
        if self
            .highlighted
            .as_ref()
            .is_some_and(|(cached, _)| *cached == revision)
        {
            return;
        }
        let _scope = crate::perf::scope("highlight.refresh");
        let lines = crate::highlight::highlight_markup(&self.buffer.text());
        self.highlighted = Some((revision, lines));
    }

    /// Recompute the preview if the document or the preview pane changed.
    pub fn refresh_preview(&mut self) {
        if !self.images_enabled {
            return;
        }
        let inner = self.layout().preview_inner();
        let key = PreviewKey {
            revision: self.buffer.revision(),
            width: inner.width,
            height: inner.height,
        };
        if self.preview_key == Some(key) {
            return;
        }
        self.sync_validation();

        let font_size = self
            .picker
            .as_ref()
            .map_or(FALLBACK_FONT_SIZE, Picker::font_size);
        let width_px = u32::from(inner.width) * u32::from(font_size.0);
        let height_px = u32::from(inner.height) * u32::from(font_size.1);
        let text = self.buffer.text();
        self.preview = crate::preview::render(&text, &self.validation, width_px, height_px);
        self.preview_protocol = match (&self.picker, self.preview.image()) {
            (Some(picker), Some(image)) => {
                Some(crate::image::preview_protocol(picker, image.clone()))
            }
            _ => None,
        };
        self.preview_key = Some(key);
        crate::perf::log_event(
            "preview.refresh",
            format!(
                "revision={} pane={}x{} px={width_px}x{height_px} state={}",
                key.revision,
                key.width,
                key.height,
                preview_label(&self.preview)
            ),
        );
    }

    /// Drop a cached preview that no longer matches the document.
    ///
    /// Used while a resize is pending and `refresh_preview` is held back.
    pub fn discard_stale_preview(&mut self) {
        let stale = self
            .preview_key
            .is_some_and(|key| key.revision != self.buffer.revision());
        if stale {
            self.preview = PreviewState::Blank;
            self.preview_protocol = None;
            self.preview_key = None;
            crate::perf::log_event(
                "preview.discard",
                format!("revision={}", self.buffer.revision()),
            );
        }
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

const fn preview_label(state: &PreviewState) -> &'static str {
    match state {
        PreviewState::Suppressed => "suppressed",
        PreviewState::Blank => "blank",
        PreviewState::Unrenderable(_) => "unrenderable",
        PreviewState::Rendered(_) => "rendered",
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            buffer: InputBuffer::empty(),
            validation: ValidationResult::Valid,
            syntax_error: None,
            validated_revision: None,
            initial_text: String::new(),
            source_path: None,
            exporter: Exporter::new(),
            saver: FileSaver::new("."),
            baseline_hash: hash_bytes(&[]),
            alert: None,
            help_visible: false,
            config_global_path: None,
            config_local_path: None,
            toast: None,
            should_quit: false,
            quit_confirmed: false,
            editor_scroll_offset: 0,
            terminal_size: (80, 24),
            picker: None,
            images_enabled: true,
            preview: PreviewState::Blank,
            preview_protocol: None,
            preview_key: None,
            highlighted: None,
        }
    }
}
