//! Exporting the current document as `image.svg`.
//!
//! An export builds an [`ExportArtifact`] over the document bytes, hands a
//! single-use [`SaveHandle`] to a [`SaveTarget`], and releases the handle
//! before returning, whatever the outcome.

use std::cell::Cell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::validate::ValidationResult;

/// File name of every exported artifact.
pub const EXPORT_FILENAME: &str = "image.svg";
/// Media type of every exported artifact.
pub const EXPORT_MEDIA_TYPE: &str = "image/svg+xml";
/// Blocking notification shown when an export is refused.
pub const NOT_EXPORTABLE_MESSAGE: &str = "Cannot download an invalid or empty SVG.";

/// Whether the current document may be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    /// Well-formed and non-empty.
    Exportable,
    /// Well-formed but [blank](is_blank).
    Empty,
    Invalid,
}

/// True when `text` holds nothing but whitespace and byte order marks.
pub fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .is_empty()
}

impl ExportState {
    pub fn of(text: &str, validation: &ValidationResult) -> Self {
        if !validation.is_valid() {
            Self::Invalid
        } else if is_blank(text) {
            Self::Empty
        } else {
            Self::Exportable
        }
    }

    pub const fn is_exportable(self) -> bool {
        matches!(self, Self::Exportable)
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// The document is invalid or empty; nothing was written.
    #[error("{}", NOT_EXPORTABLE_MESSAGE)]
    NotExportable,
    /// The save target failed to persist the artifact.
    #[error("failed to save {filename}: {source}")]
    Save {
        filename: &'static str,
        #[source]
        source: io::Error,
    },
}

/// The bytes of an exportable document plus its file metadata.
#[derive(Debug, Clone, Copy)]
pub struct ExportArtifact<'a> {
    bytes: &'a [u8],
}

impl<'a> ExportArtifact<'a> {
    /// Build an artifact, refusing invalid or blank documents.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotExportable`] unless `validation` is valid and
    /// `text` has non-whitespace content.
    pub fn new(text: &'a str, validation: &ValidationResult) -> Result<Self, ExportError> {
        if !ExportState::of(text, validation).is_exportable() {
            return Err(ExportError::NotExportable);
        }
        Ok(Self {
            bytes: text.as_bytes(),
        })
    }

    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub const fn filename(&self) -> &'static str {
        EXPORT_FILENAME
    }

    pub const fn media_type(&self) -> &'static str {
        EXPORT_MEDIA_TYPE
    }
}

/// A single-use reference to an artifact, released on drop.
pub struct SaveHandle<'a> {
    artifact: &'a ExportArtifact<'a>,
    live: &'a Cell<usize>,
}

impl SaveHandle<'_> {
    pub const fn bytes(&self) -> &[u8] {
        self.artifact.bytes()
    }

    pub const fn filename(&self) -> &'static str {
        self.artifact.filename()
    }

    pub const fn media_type(&self) -> &'static str {
        self.artifact.media_type()
    }
}

impl Drop for SaveHandle<'_> {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        tracing::trace!(filename = self.filename(), "save handle released");
    }
}

impl std::fmt::Debug for SaveHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveHandle")
            .field("filename", &self.filename())
            .field("len", &self.bytes().len())
            .finish()
    }
}

/// Host capability that persists an artifact.
pub trait SaveTarget {
    /// Persist the artifact behind `handle`.
    ///
    /// The handle is consumed, so each export saves at most once.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying storage.
    fn save(&mut self, handle: SaveHandle<'_>) -> io::Result<()>;
}

/// Writes artifacts into a directory, replacing any previous export.
///
/// Bytes are staged in a temporary file next to the destination and renamed
/// into place, so a failed write never leaves a truncated `image.svg`.
#[derive(Debug, Clone)]
pub struct FileSaver {
    dir: PathBuf,
}

impl FileSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the next export will be written to.
    pub fn destination(&self) -> PathBuf {
        self.dir.join(EXPORT_FILENAME)
    }
}

impl SaveTarget for FileSaver {
    fn save(&mut self, handle: SaveHandle<'_>) -> io::Result<()> {
        let destination = self.dir.join(handle.filename());
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        staged.write_all(handle.bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&destination).map_err(|err| err.error)?;
        crate::perf::log_event(
            "export.write",
            format!("path={} bytes={}", destination.display(), handle.bytes().len()),
        );
        Ok(())
    }
}

/// Runs exports and tracks outstanding save handles.
#[derive(Debug, Default)]
pub struct Exporter {
    live: Cell<usize>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save handles currently alive. Zero between exports.
    pub fn live_handles(&self) -> usize {
        self.live.get()
    }

    fn acquire<'a>(&'a self, artifact: &'a ExportArtifact<'a>) -> SaveHandle<'a> {
        self.live.set(self.live.get() + 1);
        SaveHandle {
            artifact,
            live: &self.live,
        }
    }

    /// Export `text` through `target` exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotExportable`] without touching `target` when
    /// the document is invalid or blank, or [`ExportError::Save`] when the
    /// target fails.
    pub fn export_document(
        &self,
        text: &str,
        validation: &ValidationResult,
        target: &mut dyn SaveTarget,
    ) -> Result<(), ExportError> {
        let artifact = ExportArtifact::new(text, validation).inspect_err(|_| {
            tracing::debug!(state = ?ExportState::of(text, validation), "export refused");
        })?;
        let handle = self.acquire(&artifact);
        target
            .save(handle)
            .map_err(|source| ExportError::Save {
                filename: EXPORT_FILENAME,
                source,
            })
            .inspect_err(|err| tracing::warn!(%err, "export failed"))?;
        tracing::debug!(bytes = artifact.bytes().len(), "exported {EXPORT_FILENAME}");
        Ok(())
    }
}
