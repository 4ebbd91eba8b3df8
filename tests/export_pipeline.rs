use std::io;

use svgpad::export::{
    EXPORT_FILENAME, EXPORT_MEDIA_TYPE, ExportError, ExportState, Exporter, FileSaver,
    SaveHandle, SaveTarget,
};
use svgpad::preview::{self, PreviewState};
use svgpad::validate::{INVALID_MESSAGE, ValidationResult, validate};

const CIRCLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
  <circle cx="50" cy="50" r="40" stroke="black" stroke-width="3" fill="deepskyblue" />
</svg>
"#;

/// Records every save it receives.
#[derive(Default)]
struct RecordingTarget {
    saves: Vec<(String, String, Vec<u8>)>,
}

impl SaveTarget for RecordingTarget {
    fn save(&mut self, handle: SaveHandle<'_>) -> io::Result<()> {
        self.saves.push((
            handle.filename().to_string(),
            handle.media_type().to_string(),
            handle.bytes().to_vec(),
        ));
        Ok(())
    }
}

/// Run validation then export, the way the editor does on Ctrl+S.
fn validate_and_export(
    text: &str,
    exporter: &Exporter,
    target: &mut dyn SaveTarget,
) -> Result<(), ExportError> {
    let validation = validate(text);
    exporter.export_document(text, &validation, target)
}

#[test]
fn test_valid_document_is_saved_once_with_metadata() {
    let exporter = Exporter::new();
    let mut target = RecordingTarget::default();

    validate_and_export(CIRCLE, &exporter, &mut target).unwrap();

    assert_eq!(target.saves.len(), 1);
    let (filename, media_type, bytes) = &target.saves[0];
    assert_eq!(filename, EXPORT_FILENAME);
    assert_eq!(media_type, EXPORT_MEDIA_TYPE);
    assert_eq!(bytes, CIRCLE.as_bytes());
    assert_eq!(exporter.live_handles(), 0);
}

#[test]
fn test_refused_exports_never_reach_the_target() {
    let exporter = Exporter::new();
    let mut target = RecordingTarget::default();

    for text in ["", "   \n", "<svg", "<svg></g>", "<a/><b/>"] {
        let err = validate_and_export(text, &exporter, &mut target).unwrap_err();
        assert!(matches!(err, ExportError::NotExportable), "{text:?}");
    }
    assert!(target.saves.is_empty());
    assert_eq!(exporter.live_handles(), 0);
}

#[test]
fn test_file_saver_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::new();
    let mut saver = FileSaver::new(dir.path());

    validate_and_export(CIRCLE, &exporter, &mut saver).unwrap();

    let written = std::fs::read(saver.destination()).unwrap();
    assert_eq!(written, CIRCLE.as_bytes());
    assert_eq!(saver.destination(), dir.path().join(EXPORT_FILENAME));
}

#[test]
fn test_editing_session_walks_the_state_machine() {
    let exporter = Exporter::new();
    let mut target = RecordingTarget::default();

    // Starts valid and exportable.
    let mut text = CIRCLE.to_string();
    assert_eq!(ExportState::of(&text, &validate(&text)), ExportState::Exportable);

    // Breaking a tag invalidates and suppresses the preview.
    text = text.replace("</svg>", "</sv>");
    let validation = validate(&text);
    assert_eq!(validation.message(), Some(INVALID_MESSAGE));
    assert_eq!(ExportState::of(&text, &validation), ExportState::Invalid);
    assert!(matches!(
        preview::render(&text, &validation, 200, 200),
        PreviewState::Suppressed
    ));
    assert!(validate_and_export(&text, &exporter, &mut target).is_err());

    // Clearing everything is valid but still not exportable.
    text.clear();
    let validation = validate(&text);
    assert_eq!(validation, ValidationResult::Valid);
    assert_eq!(ExportState::of(&text, &validation), ExportState::Empty);
    assert!(matches!(
        preview::render(&text, &validation, 200, 200),
        PreviewState::Blank
    ));
    assert!(validate_and_export(&text, &exporter, &mut target).is_err());

    // Pasting a drawing back makes it exportable again.
    text.push_str(CIRCLE);
    let validation = validate(&text);
    assert!(matches!(
        preview::render(&text, &validation, 200, 200),
        PreviewState::Rendered(_)
    ));
    validate_and_export(&text, &exporter, &mut target).unwrap();

    assert_eq!(target.saves.len(), 1);
    assert_eq!(exporter.live_handles(), 0);
}

#[test]
fn test_well_formed_but_non_svg_markup_is_exportable() {
    let exporter = Exporter::new();
    let mut target = RecordingTarget::default();
    let text = "<note><to>me</to></note>";

    validate_and_export(text, &exporter, &mut target).unwrap();
    assert_eq!(target.saves[0].2, text.as_bytes());
}
