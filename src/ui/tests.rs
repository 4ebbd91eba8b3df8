use super::*;
use crate::app::{Message, Model, PRESET_SVG, update};
use crate::export::NOT_EXPORTABLE_MESSAGE;
use crate::preview::PreviewState;
use crate::validate::INVALID_MESSAGE;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui_image::picker::Picker;

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn draw(model: &mut Model) -> Terminal<TestBackend> {
    let (width, height) = model.terminal_size;
    let mut terminal = create_test_terminal(width, height);
    terminal.draw(|frame| render(model, frame)).unwrap();
    terminal
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|c| c.symbol()).collect()
}

fn row_text(terminal: &Terminal<TestBackend>, row: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|col| buffer[(col, row)].symbol())
        .collect()
}

fn text_only_model(text: &str, size: (u16, u16)) -> Model {
    let mut model = Model::new(text, size);
    model.images_enabled = false;
    model
}

#[test]
fn test_render_shows_both_panes_and_button() {
    let mut model = text_only_model(PRESET_SVG, (80, 24));
    let terminal = draw(&mut model);
    let content = screen_text(&terminal);

    assert!(content.contains("SVG Code"));
    assert!(content.contains("Preview"));
    assert!(content.contains(DOWNLOAD_BUTTON_LABEL));
    assert!(content.contains("<circle"));
}

#[test]
fn test_status_bar_reports_document_state() {
    let mut model = text_only_model(PRESET_SVG, (80, 24));
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 23).contains("[valid]"));

    let mut model = update(model, Message::SetText("   ".into()));
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 23).contains("[empty]"));

    let mut model = update(model, Message::SetText("<svg".into()));
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 23).contains("[invalid]"));
}

#[test]
fn test_status_bar_marks_unexported_changes() {
    let model = text_only_model(PRESET_SVG, (80, 24));
    let mut model = update(model, Message::EditorInsertChar(' '));
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 23).contains("[modified]"));
}

#[test]
fn test_invalid_document_shows_error_banner() {
    let model = text_only_model(PRESET_SVG, (120, 30));
    let mut model = update(model, Message::SetText("<svg><g></svg>".into()));
    let terminal = draw(&mut model);
    let content = screen_text(&terminal);

    assert!(content.contains(INVALID_MESSAGE));
    assert!(content.contains("does not match"));

    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(0, 0)].fg, Color::Red, "editor border turns red");
}

#[test]
fn test_valid_document_has_no_banner() {
    let mut model = text_only_model(PRESET_SVG, (120, 30));
    let terminal = draw(&mut model);
    assert!(!screen_text(&terminal).contains(INVALID_MESSAGE));
}

#[test]
fn test_alert_overlay_shows_message() {
    let mut model = text_only_model(PRESET_SVG, (80, 24));
    model.alert = Some(NOT_EXPORTABLE_MESSAGE.to_string());
    let terminal = draw(&mut model);
    let content = screen_text(&terminal);

    assert!(content.contains(NOT_EXPORTABLE_MESSAGE));
    assert!(content.contains("Press any key to continue"));
}

#[test]
fn test_alert_takes_precedence_over_help() {
    let mut model = text_only_model(PRESET_SVG, (80, 24));
    model.help_visible = true;
    model.alert = Some(NOT_EXPORTABLE_MESSAGE.to_string());
    let terminal = draw(&mut model);
    let content = screen_text(&terminal);

    assert!(content.contains(NOT_EXPORTABLE_MESSAGE));
    assert!(!content.contains("Word movement"));
}

#[test]
fn test_help_overlay_lists_download_target() {
    let mut model = text_only_model(PRESET_SVG, (80, 30));
    model.help_visible = true;
    let terminal = draw(&mut model);
    let content = screen_text(&terminal);

    assert!(content.contains("Download"));
    assert!(content.contains("image.svg"));
}

#[test]
fn test_toast_replaces_status_bar() {
    let model = text_only_model(PRESET_SVG, (100, 24));
    let model = update(model, Message::EditorInsertChar(' '));
    let mut model = update(model, Message::Quit);
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 23);

    assert!(status.contains("[warn]"));
    assert!(status.contains("Changes not downloaded"));
    assert!(!status.contains("Ctrl+S:download"));
}

#[test]
fn test_disabled_preview_shows_note() {
    let mut model = text_only_model(PRESET_SVG, (80, 24));
    let terminal = draw(&mut model);
    assert!(screen_text(&terminal).contains("Preview disabled"));
}

#[test]
fn test_preview_renders_image_with_halfblocks() {
    let mut model = Model::new(PRESET_SVG, (80, 24)).with_picker(Some(Picker::halfblocks()));
    model.refresh_preview();
    assert!(matches!(model.preview, PreviewState::Rendered(_)));
    assert!(model.preview_protocol.is_some());

    let terminal = draw(&mut model);
    let inner = model.layout().preview_inner();
    let buffer = terminal.backend().buffer();
    let painted = (inner.top()..inner.bottom())
        .flat_map(|row| (inner.left()..inner.right()).map(move |col| (col, row)))
        .any(|pos| buffer[pos].bg != Color::Reset);
    assert!(painted, "preview pane should contain image cells");
}

#[test]
fn test_preview_is_cached_until_document_changes() {
    let mut model = Model::new(PRESET_SVG, (80, 24)).with_picker(Some(Picker::halfblocks()));
    model.refresh_preview();
    assert!(matches!(model.preview, PreviewState::Rendered(_)));

    let mut model = update(model, Message::SetText("<svg".into()));
    model.refresh_preview();
    assert!(matches!(model.preview, PreviewState::Suppressed));
    assert!(model.preview_protocol.is_none());
}

#[test]
fn test_invalid_document_draws_empty_preview() {
    let model = Model::new(PRESET_SVG, (80, 24)).with_picker(Some(Picker::halfblocks()));
    let mut model = update(model, Message::SetText("<svg><circle></svg>".into()));
    model.refresh_preview();
    let terminal = draw(&mut model);

    let inner = model.layout().preview_inner();
    let buffer = terminal.backend().buffer();
    let blank = (inner.top()..inner.bottom())
        .flat_map(|row| (inner.left()..inner.right()).map(move |col| (col, row)))
        .all(|pos| buffer[pos].symbol() == " " && buffer[pos].bg == Color::Reset);
    assert!(blank, "no preview is drawn for invalid markup");
}

#[test]
fn test_edit_during_pending_resize_hides_old_drawing() {
    let mut model = Model::new(PRESET_SVG, (80, 24)).with_picker(Some(Picker::halfblocks()));
    model.refresh_preview();
    model.discard_stale_preview();
    assert!(model.preview_protocol.is_some(), "current preview is kept");

    let replacement = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
    let mut model = update(model, Message::SetText(replacement.into()));
    model.discard_stale_preview();
    assert!(matches!(model.preview, PreviewState::Blank));
    assert!(model.preview_protocol.is_none());

    let terminal = draw(&mut model);
    let inner = model.layout().preview_inner();
    let buffer = terminal.backend().buffer();
    let blank = (inner.top()..inner.bottom())
        .flat_map(|row| (inner.left()..inner.right()).map(move |col| (col, row)))
        .all(|pos| buffer[pos].bg == Color::Reset);
    assert!(blank, "the previous document's image is not drawn");

    model.refresh_preview();
    assert!(!matches!(model.preview, PreviewState::Blank));
}

#[test]
fn test_unrenderable_svg_shows_reason() {
    let model = Model::new(PRESET_SVG, (100, 24)).with_picker(Some(Picker::halfblocks()));
    let mut model = update(
        model,
        Message::SetText(r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="10"/>"#.into()),
    );
    model.refresh_preview();
    let terminal = draw(&mut model);
    assert!(screen_text(&terminal).contains("Nothing to draw"));
}

#[test]
fn test_screen_layout_places_button_in_preview_header() {
    let layout = screen_layout(Rect::new(0, 0, 80, 24), false);
    assert_eq!(layout.status, Rect::new(0, 23, 80, 1));
    assert_eq!(layout.editor, Rect::new(0, 0, 40, 23));
    assert_eq!(layout.preview, Rect::new(40, 0, 40, 23));
    #[allow(clippy::cast_possible_truncation)]
    let label_width = DOWNLOAD_BUTTON_LABEL.len() as u16;
    assert_eq!(layout.button, Rect::new(80 - label_width - 2, 0, label_width, 1));
    assert!(layout.banner.is_none());
}

#[test]
fn test_screen_layout_reserves_banner_when_invalid() {
    let layout = screen_layout(Rect::new(0, 0, 80, 24), true);
    let banner = layout.banner.unwrap();
    assert_eq!(banner.height, BANNER_HEIGHT);
    assert_eq!(layout.editor.height + banner.height, 23);
    assert_eq!(banner.y, layout.editor.y + layout.editor.height);
}

#[test]
fn test_screen_layout_drops_banner_and_button_when_cramped() {
    let layout = screen_layout(Rect::new(0, 0, 20, 5), true);
    assert!(layout.banner.is_none());
    assert_eq!(layout.button.width, 0);
}

#[test]
fn test_alert_rect_fits_message() {
    let area = Rect::new(0, 0, 80, 24);
    let popup = alert_rect(area, NOT_EXPORTABLE_MESSAGE);
    assert!(usize::from(popup.width) > NOT_EXPORTABLE_MESSAGE.len());
    assert_eq!(popup.height, 7);
    assert_eq!(popup.x, (80 - popup.width) / 2);
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(1), 1);
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(999), 3);
    assert_eq!(line_number_width(1_000), 4);
}

#[test]
fn test_render_tiny_terminal_does_not_panic() {
    let mut model = Model::new("<svg", (3, 2)).with_picker(Some(Picker::halfblocks()));
    model.refresh_preview();
    let _ = draw(&mut model);
}
