use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;
use crate::export::ExportState;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model
        .source_path
        .as_ref()
        .and_then(|path| path.file_name())
        .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string());
    let modified = if model.has_unexported_changes() {
        " [modified]"
    } else {
        ""
    };

    let cursor = model.buffer.cursor();
    let line_text = model.buffer.line_at(cursor.line).unwrap_or_default();
    let display_col = line_text
        .get(..cursor.col)
        .map_or(cursor.col, |before| before.chars().count());
    let cursor_info = format!("Ln {}, Col {}", cursor.line + 1, display_col + 1);

    let state = match model.export_state() {
        ExportState::Exportable => "[valid]",
        ExportState::Empty => "[empty]",
        ExportState::Invalid => "[invalid]",
    };

    let status = format!(
        " {filename}{modified}  {cursor_info}  {state}  Ctrl+S:download  F1:help"
    );
    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!(" {prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
