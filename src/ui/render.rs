use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Model;
use crate::highlight::HighlightSpan;
use crate::preview::PreviewState;
use crate::validate::INVALID_MESSAGE;

use super::{
    BANNER_HEIGHT, DOWNLOAD_BUTTON_LABEL, EDITOR_WIDTH_PERCENT, PREVIEW_WIDTH_PERCENT, images,
    overlays, status,
};

/// Where each part of the screen is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Editor pane, border included
    pub editor: Rect,
    /// Error banner under the editor, only while the document is invalid
    pub banner: Option<Rect>,
    /// Preview pane, border included
    pub preview: Rect,
    /// Download button in the preview header; zero-sized when it does not fit
    pub button: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn editor_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.editor)
    }

    pub fn preview_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.preview)
    }
}

/// Split `area` into panes. `invalid` reserves the error banner.
pub fn screen_layout(area: Rect, invalid: bool) -> ScreenLayout {
    let status = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };
    let body = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
        ])
        .split(body);

    let left = columns[0];
    let (editor, banner) = if invalid && left.height > BANNER_HEIGHT * 2 {
        (
            Rect {
                height: left.height - BANNER_HEIGHT,
                ..left
            },
            Some(Rect {
                y: left.y + left.height - BANNER_HEIGHT,
                height: BANNER_HEIGHT,
                ..left
            }),
        )
    } else {
        (left, None)
    };

    let preview = columns[1];
    #[allow(clippy::cast_possible_truncation)]
    let label_width = DOWNLOAD_BUTTON_LABEL.len() as u16;
    let button = if preview.width >= label_width + 4 && preview.height > 0 {
        Rect::new(
            preview.x + preview.width - label_width - 2,
            preview.y,
            label_width,
            1,
        )
    } else {
        Rect::new(preview.x, preview.y, 0, 0)
    };

    ScreenLayout {
        editor,
        banner,
        preview,
        button,
        status,
    }
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = screen_layout(area, !model.validation().is_valid());

    render_editor(model, frame, &layout);
    if let Some(banner) = layout.banner {
        render_error_banner(model, frame, banner);
    }
    render_preview(model, frame, &layout);

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, layout.status);
    } else {
        status::render_status_bar(model, frame, layout.status);
    }

    if model.alert.is_some() {
        overlays::render_alert_overlay(model, frame, area);
    } else if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_editor(model: &Model, frame: &mut Frame, layout: &ScreenLayout) {
    let border_style = if model.validation().is_valid() {
        Style::default()
    } else {
        Style::default().fg(Color::Red)
    };
    let block = Block::default()
        .title(" SVG Code ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(layout.editor);
    frame.render_widget(Clear, layout.editor);
    frame.render_widget(block, layout.editor);

    let buf = &model.buffer;
    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines);
    let highlighted = model.highlighted_lines();

    let start = model.editor_scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + inner.height as usize).min(total_lines);
    let cursor = buf.cursor();

    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        let line_num = format!("{:>width$} ", line_idx + 1, width = gutter_width as usize);

        let segments = highlighted
            .and_then(|lines| lines.get(line_idx))
            .filter(|spans| spans.iter().map(|s| s.text.len()).sum::<usize>() == line_text.len())
            .map_or_else(
                || vec![(line_text.clone(), Style::default())],
                |spans| highlight_segments(spans),
            );
        let cursor_col = (line_idx == cursor.line).then_some(cursor.col);

        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];
        spans.extend(spans_with_cursor(segments, cursor_col));
        content.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(content), inner);
}

fn highlight_segments(spans: &[HighlightSpan]) -> Vec<(String, Style)> {
    spans
        .iter()
        .map(|span| {
            let style = span.fg.map_or_else(Style::default, |fg| {
                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b))
            });
            (span.text.clone(), style)
        })
        .collect()
}

/// Turn styled segments into spans, drawing the cursor at byte `cursor_col`.
fn spans_with_cursor(
    segments: Vec<(String, Style)>,
    cursor_col: Option<usize>,
) -> Vec<Span<'static>> {
    let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
    let Some(col) = cursor_col else {
        return segments
            .into_iter()
            .map(|(text, style)| Span::styled(text, style))
            .collect();
    };

    let mut out = Vec::new();
    let mut offset = 0usize;
    let mut placed = false;
    for (text, style) in segments {
        let end = offset + text.len();
        if placed || col < offset || col >= end {
            out.push(Span::styled(text, style));
            offset = end;
            continue;
        }
        let local = col - offset;
        let cursor_len = text[local..].chars().next().map_or(0, char::len_utf8);
        if local > 0 {
            out.push(Span::styled(text[..local].to_string(), style));
        }
        out.push(Span::styled(
            text[local..local + cursor_len].to_string(),
            cursor_style,
        ));
        if local + cursor_len < text.len() {
            out.push(Span::styled(text[local + cursor_len..].to_string(), style));
        }
        placed = true;
        offset = end;
    }
    if !placed {
        out.push(Span::styled(" ", cursor_style));
    }
    out
}

fn render_error_banner(model: &Model, frame: &mut Frame, area: Rect) {
    let message = model.validation().message().unwrap_or(INVALID_MESSAGE);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    if let Some(err) = model.syntax_error() {
        block = block.title_bottom(
            Line::styled(
                format!(" {}:{} {} ", err.line, err.column, err.kind),
                Style::default().fg(Color::Indexed(245)),
            )
            .right_aligned(),
        );
    }
    let text = Line::from(vec![
        Span::styled(
            "\u{2717} ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(message.to_string(), Style::default().fg(Color::Red)),
    ]);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_preview(model: &mut Model, frame: &mut Frame, layout: &ScreenLayout) {
    let block = Block::default().title(" Preview ").borders(Borders::ALL);
    let inner = block.inner(layout.preview);
    frame.render_widget(Clear, layout.preview);
    frame.render_widget(block, layout.preview);
    render_download_button(model, frame, layout.button);

    // Never show a preview, cached or not, for markup that failed validation.
    if !model.validation().is_valid() {
        return;
    }
    let dim = Style::default().fg(Color::Indexed(245));
    if !model.images_enabled {
        let note = Paragraph::new("Preview disabled (--no-preview)").style(dim);
        frame.render_widget(note, inner);
        return;
    }
    match &model.preview {
        PreviewState::Suppressed | PreviewState::Blank => {}
        PreviewState::Unrenderable(reason) => {
            let note = Paragraph::new(format!("Nothing to draw: {reason}"))
                .style(dim)
                .wrap(Wrap { trim: true });
            frame.render_widget(note, inner);
        }
        PreviewState::Rendered(_) => images::render_preview_image(model, frame, inner),
    }
}

fn render_download_button(model: &Model, frame: &mut Frame, area: Rect) {
    if area.width == 0 {
        return;
    }
    let style = if model.can_export() {
        Style::default()
            .bg(Color::Green)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };
    frame.render_widget(Paragraph::new(DOWNLOAD_BUTTON_LABEL).style(style), area);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
