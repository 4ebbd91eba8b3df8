use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::app::Model;

/// Popup rect for a blocking alert carrying `message`.
pub fn alert_rect(area: Rect, message: &str) -> Rect {
    #[allow(clippy::cast_possible_truncation)]
    let text_width = message.chars().count().min(usize::from(u16::MAX)) as u16;
    let popup_width = (text_width + 8).max(36);
    centered_popup_rect(popup_width, 7, area)
}

pub fn render_alert_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(message) = model.alert.as_deref() else {
        return;
    };
    let popup = alert_rect(area, message);

    let lines = vec![
        Line::styled(
            message.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(
            "Press any key to continue",
            Style::default().fg(Color::Indexed(245)),
        ),
    ];

    let block = Block::default()
        .title(" Alert ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .centered()
            .wrap(Wrap { trim: true }),
        popup,
    );
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(6).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
    let out_path = model.saver().destination().display().to_string();

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Editing", section_style));
    lines.push(Line::raw("  Type / paste        Edit markup"));
    lines.push(Line::raw("  Arrows, Home/End    Move cursor"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Ctrl+Home/End       Buffer start / end"));
    lines.push(Line::raw("  PageUp/PageDown     Scroll editor"));
    lines.push(Line::raw("  Click               Move cursor"));
    lines.push(Line::raw("  Ctrl+R              Reset document"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Download", section_style));
    lines.push(Line::raw("  Ctrl+S / [ Download SVG ]"));
    lines.push(Line::raw(format!("  Writes {out_path}")));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section_style));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw("  Ctrl+Q / Ctrl+C     Quit"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = Block::default()
        .title("Help")
        .title_bottom(
            Line::styled(" any key closes ", Style::default().fg(Color::Indexed(245)))
                .right_aligned(),
        )
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
