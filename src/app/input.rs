use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;

const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Paste(text) => Self::handle_paste(text, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        // The alert blocks everything until a key dismisses it.
        if model.alert.is_some() {
            return Some(Message::DismissAlert);
        }
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('s') if ctrl => Some(Message::Export),
            KeyCode::Char('r') if ctrl => Some(Message::ResetDocument),
            KeyCode::Char('q' | 'c') if ctrl => Some(Message::Quit),
            KeyCode::F(1) => Some(Message::ToggleHelp),

            KeyCode::Char(c) if !ctrl && !alt => Some(Message::EditorInsertChar(c)),
            KeyCode::Tab => Some(Message::EditorInsertStr("  ".to_string())),
            KeyCode::Enter => Some(Message::EditorSplitLine),
            KeyCode::Backspace => Some(Message::EditorDeleteBack),
            KeyCode::Delete => Some(Message::EditorDeleteForward),

            KeyCode::Left if ctrl => Some(Message::EditorMoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::EditorMoveWordRight),
            KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
            KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
            KeyCode::Home if ctrl => Some(Message::EditorMoveToStart),
            KeyCode::End if ctrl => Some(Message::EditorMoveToEnd),
            KeyCode::Home => Some(Message::EditorMoveHome),
            KeyCode::End => Some(Message::EditorMoveEnd),
            KeyCode::PageUp => Some(Message::EditorScrollUp(model.editor_visible_rows().max(1))),
            KeyCode::PageDown => Some(Message::EditorScrollDown(
                model.editor_visible_rows().max(1),
            )),

            _ => None,
        }
    }

    pub(super) fn handle_paste(text: &str, model: &Model) -> Option<Message> {
        if model.alert.is_some() || model.help_visible || text.is_empty() {
            return None;
        }
        // Terminals deliver pasted newlines as CR.
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        Some(Message::EditorInsertStr(normalized))
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.alert.is_some() || model.help_visible {
            return None;
        }

        let layout = model.layout();
        match mouse.kind {
            MouseEventKind::Up(MouseButton::Left)
                if point_in_rect(mouse.column, mouse.row, layout.button) =>
            {
                Some(Message::Export)
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let editor = layout.editor_inner();
                if !point_in_rect(mouse.column, mouse.row, editor) {
                    return None;
                }
                let line = model.editor_scroll_offset + usize::from(mouse.row - editor.y);
                if line >= model.buffer.line_count() {
                    return Some(Message::EditorMoveToEnd);
                }
                let gutter = crate::ui::line_number_width(model.buffer.line_count()) + 1;
                let display_col = usize::from(mouse.column.saturating_sub(editor.x + gutter));
                let text = model.buffer.line_at(line).unwrap_or_default();
                Some(Message::EditorMoveTo(
                    line,
                    byte_col_for_display_col(&text, display_col),
                ))
            }
            MouseEventKind::ScrollDown if in_editor(mouse, &layout) => {
                Some(Message::EditorScrollDown(WHEEL_LINES))
            }
            MouseEventKind::ScrollUp if in_editor(mouse, &layout) => {
                (model.editor_scroll_offset > 0).then_some(Message::EditorScrollUp(WHEEL_LINES))
            }
            _ => None,
        }
    }
}

fn in_editor(mouse: MouseEvent, layout: &crate::ui::ScreenLayout) -> bool {
    point_in_rect(mouse.column, mouse.row, layout.editor)
}

pub(super) const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Byte offset of the character drawn at `display_col` on `line`.
///
/// Clicks past the end land at the end of the line; clicks on the right half
/// of a wide character land on that character.
pub(super) fn byte_col_for_display_col(line: &str, display_col: usize) -> usize {
    let mut width = 0;
    for (idx, ch) in line.char_indices() {
        let next = width + ch.width().unwrap_or(0);
        if display_col < next {
            return idx;
        }
        width = next;
    }
    line.len()
}
