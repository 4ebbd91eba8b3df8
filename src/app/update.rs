use crate::app::{Model, ToastLevel};
use crate::editor::Direction;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Insert a string at the cursor (paste)
    EditorInsertStr(String),
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    /// Split line at cursor (Enter)
    EditorSplitLine,
    /// Move cursor in a direction
    EditorMoveCursor(Direction),
    /// Move cursor to beginning of line (Home)
    EditorMoveHome,
    /// Move cursor to end of line (End)
    EditorMoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    EditorMoveWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    EditorMoveWordRight,
    /// Move cursor to start of buffer (Ctrl+Home)
    EditorMoveToStart,
    /// Move cursor to end of buffer (Ctrl+End)
    EditorMoveToEnd,
    /// Move cursor to absolute position (line, byte col), e.g. from a mouse click
    EditorMoveTo(usize, usize),
    /// Scroll editor viewport up by n lines
    EditorScrollUp(usize),
    /// Scroll editor viewport down by n lines
    EditorScrollDown(usize),

    // Document
    /// Replace the whole document
    SetText(String),
    /// Restore the document the session started with
    ResetDocument,

    // Export
    /// Download the document as `image.svg`
    Export,
    /// Dismiss the blocking alert
    DismissAlert,

    // Overlays
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

impl Message {
    /// Whether this message changes the document text.
    pub const fn edits_document(&self) -> bool {
        matches!(
            self,
            Self::EditorInsertChar(_)
                | Self::EditorInsertStr(_)
                | Self::EditorDeleteBack
                | Self::EditorDeleteForward
                | Self::EditorSplitLine
                | Self::SetText(_)
                | Self::ResetDocument
        )
    }
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. Every edit is
/// re-validated before this returns, so the model never holds a stale verdict.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Reset confirmation on any action other than the confirmed one.
    // Export preserves it so Ctrl+S can complete a pending quit.
    if !matches!(msg, Message::Quit | Message::Export) {
        model.quit_confirmed = false;
    }
    let follow_cursor = !matches!(
        msg,
        Message::EditorScrollUp(_)
            | Message::EditorScrollDown(_)
            | Message::Export
            | Message::DismissAlert
            | Message::ToggleHelp
            | Message::HideHelp
            | Message::Redraw
            | Message::Quit
    );

    match msg {
        Message::EditorInsertChar(ch) => model.buffer.insert_char(ch),
        Message::EditorInsertStr(text) => model.buffer.insert_str(&text),
        Message::EditorDeleteBack => {
            model.buffer.delete_back();
        }
        Message::EditorDeleteForward => {
            model.buffer.delete_forward();
        }
        Message::EditorSplitLine => model.buffer.split_line(),
        Message::EditorMoveCursor(dir) => model.buffer.move_cursor(dir),
        Message::EditorMoveHome => model.buffer.move_home(),
        Message::EditorMoveEnd => model.buffer.move_end(),
        Message::EditorMoveWordLeft => model.buffer.move_word_left(),
        Message::EditorMoveWordRight => model.buffer.move_word_right(),
        Message::EditorMoveToStart => model.buffer.move_to_start(),
        Message::EditorMoveToEnd => model.buffer.move_to_end(),
        Message::EditorMoveTo(line, col) => model.buffer.move_to(line, col),
        Message::EditorScrollUp(n) => {
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(n);
        }
        Message::EditorScrollDown(n) => {
            let max = model.buffer.line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + n).min(max);
        }

        Message::SetText(text) => model.buffer.set_text(&text),
        Message::ResetDocument => {
            let initial = std::mem::take(&mut model.initial_text);
            model.buffer.set_text(&initial);
            model.initial_text = initial;
            model.buffer.move_to_start();
            model.show_toast(ToastLevel::Info, "Document reset");
        }

        // Writing the file happens in the side-effect pass.
        Message::Export | Message::Redraw => {}
        Message::DismissAlert => model.alert = None,

        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,

        Message::Resize(width, height) => model.terminal_size = (width, height),

        Message::Quit => {
            if model.has_unexported_changes() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Changes not downloaded! Press Ctrl+Q again to quit, or Ctrl+S to download",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }

    model.sync_validation();
    if follow_cursor {
        editor_ensure_cursor_visible(&mut model);
    }
    model
}

/// Ensure the editor cursor line is visible in the viewport.
fn editor_ensure_cursor_visible(model: &mut Model) {
    let cursor_line = model.buffer.cursor().line;
    let visible_height = model.editor_visible_rows();
    if visible_height == 0 {
        model.editor_scroll_offset = cursor_line;
        return;
    }

    if cursor_line < model.editor_scroll_offset {
        model.editor_scroll_offset = cursor_line;
    } else if cursor_line >= model.editor_scroll_offset + visible_height {
        model.editor_scroll_offset = cursor_line + 1 - visible_height;
    }
}
