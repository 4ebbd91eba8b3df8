use ropey::Rope;

/// Cursor position in the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
}

impl Cursor {
    /// Create a cursor at line 0, column 0.
    pub const fn new() -> Self {
        Self {
            line: 0,
            col: 0,
            col_memory: 0,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The document being edited, backed by a rope.
///
/// Every operation that changes the text bumps [`InputBuffer::revision`];
/// the application re-validates whenever the revision moves.
pub struct InputBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl InputBuffer {
    /// Create a buffer holding `text` with the cursor at the start.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Replace the whole document.
    ///
    /// The cursor keeps its line and column where they still exist.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = self.cursor.col.min(self.line_len(line));
        self.cursor = Cursor::new();
        self.cursor.line = line;
        self.cursor.set_col(self.floor_char_boundary(line, col));
        self.revision += 1;
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Counter bumped by every edit.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        let content = s
            .strip_suffix('\n')
            .map_or(s.as_str(), |s| s.strip_suffix('\r').unwrap_or(s));
        Some(content.to_string())
    }

    /// Length of a line in bytes (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    /// The full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.split_line();
            return;
        }
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, ch);
        // A '\r' typed before a line break becomes part of the terminator.
        let col = self.cursor.col + ch.len_utf8();
        self.cursor
            .set_col(self.floor_char_boundary(self.cursor.line, col));
        self.revision += 1;
    }

    /// Insert a string at the cursor (paste).
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, s);

        let mut pieces = s.split('\n');
        let first = pieces.next().unwrap_or_default();
        match pieces.last() {
            Some(last) => {
                self.cursor.line += s.matches('\n').count();
                self.cursor.set_col(last.len());
            }
            None => self.cursor.set_col(self.cursor.col + first.len()),
        }
        self.cursor
            .set_col(self.floor_char_boundary(self.cursor.line, self.cursor.col));
        self.revision += 1;
    }

    /// Split the current line at the cursor (Enter).
    pub fn split_line(&mut self) {
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, '\n');
        self.cursor.line += 1;
        self.cursor.set_col(0);
        self.revision += 1;
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.clamped_col(&line);
        if col == 0 && self.cursor.line == 0 {
            return false;
        }

        let char_idx = self.cursor_char_idx();
        if col == 0 {
            let prev_line_len = self.line_len(self.cursor.line - 1);
            let terminator_start = if char_idx >= 2 && self.rope.char(char_idx - 2) == '\r' {
                char_idx - 2
            } else {
                char_idx - 1
            };
            self.rope.remove(terminator_start..char_idx);
            self.cursor.line -= 1;
            self.cursor.set_col(prev_line_len);
        } else {
            let prev_char_len = line[..col].chars().next_back().map_or(0, char::len_utf8);
            self.rope.remove(char_idx - 1..char_idx);
            self.cursor.set_col(col - prev_char_len);
        }
        self.revision += 1;
        true
    }

    /// Delete the character at the cursor (Delete).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let char_idx = self.cursor_char_idx();
        let len = self.rope.len_chars();
        if char_idx >= len {
            return false;
        }
        let crlf = self.rope.char(char_idx) == '\r'
            && char_idx + 1 < len
            && self.rope.char(char_idx + 1) == '\n';
        let end = if crlf { char_idx + 2 } else { char_idx + 1 };
        self.rope.remove(char_idx..end);
        self.revision += 1;
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_up(),
            Direction::Down => self.move_down(),
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        let len = self.line_len(self.cursor.line);
        self.cursor.set_col(len);
    }

    /// Move one word left (Ctrl+Left). Tag punctuation counts as a separator.
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.cursor.set_col(self.line_len(self.cursor.line));
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let trimmed = line[..self.clamped_col(&line)].trim_end_matches(|c: char| !is_word_char(c));
        let pos = trimmed
            .rfind(|c: char| !is_word_char(c))
            .map_or(0, |i| i + 1);
        self.cursor.set_col(pos);
    }

    /// Move one word right (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let line_len = self.line_len(self.cursor.line);
        if self.cursor.col >= line_len {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.clamped_col(&line);
        let after = &line[col..];
        let word_end = after.find(|c: char| !is_word_char(c)).unwrap_or(after.len());
        let rest = &after[word_end..];
        let gap_end = rest.find(is_word_char).unwrap_or(rest.len());
        self.cursor.set_col(col + word_end + gap_end);
    }

    /// Move to `line`/`col`, clamped to the document and to a char boundary.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let col = col.min(self.line_len(self.cursor.line));
        self.cursor
            .set_col(self.floor_char_boundary(self.cursor.line, col));
    }

    pub const fn move_to_start(&mut self) {
        self.cursor.line = 0;
        self.cursor.set_col(0);
    }

    pub fn move_to_end(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        self.cursor.line = last_line;
        self.cursor.set_col(self.line_len(last_line));
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        line_start + line[..self.clamped_col(&line)].chars().count()
    }

    fn floor_char_boundary(&self, line: usize, col: usize) -> usize {
        let text = self.line_at(line).unwrap_or_default();
        floor_char_boundary(&text, col)
    }

    /// The cursor column clamped to `line` content and a char boundary.
    fn clamped_col(&self, line: &str) -> usize {
        floor_char_boundary(line, self.cursor.col)
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let col = self.clamped_col(&line);
            let prev_char_len = line[..col].chars().next_back().map_or(0, char::len_utf8);
            self.cursor.set_col(col - prev_char_len);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.set_col(self.line_len(self.cursor.line));
        }
    }

    fn move_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.clamped_col(&line);
        if col < line.len() {
            let next_char_len = line[col..].chars().next().map_or(0, char::len_utf8);
            self.cursor.set_col(col + next_char_len);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_up(&mut self) {
        if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.col = self.vertical_col();
        }
    }

    fn move_down(&mut self) {
        if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.col = self.vertical_col();
        }
    }

    fn vertical_col(&self) -> usize {
        let max_col = self.line_len(self.cursor.line);
        self.floor_char_boundary(self.cursor.line, self.cursor.col_memory.min(max_col))
    }
}

fn floor_char_boundary(text: &str, col: usize) -> usize {
    let mut col = col.min(text.len());
    while !text.is_char_boundary(col) {
        col -= 1;
    }
    col
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl std::fmt::Debug for InputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}
