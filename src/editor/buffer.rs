//! Line-based text buffer with a cursor and an optional selection.
//!
//! Positions are `(row, col)` pairs where `col` counts chars, not bytes.
//! The document is also addressable as one contiguous char sequence in
//! which each line break counts as a single char.

/// A location in the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A selection from `anchor` to `head`; `head` is where the cursor sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    /// Start and end in document order
    pub fn ordered(&self) -> (Position, Position) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Cursor motions driven by the host's arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

/// Word characters for word-under-cursor selection
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `col`-th char, or the end of the string
fn byte_index(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map(|(i, _)| i).unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: Position,
    selection: Option<Selection>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl TextBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(String::from).collect(),
            cursor: Position::default(),
            selection: None,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the whole document, keeping the cursor as close as possible
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(String::from).collect();
        self.cursor = self.clamp(self.cursor);
        self.selection = None;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map(|l| char_len(l)).unwrap_or(0)
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Move the cursor, dropping any selection
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
        self.selection = None;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Select from `anchor` to `head` and place the cursor at `head`
    pub fn select(&mut self, anchor: Position, head: Position) {
        let anchor = self.clamp(anchor);
        let head = self.clamp(head);
        self.selection = Some(Selection { anchor, head });
        self.cursor = head;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Nearest valid position
    pub fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.lines.len().saturating_sub(1));
        let col = pos.col.min(self.line_len(row));
        Position { row, col }
    }

    /// Text covered by a non-empty selection
    pub fn selected_text(&self) -> Option<String> {
        let sel = self.selection?;
        if sel.is_empty() {
            return None;
        }
        let (start, end) = sel.ordered();
        Some(self.text_range(start, end))
    }

    /// Text between two positions, in either order
    pub fn text_range(&self, a: Position, b: Position) -> String {
        let (start, end) = self.ordered_clamped(a, b);
        if start.row == end.row {
            let line = &self.lines[start.row];
            return line[byte_index(line, start.col)..byte_index(line, end.col)].to_string();
        }

        let mut out = String::new();
        let first = &self.lines[start.row];
        out.push_str(&first[byte_index(first, start.col)..]);
        for line in &self.lines[start.row + 1..end.row] {
            out.push('\n');
            out.push_str(line);
        }
        let last = &self.lines[end.row];
        out.push('\n');
        out.push_str(&last[..byte_index(last, end.col)]);
        out
    }

    /// Char offset of a position in the contiguous document
    pub fn offset_of(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.lines[..pos.row]
            .iter()
            .map(|l| char_len(l) + 1)
            .sum::<usize>()
            + pos.col
    }

    /// Position of a char offset; offsets past the end map to the end
    pub fn position_at(&self, mut offset: usize) -> Position {
        for (row, line) in self.lines.iter().enumerate() {
            let len = char_len(line);
            if offset <= len {
                return Position::new(row, offset);
            }
            offset -= len + 1;
        }
        self.end()
    }

    /// Position just past the last char
    pub fn end(&self) -> Position {
        let row = self.lines.len().saturating_sub(1);
        Position::new(row, self.line_len(row))
    }

    /// Insert `text` at `pos`, returning the position just past it
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp(pos);
        let split_at = byte_index(&self.lines[pos.row], pos.col);
        let tail = self.lines[pos.row].split_off(split_at);

        let mut pieces = text.split('\n');
        let first = pieces.next().unwrap_or("");
        self.lines[pos.row].push_str(first);

        let mut row = pos.row;
        let mut col = pos.col + char_len(first);
        for piece in pieces {
            row += 1;
            self.lines.insert(row, piece.to_string());
            col = char_len(piece);
        }
        self.lines[row].push_str(&tail);
        Position::new(row, col)
    }

    /// Remove the text between two positions and return it
    pub fn delete(&mut self, a: Position, b: Position) -> String {
        let (start, end) = self.ordered_clamped(a, b);
        if start == end {
            return String::new();
        }
        let removed = self.text_range(start, end);

        let end_line = &self.lines[end.row];
        let tail = end_line[byte_index(end_line, end.col)..].to_string();
        let start_byte = byte_index(&self.lines[start.row], start.col);
        self.lines[start.row].truncate(start_byte);
        self.lines[start.row].push_str(&tail);
        self.lines.drain(start.row + 1..=end.row);

        self.cursor = self.clamp(self.cursor);
        removed
    }

    /// Type `text` at the cursor, replacing the selection if there is one
    pub fn insert_at_cursor(&mut self, text: &str) {
        if let Some(sel) = self.selection.take() {
            let (start, end) = sel.ordered();
            self.delete(start, end);
            self.cursor = start;
        }
        self.cursor = self.insert(self.cursor, text);
    }

    /// Delete the selection, or the char before the cursor
    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        let cur = self.cursor;
        if cur.col > 0 {
            self.delete(Position::new(cur.row, cur.col - 1), cur);
            self.cursor = Position::new(cur.row, cur.col - 1);
        } else if cur.row > 0 {
            let prev = Position::new(cur.row - 1, self.line_len(cur.row - 1));
            self.delete(prev, cur);
            self.cursor = prev;
        }
    }

    /// Delete the selection, or the char after the cursor
    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let cur = self.cursor;
        let next = if cur.col < self.line_len(cur.row) {
            Position::new(cur.row, cur.col + 1)
        } else if cur.row + 1 < self.lines.len() {
            Position::new(cur.row + 1, 0)
        } else {
            return;
        };
        self.delete(cur, next);
        self.cursor = cur;
    }

    fn delete_selection(&mut self) -> bool {
        match self.selection.take() {
            Some(sel) if !sel.is_empty() => {
                let (start, end) = sel.ordered();
                self.delete(start, end);
                self.cursor = start;
                true
            }
            _ => false,
        }
    }

    pub fn move_cursor(&mut self, motion: Motion) {
        let cur = self.cursor;
        let next = match motion {
            Motion::Left if cur.col > 0 => Position::new(cur.row, cur.col - 1),
            Motion::Left if cur.row > 0 => Position::new(cur.row - 1, self.line_len(cur.row - 1)),
            Motion::Right if cur.col < self.line_len(cur.row) => Position::new(cur.row, cur.col + 1),
            Motion::Right if cur.row + 1 < self.lines.len() => Position::new(cur.row + 1, 0),
            Motion::Up => Position::new(cur.row.saturating_sub(1), cur.col),
            Motion::Down => Position::new(cur.row + 1, cur.col),
            Motion::LineStart => Position::new(cur.row, 0),
            Motion::LineEnd => Position::new(cur.row, self.line_len(cur.row)),
            _ => cur,
        };
        self.set_cursor(next);
    }

    /// Span of the word touching `pos`, if any
    pub fn word_range_at(&self, pos: Position) -> Option<(Position, Position)> {
        let pos = self.clamp(pos);
        let chars: Vec<char> = self.lines[pos.row].chars().collect();

        // A cursor just past the end of a word still selects it
        let anchor = if chars.get(pos.col).copied().is_some_and(is_word_char) {
            pos.col
        } else if pos.col > 0 && is_word_char(chars[pos.col - 1]) {
            pos.col - 1
        } else {
            return None;
        };

        let mut start = anchor;
        while start > 0 && is_word_char(chars[start - 1]) {
            start -= 1;
        }
        let mut end = anchor + 1;
        while end < chars.len() && is_word_char(chars[end]) {
            end += 1;
        }
        Some((Position::new(pos.row, start), Position::new(pos.row, end)))
    }

    /// Select the word under the cursor and return it
    pub fn select_word_at_cursor(&mut self) -> Option<String> {
        let (start, end) = self.word_range_at(self.cursor)?;
        self.select(start, end);
        Some(self.text_range(start, end))
    }

    /// Remove the cursor's line, including one adjacent line break
    pub fn delete_line(&mut self) {
        let row = self.cursor.row;
        let last = self.lines.len() - 1;
        let (start, end) = if row < last {
            (Position::new(row, 0), Position::new(row + 1, 0))
        } else if row > 0 {
            (
                Position::new(row - 1, self.line_len(row - 1)),
                Position::new(row, self.line_len(row)),
            )
        } else {
            (Position::new(0, 0), Position::new(0, self.line_len(0)))
        };
        self.delete(start, end);
        self.set_cursor(Position::new(row, self.cursor.col));
    }

    /// Jump to a 1-based line number, clamped to the document
    pub fn goto_line(&mut self, line: usize) {
        let row = line.saturating_sub(1).min(self.lines.len() - 1);
        self.set_cursor(Position::new(row, 0));
    }

    /// First occurrence of `needle` starting at or after char offset `from`
    pub fn find_forward(&self, needle: &str, from: usize) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let text = self.text();
        let start = byte_index(&text, from);
        let found = text[start..].find(needle)?;
        Some(from + char_len(&text[start..start + found]))
    }

    /// Last occurrence of `needle` that ends at or before char offset `before`
    pub fn find_backward(&self, needle: &str, before: usize) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let text = self.text();
        let end = byte_index(&text, before);
        let found = text[..end].rfind(needle)?;
        Some(char_len(&text[..found]))
    }

    /// Non-overlapping occurrences of `needle` within the first `upto` chars
    pub fn count_occurrences(&self, needle: &str, upto: Option<usize>) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let text = self.text();
        let end = upto.map(|n| byte_index(&text, n)).unwrap_or(text.len());
        text[..end].matches(needle).count()
    }

    fn ordered_clamped(&self, a: Position, b: Position) -> (Position, Position) {
        let a = self.clamp(a);
        let b = self.clamp(b);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_roundtrip_keeps_trailing_newline() {
        let buf = TextBuffer::from_text("a\nb\n");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.text(), "a\nb\n");
    }

    #[test]
    fn test_insert_multiline() {
        let mut buf = TextBuffer::from_text("hello world");
        let end = buf.insert(Position::new(0, 5), ",\nbig");
        assert_eq!(buf.text(), "hello,\nbig world");
        assert_eq!(end, Position::new(1, 3));
    }

    #[test]
    fn test_delete_across_lines() {
        let mut buf = TextBuffer::from_text("one\ntwo\nthree");
        let removed = buf.delete(Position::new(0, 2), Position::new(2, 1));
        assert_eq!(removed, "e\ntwo\nt");
        assert_eq!(buf.text(), "onhree");
    }

    #[test]
    fn test_offsets_with_multibyte_chars() {
        let buf = TextBuffer::from_text("héllo\nwörld");
        let pos = Position::new(1, 2);
        assert_eq!(buf.offset_of(pos), 8);
        assert_eq!(buf.position_at(8), pos);
        assert_eq!(buf.position_at(1000), Position::new(1, 5));
    }

    #[test]
    fn test_select_word_at_cursor() {
        let mut buf = TextBuffer::from_text("let foo_bar = 1;");
        buf.set_cursor(Position::new(0, 6));
        assert_eq!(buf.select_word_at_cursor().as_deref(), Some("foo_bar"));
        assert_eq!(buf.cursor(), Position::new(0, 11));

        // Cursor right after a word
        buf.set_cursor(Position::new(0, 3));
        assert_eq!(buf.select_word_at_cursor().as_deref(), Some("let"));

        buf.set_cursor(Position::new(0, 12));
        assert_eq!(buf.select_word_at_cursor(), None);
    }

    #[test]
    fn test_insert_at_cursor_replaces_selection() {
        let mut buf = TextBuffer::from_text("foo bar");
        buf.select(Position::new(0, 4), Position::new(0, 7));
        buf.insert_at_cursor("baz");
        assert_eq!(buf.text(), "foo baz");
        assert_eq!(buf.cursor(), Position::new(0, 7));
        assert!(buf.selection().is_none());
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = TextBuffer::from_text("ab\ncd");
        buf.set_cursor(Position::new(1, 0));
        buf.backspace();
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_delete_line_variants() {
        let mut buf = TextBuffer::from_text("a\nb\nc");
        buf.set_cursor(Position::new(1, 0));
        buf.delete_line();
        assert_eq!(buf.text(), "a\nc");

        buf.set_cursor(Position::new(1, 1));
        buf.delete_line();
        assert_eq!(buf.text(), "a");
        assert_eq!(buf.cursor(), Position::new(0, 1));

        buf.delete_line();
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_goto_line_clamps() {
        let mut buf = TextBuffer::from_text("a\nb\nc");
        buf.goto_line(2);
        assert_eq!(buf.cursor(), Position::new(1, 0));
        buf.goto_line(99);
        assert_eq!(buf.cursor(), Position::new(2, 0));
        buf.goto_line(0);
        assert_eq!(buf.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_find_forward_and_backward() {
        let buf = TextBuffer::from_text("foo\nbar foo\nfoo");
        assert_eq!(buf.find_forward("foo", 0), Some(0));
        assert_eq!(buf.find_forward("foo", 1), Some(8));
        assert_eq!(buf.find_forward("foo", 9), Some(12));
        assert_eq!(buf.find_forward("foo", 13), None);
        assert_eq!(buf.find_backward("foo", 11), Some(8));
        assert_eq!(buf.find_backward("foo", 10), Some(0));
        assert_eq!(buf.count_occurrences("foo", None), 3);
        assert_eq!(buf.count_occurrences("foo", Some(11)), 2);
    }
}
