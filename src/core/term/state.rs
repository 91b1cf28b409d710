//! Screen buffer
//!
//! The grid of styled cells behind an embedded terminal. It only changes
//! through [`ScreenBuffer::apply`], fed with commands from the decoder.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

use super::palette::{Palette, Rgb};
use super::parser::{Response, ScreenCommand};

/// Grid of cells plus cursor, pen and modes
pub struct ScreenBuffer {
    cols: u16,
    rows: u16,
    primary: Grid,
    alternate: Grid,
    using_alternate: bool,
    primary_cursor: CursorState,
    alternate_cursor: CursorState,
    /// Attributes applied to newly written cells
    pub current_attrs: CellAttrs,
    pub modes: TerminalModes,
    pub title: String,
    /// Scroll region (top, bottom) - 0-indexed, inclusive
    scroll_region: (u16, u16),
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            primary: Grid::new(cols, rows),
            alternate: Grid::new(cols, rows),
            using_alternate: false,
            primary_cursor: CursorState::default(),
            alternate_cursor: CursorState::default(),
            current_attrs: CellAttrs::default(),
            modes: TerminalModes::default(),
            title: String::new(),
            scroll_region: (0, rows - 1),
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn is_alternate(&self) -> bool {
        self.using_alternate
    }

    /// Visible rows of the active screen
    pub fn grid(&self) -> &[Row] {
        &self.active_grid().rows
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.grid().get(row as usize)?.cells.get(col as usize)
    }

    /// Cursor as `(row, col)`, clamped onto the grid
    pub fn cursor(&self) -> (u16, u16) {
        let c = self.active_cursor();
        (c.row, c.col.min(self.cols - 1))
    }

    pub fn cursor_visible(&self) -> bool {
        self.active_cursor().visible
    }

    /// Apply one decoded command, returning any reply owed to the program
    pub fn apply(&mut self, cmd: ScreenCommand) -> Option<Response> {
        match cmd {
            ScreenCommand::Print(ch) => self.put_char(ch),
            ScreenCommand::Bell => {}
            ScreenCommand::Backspace => self.backspace(),
            ScreenCommand::Tab => self.horizontal_tab(),
            ScreenCommand::LineFeed => {
                self.linefeed();
                if self.modes.linefeed_newline {
                    self.carriage_return();
                }
            }
            ScreenCommand::CarriageReturn => self.carriage_return(),
            ScreenCommand::CursorUp(n) => self.cursor_up(n),
            ScreenCommand::CursorDown(n) => self.cursor_down(n),
            ScreenCommand::CursorForward(n) => self.cursor_forward(n),
            ScreenCommand::CursorBackward(n) => self.cursor_backward(n),
            ScreenCommand::CursorNextLine(n) => {
                self.cursor_down(n);
                self.carriage_return();
            }
            ScreenCommand::CursorPrevLine(n) => {
                self.cursor_up(n);
                self.carriage_return();
            }
            ScreenCommand::CursorColumn(col) => {
                let max = self.cols - 1;
                self.active_cursor_mut().col = col.saturating_sub(1).min(max);
            }
            ScreenCommand::CursorRow(row) => {
                let max = self.rows - 1;
                self.active_cursor_mut().row = row.saturating_sub(1).min(max);
            }
            ScreenCommand::CursorPosition { row, col } => self.cursor_position(row, col),
            ScreenCommand::EraseInDisplay(mode) => self.erase_in_display(mode),
            ScreenCommand::EraseInLine(mode) => self.erase_in_line(mode),
            ScreenCommand::EraseChars(n) => self.erase_chars(n),
            ScreenCommand::InsertLines(n) => self.insert_lines(n),
            ScreenCommand::DeleteLines(n) => self.delete_lines(n),
            ScreenCommand::InsertChars(n) => self.insert_chars(n),
            ScreenCommand::DeleteChars(n) => self.delete_chars(n),
            ScreenCommand::ScrollUp(n) => self.scroll_up(n),
            ScreenCommand::ScrollDown(n) => self.scroll_down(n),
            ScreenCommand::SetScrollRegion { top, bottom } => {
                self.set_scroll_region(top, bottom.unwrap_or(self.rows));
                self.cursor_position(1, 1);
            }
            ScreenCommand::SaveCursor => self.save_cursor(),
            ScreenCommand::RestoreCursor => self.restore_cursor(),
            ScreenCommand::Index => self.linefeed(),
            ScreenCommand::ReverseIndex => self.reverse_index(),
            ScreenCommand::NextLine => {
                self.carriage_return();
                self.linefeed();
            }
            ScreenCommand::Reset => *self = ScreenBuffer::new(self.cols, self.rows),
            ScreenCommand::SetPrivateMode(mode, enable) => self.set_private_mode(mode, enable),
            ScreenCommand::SetMode(mode, enable) => match mode {
                4 => self.modes.insert_mode = enable,
                20 => self.modes.linefeed_newline = enable,
                _ => {}
            },
            ScreenCommand::ResetStyle => self.current_attrs.reset(),
            ScreenCommand::SetFlags(flags) => self.current_attrs.flags |= flags,
            ScreenCommand::ClearFlags(flags) => self.current_attrs.flags &= !flags,
            ScreenCommand::SetForeground(color) => self.current_attrs.fg = color,
            ScreenCommand::SetBackground(color) => self.current_attrs.bg = color,
            ScreenCommand::SetTitle(title) => self.title = title,
            ScreenCommand::ReportStatus => return Some(Response::OperatingStatus),
            ScreenCommand::ReportCursorPosition => {
                let (row, col) = self.cursor();
                return Some(Response::CursorPosition(row + 1, col + 1));
            }
            ScreenCommand::ReportDeviceAttributes => return Some(Response::DeviceAttributes),
            ScreenCommand::ReportSecondaryDeviceAttributes => {
                return Some(Response::SecondaryDeviceAttributes)
            }
        }
        None
    }

    /// Resize both screens, keeping the top-left corner of the old contents.
    ///
    /// Zero dimensions are clamped to one.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        self.cols = cols;
        self.rows = rows;
        self.primary.resize(cols, rows);
        self.alternate.resize(cols, rows);
        self.scroll_region = (0, rows - 1);

        for cursor in [&mut self.primary_cursor, &mut self.alternate_cursor] {
            cursor.col = cursor.col.min(cols - 1);
            cursor.row = cursor.row.min(rows - 1);
        }
    }

    /// Styled lines for display.
    ///
    /// Adjacent cells with identical attributes merge into one span. Trailing
    /// whitespace is dropped from each line and fully blank lines at the
    /// bottom are omitted. Styles are carried per cell, so nothing is reset
    /// at line boundaries.
    pub fn render(&self, palette: &Palette) -> Vec<StyledLine> {
        let rows = self.grid();
        let keep = rows
            .iter()
            .rposition(|r| !r.is_blank())
            .map(|i| i + 1)
            .unwrap_or(0);

        rows[..keep]
            .iter()
            .map(|row| {
                let mut line = StyledLine::default();
                let cells = &row.cells[..row.content_len()];
                for cell in cells.iter().filter(|c| !c.is_continuation()) {
                    line.push(cell.display_char(), SpanStyle::resolve(&cell.attrs, palette));
                }
                line
            })
            .collect()
    }

    /// Text of the visible grid with the same trimming as [`render`](Self::render)
    pub fn to_plain_text(&self) -> String {
        self.render(&Palette::default())
            .iter()
            .map(StyledLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn active_grid(&self) -> &Grid {
        if self.using_alternate {
            &self.alternate
        } else {
            &self.primary
        }
    }

    fn active_grid_mut(&mut self) -> &mut Grid {
        if self.using_alternate {
            &mut self.alternate
        } else {
            &mut self.primary
        }
    }

    fn active_cursor(&self) -> &CursorState {
        if self.using_alternate {
            &self.alternate_cursor
        } else {
            &self.primary_cursor
        }
    }

    fn active_cursor_mut(&mut self) -> &mut CursorState {
        if self.using_alternate {
            &mut self.alternate_cursor
        } else {
            &mut self.primary_cursor
        }
    }

    fn cursor_cell(&self) -> (usize, usize) {
        let c = self.active_cursor();
        (c.row as usize, c.col as usize)
    }

    /// Put a character at the current cursor position
    fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(0) as u16;

        if width == 0 {
            self.append_to_previous_cell(ch);
            return;
        }

        // The cursor may sit one past the last column after a write there;
        // the wrap happens on the next printable character
        if self.active_cursor().col + width > self.cols {
            if self.modes.auto_wrap {
                let row = self.active_cursor().row as usize;
                self.active_grid_mut().rows[row].wrapped = true;
                self.carriage_return();
                self.linefeed();
            } else {
                self.active_cursor_mut().col = self.cols.saturating_sub(width);
            }
        }

        let (row, col) = self.cursor_cell();
        let cols = self.cols as usize;
        if col + width as usize > cols {
            // A wide char on a one-column screen
            return;
        }

        if self.modes.insert_mode {
            let cells = &mut self.active_grid_mut().rows[row].cells;
            for _ in 0..width {
                cells.pop();
                cells.insert(col, Cell::default());
            }
        }

        self.handle_wide_char_overwrite(row, col);

        let attrs = self.current_attrs;
        let cells = &mut self.active_grid_mut().rows[row].cells;
        cells[col] = Cell {
            grapheme: ch.to_string(),
            width: width as u8,
            attrs,
        };
        if width == 2 {
            cells[col + 1] = Cell::continuation(attrs);
        }

        self.active_cursor_mut().col += width;
    }

    fn append_to_previous_cell(&mut self, ch: char) {
        let (row, col) = self.cursor_cell();
        if col > 0 {
            let cells = &mut self.active_grid_mut().rows[row].cells;
            let mut target = (col - 1).min(cells.len() - 1);
            if cells[target].is_continuation() && target > 0 {
                target -= 1;
            }
            cells[target].grapheme.push(ch);
        }
    }

    fn handle_wide_char_overwrite(&mut self, row: usize, col: usize) {
        let attrs = self.current_attrs;
        let cells = &mut self.active_grid_mut().rows[row].cells;

        // Overwriting the right half of a wide char
        if col > 0 && cells[col].is_continuation() {
            cells[col - 1].clear(attrs);
        }
        // Overwriting the left half
        if cells[col].width == 2 && col + 1 < cells.len() {
            cells[col + 1].clear(attrs);
        }
    }

    fn carriage_return(&mut self) {
        self.active_cursor_mut().col = 0;
    }

    /// Move down one line, scrolling at the bottom of the scroll region
    fn linefeed(&mut self) {
        let row = self.active_cursor().row;
        if row == self.scroll_region.1 {
            self.scroll_up(1);
        } else if row < self.rows - 1 {
            self.active_cursor_mut().row += 1;
        }
    }

    fn reverse_index(&mut self) {
        let row = self.active_cursor().row;
        if row == self.scroll_region.0 {
            self.scroll_down(1);
        } else {
            self.cursor_up(1);
        }
    }

    fn backspace(&mut self) {
        let cols = self.cols;
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.min(cols - 1).saturating_sub(1);
    }

    fn horizontal_tab(&mut self) {
        let cols = self.cols;
        let cursor = self.active_cursor_mut();
        cursor.col = (((cursor.col / 8) + 1) * 8).min(cols - 1);
    }

    fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let cols = self.cols;
        let grid = self.active_grid_mut();
        for _ in 0..n.min(bottom - top + 1) {
            grid.rows.remove(top as usize);
            grid.rows.insert(bottom as usize, Row::new(cols));
        }
    }

    fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let cols = self.cols;
        let grid = self.active_grid_mut();
        for _ in 0..n.min(bottom - top + 1) {
            grid.rows.remove(bottom as usize);
            grid.rows.insert(top as usize, Row::new(cols));
        }
    }

    fn cursor_up(&mut self, n: u16) {
        let cursor = self.active_cursor_mut();
        cursor.row = cursor.row.saturating_sub(n);
    }

    fn cursor_down(&mut self, n: u16) {
        let max = self.rows - 1;
        let cursor = self.active_cursor_mut();
        cursor.row = cursor.row.saturating_add(n).min(max);
    }

    fn cursor_forward(&mut self, n: u16) {
        let max = self.cols - 1;
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.saturating_add(n).min(max);
    }

    fn cursor_backward(&mut self, n: u16) {
        let max = self.cols - 1;
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.min(max).saturating_sub(n);
    }

    /// Set cursor position (1-indexed parameters)
    fn cursor_position(&mut self, row: u16, col: u16) {
        let (rows, cols) = (self.rows, self.cols);
        let cursor = self.active_cursor_mut();
        cursor.row = row.saturating_sub(1).min(rows - 1);
        cursor.col = col.saturating_sub(1).min(cols - 1);
    }

    fn erase_in_display(&mut self, mode: u16) {
        let (row, _) = self.cursor_cell();
        let attrs = self.current_attrs;
        match mode {
            0 => {
                self.erase_in_line(0);
                for r in &mut self.active_grid_mut().rows[row + 1..] {
                    r.clear(attrs);
                }
            }
            1 => {
                for r in &mut self.active_grid_mut().rows[..row] {
                    r.clear(attrs);
                }
                self.erase_in_line(1);
            }
            2 | 3 => {
                for r in &mut self.active_grid_mut().rows {
                    r.clear(attrs);
                }
            }
            _ => {}
        }
    }

    fn erase_in_line(&mut self, mode: u16) {
        let (row, col) = self.cursor_cell();
        let attrs = self.current_attrs;
        let line = &mut self.active_grid_mut().rows[row];
        let last = line.cells.len() - 1;
        let range = match mode {
            0 => col.min(last + 1)..line.cells.len(),
            1 => 0..col.min(last) + 1,
            2 => 0..line.cells.len(),
            _ => return,
        };
        for cell in &mut line.cells[range] {
            cell.clear(attrs);
        }
        if mode != 1 {
            line.wrapped = false;
        }
    }

    fn erase_chars(&mut self, n: u16) {
        let (row, col) = self.cursor_cell();
        let attrs = self.current_attrs;
        let cells = &mut self.active_grid_mut().rows[row].cells;
        let end = (col + n as usize).min(cells.len());
        for cell in cells.iter_mut().take(end).skip(col) {
            cell.clear(attrs);
        }
    }

    fn insert_chars(&mut self, n: u16) {
        let (row, col) = self.cursor_cell();
        let cells = &mut self.active_grid_mut().rows[row].cells;
        if col >= cells.len() {
            return;
        }
        for _ in 0..(n as usize).min(cells.len() - col) {
            cells.pop();
            cells.insert(col, Cell::default());
        }
    }

    fn delete_chars(&mut self, n: u16) {
        let (row, col) = self.cursor_cell();
        let cells = &mut self.active_grid_mut().rows[row].cells;
        if col >= cells.len() {
            return;
        }
        for _ in 0..(n as usize).min(cells.len() - col) {
            cells.remove(col);
            cells.push(Cell::default());
        }
    }

    /// Insert blank lines at the cursor, pushing lines below it down to the
    /// bottom of the scroll region
    fn insert_lines(&mut self, n: u16) {
        let (row, _) = self.cursor_cell();
        let (top, bottom) = (self.scroll_region.0 as usize, self.scroll_region.1 as usize);
        if row < top || row > bottom {
            return;
        }
        let cols = self.cols;
        let grid = self.active_grid_mut();
        for _ in 0..(n as usize).min(bottom - row + 1) {
            grid.rows.remove(bottom);
            grid.rows.insert(row, Row::new(cols));
        }
    }

    fn delete_lines(&mut self, n: u16) {
        let (row, _) = self.cursor_cell();
        let (top, bottom) = (self.scroll_region.0 as usize, self.scroll_region.1 as usize);
        if row < top || row > bottom {
            return;
        }
        let cols = self.cols;
        let grid = self.active_grid_mut();
        for _ in 0..(n as usize).min(bottom - row + 1) {
            grid.rows.remove(row);
            grid.rows.insert(bottom, Row::new(cols));
        }
    }

    /// Set scroll region (1-indexed, inclusive)
    fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let max = self.rows - 1;
        let top = top.saturating_sub(1).min(max);
        let bottom = bottom.saturating_sub(1).min(max);
        if top < bottom {
            self.scroll_region = (top, bottom);
        }
    }

    fn save_cursor(&mut self) {
        let (row, col) = self.cursor_cell();
        let attrs = self.current_attrs;
        self.active_cursor_mut().saved = Some(SavedCursor {
            col: col as u16,
            row: row as u16,
            attrs,
        });
    }

    fn restore_cursor(&mut self) {
        if let Some(saved) = self.active_cursor().saved {
            let (rows, cols) = (self.rows, self.cols);
            let cursor = self.active_cursor_mut();
            cursor.col = saved.col.min(cols - 1);
            cursor.row = saved.row.min(rows - 1);
            self.current_attrs = saved.attrs;
        }
    }

    fn set_private_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.application_cursor = enable,
            7 => self.modes.auto_wrap = enable,
            25 => self.active_cursor_mut().visible = enable,
            47 | 1047 => self.switch_screen(enable),
            1048 => {
                if enable {
                    self.save_cursor();
                } else {
                    self.restore_cursor();
                }
            }
            1049 => {
                if enable {
                    self.save_cursor();
                    self.switch_screen(true);
                    self.alternate_cursor = CursorState::default();
                } else {
                    self.switch_screen(false);
                    self.restore_cursor();
                }
            }
            2004 => self.modes.bracketed_paste = enable,
            _ => {}
        }
    }

    fn switch_screen(&mut self, alternate: bool) {
        if alternate && !self.using_alternate {
            self.alternate = Grid::new(self.cols, self.rows);
        }
        self.using_alternate = alternate;
    }
}

struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    fn new(cols: u16, rows: u16) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.rows.resize_with(rows as usize, || Row::new(cols));
        for row in &mut self.rows {
            row.resize(cols);
        }
    }
}

/// A single row
#[derive(Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// The row continues on the next one because of autowrap
    pub wrapped: bool,
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            wrapped: false,
        }
    }

    fn resize(&mut self, cols: u16) {
        self.cells.resize(cols as usize, Cell::default());
        // Never leave half of a wide char at the right edge
        if let Some(last) = self.cells.last_mut() {
            if last.width == 2 {
                last.clear(last.attrs);
            }
        }
    }

    fn clear(&mut self, attrs: CellAttrs) {
        for cell in &mut self.cells {
            cell.clear(attrs);
        }
        self.wrapped = false;
    }

    /// Row holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// Cells up to and including the last non-whitespace one
    fn content_len(&self) -> usize {
        self.cells
            .iter()
            .rposition(|c| !c.is_blank())
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn text(&self) -> String {
        self.cells
            .iter()
            .filter(|c| !c.is_continuation())
            .map(Cell::display_char)
            .collect()
    }
}

/// A single cell
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub grapheme: String,
    pub width: u8,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attrs: CellAttrs::default(),
        }
    }
}

impl Cell {
    fn clear(&mut self, attrs: CellAttrs) {
        self.grapheme.clear();
        self.width = 1;
        self.attrs = attrs;
    }

    fn continuation(attrs: CellAttrs) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            attrs,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    fn is_blank(&self) -> bool {
        self.grapheme.chars().all(char::is_whitespace)
    }

    /// The display character (space if empty)
    pub fn display_char(&self) -> &str {
        if self.grapheme.is_empty() {
            " "
        } else {
            &self.grapheme
        }
    }
}

/// Cell attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Color reference; resolved through a [`Palette`] when rendering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u16 {
        const BOLD          = 0b0000_0000_0001;
        const DIM           = 0b0000_0000_0010;
        const ITALIC        = 0b0000_0000_0100;
        const UNDERLINE     = 0b0000_0000_1000;
        const BLINK         = 0b0000_0001_0000;
        const INVERSE       = 0b0000_0010_0000;
        const HIDDEN        = 0b0000_0100_0000;
        const STRIKETHROUGH = 0b0000_1000_0000;
    }
}

#[derive(Clone, Copy)]
struct CursorState {
    col: u16,
    row: u16,
    visible: bool,
    saved: Option<SavedCursor>,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            visible: true,
            saved: None,
        }
    }
}

#[derive(Clone, Copy)]
struct SavedCursor {
    col: u16,
    row: u16,
    attrs: CellAttrs,
}

/// Terminal modes
#[derive(Clone, Debug)]
pub struct TerminalModes {
    pub application_cursor: bool,
    pub auto_wrap: bool,
    pub insert_mode: bool,
    pub linefeed_newline: bool,
    pub bracketed_paste: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            application_cursor: false,
            auto_wrap: true,
            insert_mode: false,
            linefeed_newline: false,
            bracketed_paste: false,
        }
    }
}

/// Resolved style of a span
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: AttrFlags,
}

impl SpanStyle {
    fn resolve(attrs: &CellAttrs, palette: &Palette) -> Self {
        let mut fg = palette.fg(attrs.fg);
        let mut bg = palette.bg(attrs.bg);
        if attrs.flags.contains(AttrFlags::INVERSE) {
            std::mem::swap(&mut fg, &mut bg);
        }
        if attrs.flags.contains(AttrFlags::HIDDEN) {
            fg = bg;
        }
        Self {
            fg,
            bg,
            flags: attrs.flags,
        }
    }
}

/// Run of text sharing one style
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    fn push(&mut self, text: &str, style: SpanStyle) {
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(StyledSpan {
                text: text.to_string(),
                style,
            }),
        }
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(screen: &mut ScreenBuffer, text: &str) {
        for ch in text.chars() {
            let cmd = match ch {
                '\n' => ScreenCommand::LineFeed,
                '\r' => ScreenCommand::CarriageReturn,
                c => ScreenCommand::Print(c),
            };
            screen.apply(cmd);
        }
    }

    #[test]
    fn test_print_and_wrap() {
        let mut screen = ScreenBuffer::new(5, 3);
        feed(&mut screen, "abcdefg");
        assert_eq!(screen.to_plain_text(), "abcde\nfg");
        assert!(screen.grid()[0].wrapped);
        assert_eq!(screen.cursor(), (1, 2));
    }

    #[test]
    fn test_pending_wrap_keeps_cursor_on_last_column() {
        let mut screen = ScreenBuffer::new(3, 2);
        feed(&mut screen, "abc");
        assert_eq!(screen.cursor(), (0, 2));
        screen.apply(ScreenCommand::CarriageReturn);
        feed(&mut screen, "x");
        assert_eq!(screen.to_plain_text(), "xbc");
    }

    #[test]
    fn test_linefeed_scrolls_at_bottom() {
        let mut screen = ScreenBuffer::new(4, 2);
        feed(&mut screen, "one\r\ntwo\r\nsix");
        assert_eq!(screen.to_plain_text(), "two\nsix");
    }

    #[test]
    fn test_resize_smaller_keeps_top_left() {
        let mut screen = ScreenBuffer::new(6, 4);
        feed(&mut screen, "abcdef\r\nghijkl\r\nmnopqr\r\nstuvw");
        screen.resize(3, 2);
        assert_eq!(screen.to_plain_text(), "abc\nghi");
        assert_eq!(screen.cursor(), (1, 2));

        screen.resize(0, 0);
        assert_eq!((screen.cols(), screen.rows()), (1, 1));
        assert_eq!(screen.to_plain_text(), "a");
    }

    #[test]
    fn test_resize_larger_pads() {
        let mut screen = ScreenBuffer::new(2, 1);
        feed(&mut screen, "ab");
        screen.resize(4, 3);
        feed(&mut screen, "\r\nc");
        assert_eq!(screen.to_plain_text(), "ab\nc");
    }

    #[test]
    fn test_wide_chars_take_two_cells() {
        let mut screen = ScreenBuffer::new(4, 2);
        feed(&mut screen, "日本x");
        assert_eq!(screen.to_plain_text(), "日本\nx");
        assert!(screen.cell(0, 1).is_some_and(Cell::is_continuation));
    }

    #[test]
    fn test_render_trims_blank_bottom_rows_and_merges_spans() {
        let mut screen = ScreenBuffer::new(10, 5);
        screen.apply(ScreenCommand::SetForeground(Color::Indexed(1)));
        feed(&mut screen, "ab");
        screen.apply(ScreenCommand::ResetStyle);
        feed(&mut screen, "c\r\n");
        screen.apply(ScreenCommand::SetFlags(AttrFlags::BOLD));
        feed(&mut screen, "d");

        let palette = Palette::light();
        let lines = screen.render(&palette);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[0].text, "ab");
        assert_eq!(lines[0].spans[0].style.fg, palette.ansi[1]);
        assert_eq!(lines[0].spans[1].style.fg, palette.foreground);
        assert!(lines[1].spans[0].style.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn test_style_carries_across_rows() {
        let mut screen = ScreenBuffer::new(10, 3);
        screen.apply(ScreenCommand::SetForeground(Color::Rgb(1, 2, 3)));
        feed(&mut screen, "a\r\nb");
        let lines = screen.render(&Palette::light());
        assert_eq!(lines[1].spans[0].style.fg, Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_inverse_swaps_colors() {
        let mut screen = ScreenBuffer::new(4, 1);
        screen.apply(ScreenCommand::SetFlags(AttrFlags::INVERSE));
        feed(&mut screen, "x");
        let palette = Palette::light();
        let style = screen.render(&palette)[0].spans[0].style;
        assert_eq!(style.fg, palette.background);
        assert_eq!(style.bg, palette.foreground);
    }

    #[test]
    fn test_erase_and_cursor_position() {
        let mut screen = ScreenBuffer::new(5, 2);
        feed(&mut screen, "hello\r\nworld");
        screen.apply(ScreenCommand::CursorPosition { row: 1, col: 3 });
        screen.apply(ScreenCommand::EraseInLine(0));
        assert_eq!(screen.to_plain_text(), "he\nworld");
        screen.apply(ScreenCommand::EraseInDisplay(2));
        assert_eq!(screen.to_plain_text(), "");
    }

    #[test]
    fn test_insert_and_delete_chars() {
        let mut screen = ScreenBuffer::new(6, 1);
        feed(&mut screen, "abcdef");
        screen.apply(ScreenCommand::CursorColumn(2));
        screen.apply(ScreenCommand::DeleteChars(2));
        assert_eq!(screen.to_plain_text(), "adef");
        screen.apply(ScreenCommand::InsertChars(1));
        assert_eq!(screen.to_plain_text(), "a def");
    }

    #[test]
    fn test_scroll_region_limits_scrolling() {
        let mut screen = ScreenBuffer::new(3, 4);
        feed(&mut screen, "aaa\r\nbbb\r\nccc\r\nddd");
        screen.apply(ScreenCommand::SetScrollRegion { top: 2, bottom: Some(3) });
        screen.apply(ScreenCommand::ScrollUp(1));
        assert_eq!(screen.to_plain_text(), "aaa\nccc\n\nddd");
    }

    #[test]
    fn test_alternate_screen_restores_primary() {
        let mut screen = ScreenBuffer::new(5, 2);
        feed(&mut screen, "main");
        screen.apply(ScreenCommand::SetPrivateMode(1049, true));
        assert!(screen.is_alternate());
        feed(&mut screen, "alt");
        assert_eq!(screen.to_plain_text(), "alt");
        screen.apply(ScreenCommand::SetPrivateMode(1049, false));
        assert_eq!(screen.to_plain_text(), "main");
        assert_eq!(screen.cursor(), (0, 4));
    }

    #[test]
    fn test_cursor_report() {
        let mut screen = ScreenBuffer::new(10, 5);
        screen.apply(ScreenCommand::CursorPosition { row: 3, col: 7 });
        assert!(matches!(
            screen.apply(ScreenCommand::ReportCursorPosition),
            Some(Response::CursorPosition(3, 7))
        ));
    }
}
