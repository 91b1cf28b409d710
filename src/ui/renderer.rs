//! Screen renderer using crossterm
//!
//! Draws one frame of the IDE: a tab bar and document per editor pane, the
//! embedded terminal below them and a status row at the bottom.
//!
//! ```text
//! ┌ tabs ─────────────┬ tabs ─────────────┐
//! │ document          │ document          │   editor panes
//! ├───────────────────┴───────────────────┤
//! │ ─ Terminal ─                          │   terminal panel
//! │ $ _                                   │
//! ├───────────────────────────────────────┤
//! │ status / prompt                       │   status row
//! ```
//!
//! Every frame is drawn in full inside a synchronized update.

use std::collections::HashMap;
use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use unicode_width::UnicodeWidthChar;

use super::prompt::{Prompt, ResultList};
use crate::app::{Notification, Severity};
use crate::core::term::{AttrFlags, Palette, Rgb, ScreenBuffer, SpanStyle};
use crate::editor::{EditorPane, EditorState, PaneId, Position, SplitOrientation};

/// Begin a render frame (synchronized update, hide cursor, disable autowrap)
fn begin_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?2026h")?;
    write!(out, "\x1b[?7l")?;
    queue!(out, Hide)?;
    Ok(())
}

/// End a render frame (enable autowrap, end synchronized update, flush)
fn end_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?7h")?;
    write!(out, "\x1b[?2026l")?;
    out.flush()
}

/// Run a render operation inside frame guards, ending the frame on error too
fn with_frame<W: Write, F, R>(out: &mut W, f: F) -> io::Result<R>
where
    F: FnOnce(&mut W) -> io::Result<R>,
{
    begin_frame(out)?;
    let result = f(out);
    let _ = end_frame(out);
    result
}

/// A screen region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// Where each part of the frame goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayout {
    /// One rect per pane, in pane order; each starts with its tab bar row
    pub panes: Vec<Rect>,
    /// Title row plus the terminal grid
    pub terminal: Option<Rect>,
    pub status: Rect,
}

impl ScreenLayout {
    /// Split a `width` x `height` screen.
    ///
    /// `terminal_rows` asks for a terminal panel of that many grid rows; the
    /// panel shrinks to leave the editor at least three rows and is dropped
    /// when less than one grid row would remain.
    pub fn compute(width: u16, height: u16, orientation: SplitOrientation, terminal_rows: Option<u16>) -> Self {
        let height = height.max(1);
        let status = Rect::new(0, height - 1, width, 1);
        let available = height - 1;

        let terminal = terminal_rows.and_then(|rows| {
            let panel = rows.saturating_add(1).min(available.saturating_sub(3));
            (panel >= 2).then(|| Rect::new(0, available - panel, width, panel))
        });
        let editor = Rect::new(0, 0, width, available - terminal.map_or(0, |t| t.height));

        let panes = match orientation {
            SplitOrientation::None => vec![editor],
            SplitOrientation::Horizontal => {
                let left = editor.width.saturating_sub(1) / 2;
                let right = editor.width.saturating_sub(left + 1);
                vec![
                    Rect::new(0, 0, left, editor.height),
                    Rect::new(left + 1, 0, right, editor.height),
                ]
            }
            SplitOrientation::Vertical => {
                let top = editor.height / 2;
                vec![
                    Rect::new(0, 0, width, top),
                    Rect::new(0, top, width, editor.height - top),
                ]
            }
        };

        Self { panes, terminal, status }
    }

    /// Rows available to the terminal grid
    pub fn terminal_grid_size(&self) -> Option<(u16, u16)> {
        self.terminal
            .map(|t| (t.height.saturating_sub(1).max(1), t.width.max(1)))
    }
}

/// Which part of the screen receives keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Editor,
    Terminal,
}

/// Everything one frame shows
pub struct View<'a> {
    pub editor: &'a EditorState,
    pub terminal: Option<&'a ScreenBuffer>,
    pub focus: Focus,
    pub notification: Option<&'a Notification>,
    pub prompt: Option<&'a Prompt>,
    pub results: Option<&'a ResultList>,
    pub root: &'a std::path::Path,
    pub show_line_numbers: bool,
}

/// A run of characters drawn with one style
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    text: String,
    style: SpanStyle,
}

/// Screen renderer
pub struct Renderer {
    palette: Palette,
    /// First visible document row per pane
    scroll: HashMap<PaneId, usize>,
    initialized: bool,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            scroll: HashMap::new(),
            initialized: false,
        }
    }

    /// Enter raw mode and the alternate screen
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableBracketedPaste,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.initialized = true;
        Ok(())
    }

    /// Restore the user's terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset), Show);
        let _ = write!(stdout, "\x1b[?7h");
        let _ = execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen);
        let _ = stdout.flush();
        terminal::disable_raw_mode()
    }

    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Draw a full frame of `view` on a `size` = `(cols, rows)` screen
    pub fn draw<W: Write>(&mut self, out: &mut W, view: &View<'_>, size: (u16, u16)) -> io::Result<()> {
        let (width, height) = size;
        let terminal_rows = view.terminal.map(ScreenBuffer::rows);
        let layout = ScreenLayout::compute(width, height, view.editor.split_orientation(), terminal_rows);

        with_frame(out, |out| {
            let mut cursor = None;
            for (pane, rect) in view.editor.panes().iter().zip(&layout.panes) {
                let active = pane.id() == view.editor.active_pane_id();
                if let Some(at) = self.draw_pane(out, pane, *rect, active, view.show_line_numbers)? {
                    if active && view.focus == Focus::Editor {
                        cursor = Some(at);
                    }
                }
            }
            if view.editor.split_orientation() == SplitOrientation::Horizontal {
                if let Some(right) = layout.panes.get(1) {
                    self.draw_divider(out, right.x - 1, right.height)?;
                }
            }
            if let Some(results) = view.results {
                let area = Rect::new(0, 0, width, layout.panes.iter().map(|r| r.y + r.height).max().unwrap_or(0));
                self.draw_results(out, results, area, view.root)?;
                cursor = None;
            }

            if let (Some(screen), Some(rect)) = (view.terminal, layout.terminal) {
                let at = self.draw_terminal(out, screen, rect, view.focus == Focus::Terminal)?;
                if view.focus == Focus::Terminal {
                    cursor = at;
                }
            }

            if let Some(at) = self.draw_status(out, view, layout.status)? {
                cursor = Some(at);
            }

            queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
            if let Some((x, y)) = cursor {
                queue!(out, MoveTo(x, y), Show)?;
            }
            Ok(())
        })
    }

    /// Returns the cursor's screen position when it is visible
    fn draw_pane<W: Write>(
        &mut self,
        out: &mut W,
        pane: &EditorPane,
        rect: Rect,
        active: bool,
        line_numbers: bool,
    ) -> io::Result<Option<(u16, u16)>> {
        if rect.height == 0 || rect.width == 0 {
            return Ok(None);
        }
        self.draw_tab_bar(out, pane, rect, active)?;

        let body = Rect::new(rect.x, rect.y + 1, rect.width, rect.height - 1);
        let normal = self.style(self.palette.foreground, self.palette.background);

        let Some(file) = pane.active() else {
            for row in 0..body.height {
                let text = if row == body.height / 2 { "  Ctrl+O to open a file" } else { "" };
                let dim = self.style(self.palette.ansi[8], self.palette.background);
                write_line(out, body.x, body.y + row, body.width, &[Segment::new(text, dim)], normal)?;
            }
            return Ok(None);
        };

        let buf = &file.buffer;
        let cursor = buf.cursor();
        let top = self.scroll_to(pane.id(), cursor.row, body.height as usize);
        let gutter = if line_numbers {
            buf.line_count().to_string().len().max(3) + 1
        } else {
            0
        };
        let highlights: Vec<(Position, usize)> = pane.multi_cursor.highlights().collect();
        let selection = buf.selection().filter(|s| !s.is_empty()).map(|s| s.ordered());

        for row in 0..body.height {
            let line_idx = top + row as usize;
            let mut segments = Vec::new();
            if let Some(line) = buf.line(line_idx) {
                if line_numbers {
                    let number = format!("{:>w$} ", line_idx + 1, w = gutter - 1);
                    segments.push(Segment::new(&number, self.style(self.palette.ansi[8], self.palette.background)));
                }
                for (col, ch) in line.chars().enumerate() {
                    let pos = Position::new(line_idx, col);
                    let style = if highlights
                        .iter()
                        .any(|(p, len)| p.row == pos.row && (p.col..p.col + len).contains(&col))
                    {
                        self.style(self.palette.highlight_fg, self.palette.highlight_bg)
                    } else if selection.map_or(false, |(start, end)| start <= pos && pos < end) {
                        self.style(self.palette.foreground, self.palette.selection_bg)
                    } else {
                        normal
                    };
                    push_char(&mut segments, ch, style);
                }
            }
            write_line(out, body.x, body.y + row, body.width, &segments, normal)?;
        }

        let prefix = buf.line(cursor.row).unwrap_or_default();
        let x = gutter + display_width(prefix.chars().take(cursor.col));
        let y = cursor.row - top;
        if x < body.width as usize && y < body.height as usize {
            Ok(Some((body.x + x as u16, body.y + y as u16)))
        } else {
            Ok(None)
        }
    }

    fn draw_tab_bar<W: Write>(&self, out: &mut W, pane: &EditorPane, rect: Rect, active: bool) -> io::Result<()> {
        let bar = self.style(self.palette.foreground, self.palette.ansi[7]);
        let current = if active {
            self.style(self.palette.ansi[15], self.palette.ansi[4])
        } else {
            self.style(self.palette.foreground, self.palette.selection_bg)
        };

        let mut segments = Vec::new();
        for file in pane.files() {
            let style = if Some(file.path()) == pane.active_file() { current } else { bar };
            segments.push(Segment::new(&format!(" {} ", file.display_name()), style));
            segments.push(Segment::new("│", bar));
        }
        write_line(out, rect.x, rect.y, rect.width, &segments, bar)
    }

    fn draw_divider<W: Write>(&self, out: &mut W, x: u16, height: u16) -> io::Result<()> {
        let style = self.style(self.palette.ansi[8], self.palette.background);
        apply_style(out, &style)?;
        for y in 0..height {
            queue!(out, MoveTo(x, y), Print('│'))?;
        }
        Ok(())
    }

    fn draw_results<W: Write>(
        &self,
        out: &mut W,
        results: &ResultList,
        area: Rect,
        root: &std::path::Path,
    ) -> io::Result<()> {
        let normal = self.style(self.palette.foreground, self.palette.background);
        let header = self.style(self.palette.ansi[15], self.palette.ansi[4]);
        let selected = self.style(self.palette.foreground, self.palette.selection_bg);

        let title = format!(" Search results: {} ", results.report.status);
        write_line(out, area.x, area.y, area.width, &[Segment::new(&title, header)], header)?;

        let rows = area.height.saturating_sub(1) as usize;
        let first = results.selected().saturating_sub(rows.saturating_sub(1));
        for row in 0..rows {
            let y = area.y + 1 + row as u16;
            let segments = match results.report.matches.get(first + row) {
                Some(m) => {
                    let style = if first + row == results.selected() { selected } else { normal };
                    let text = format!(" {}:{}  {}", m.display_path(root), m.line_number, m.snippet);
                    vec![Segment::new(&text, style)]
                }
                None => Vec::new(),
            };
            write_line(out, area.x, y, area.width, &segments, normal)?;
        }
        Ok(())
    }

    fn draw_terminal<W: Write>(
        &self,
        out: &mut W,
        screen: &ScreenBuffer,
        rect: Rect,
        focused: bool,
    ) -> io::Result<Option<(u16, u16)>> {
        let title_style = if focused {
            self.style(self.palette.ansi[15], self.palette.ansi[4])
        } else {
            self.style(self.palette.foreground, self.palette.ansi[7])
        };
        let title = if screen.title.is_empty() {
            " Terminal ".to_string()
        } else {
            format!(" Terminal: {} ", screen.title)
        };
        write_line(out, rect.x, rect.y, rect.width, &[Segment::new(&title, title_style)], title_style)?;

        let normal = self.style(self.palette.foreground, self.palette.background);
        let lines = screen.render(&self.palette);
        for row in 0..rect.height.saturating_sub(1) {
            let segments: Vec<Segment> = lines
                .get(row as usize)
                .map(|line| {
                    line.spans
                        .iter()
                        .map(|span| Segment {
                            text: span.text.clone(),
                            style: span.style,
                        })
                        .collect()
                })
                .unwrap_or_default();
            write_line(out, rect.x, rect.y + 1 + row, rect.width, &segments, normal)?;
        }

        if !screen.cursor_visible() {
            return Ok(None);
        }
        let (row, col) = screen.cursor();
        if row + 1 < rect.height && col < rect.width {
            Ok(Some((rect.x + col, rect.y + 1 + row)))
        } else {
            Ok(None)
        }
    }

    fn draw_status<W: Write>(&self, out: &mut W, view: &View<'_>, rect: Rect) -> io::Result<Option<(u16, u16)>> {
        let bar = self.style(self.palette.foreground, self.palette.ansi[7]);

        if let Some(prompt) = view.prompt {
            let text = format!("{}{}", prompt.label(), prompt.input());
            write_line(out, rect.x, rect.y, rect.width, &[Segment::new(&text, bar)], bar)?;
            let x = display_width(text.chars().take(prompt.cursor_column()));
            return Ok((x < rect.width as usize).then_some((rect.x + x as u16, rect.y)));
        }

        let mut segments = Vec::new();
        if let Some(note) = view.notification {
            let fg = match note.severity {
                Severity::Information => self.palette.foreground,
                Severity::Warning => self.palette.ansi[3],
                Severity::Error => self.palette.ansi[1],
            };
            segments.push(Segment::new(&format!(" {}", note.message), self.style(fg, self.palette.ansi[7])));
        }

        let pane = view.editor.active_pane();
        if let Some(file) = pane.active() {
            let cursor = file.buffer.cursor();
            let mut info = format!("Ln {}, Col {}", cursor.row + 1, cursor.col + 1);
            if pane.multi_cursor.is_active() {
                info = format!("{} selected | {}", pane.multi_cursor.count(), info);
            }
            if let Some(language) = file.language() {
                info = format!("{} | {}", info, language);
            }
            let used: usize = segments.iter().map(|s| display_width(s.text.chars())).sum();
            let info_width = display_width(info.chars()) + 1;
            let pad = (rect.width as usize).saturating_sub(used + info_width);
            segments.push(Segment::new(&" ".repeat(pad), bar));
            segments.push(Segment::new(&info, bar));
        }
        write_line(out, rect.x, rect.y, rect.width, &segments, bar)?;
        Ok(None)
    }

    /// Keep `cursor_row` inside a `height`-row window and return its top
    fn scroll_to(&mut self, pane: PaneId, cursor_row: usize, height: usize) -> usize {
        let top = self.scroll.entry(pane).or_insert(0);
        if cursor_row < *top {
            *top = cursor_row;
        } else if height > 0 && cursor_row >= *top + height {
            *top = cursor_row + 1 - height;
        }
        *top
    }

    fn style(&self, fg: Rgb, bg: Rgb) -> SpanStyle {
        SpanStyle {
            fg,
            bg,
            flags: AttrFlags::empty(),
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

impl Segment {
    fn new(text: &str, style: SpanStyle) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }
}

fn push_char(segments: &mut Vec<Segment>, ch: char, style: SpanStyle) {
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push(ch),
        _ => segments.push(Segment {
            text: ch.to_string(),
            style,
        }),
    }
}

fn display_width(chars: impl Iterator<Item = char>) -> usize {
    chars.map(|c| c.width().unwrap_or(0)).sum()
}

/// Draw `segments` at `(x, y)` clipped to `width`, padding with `fill`
fn write_line<W: Write>(out: &mut W, x: u16, y: u16, width: u16, segments: &[Segment], fill: SpanStyle) -> io::Result<()> {
    queue!(out, MoveTo(x, y))?;
    let width = width as usize;
    let mut used = 0;

    'outer: for segment in segments {
        let mut text = String::new();
        for ch in segment.text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                if !text.is_empty() {
                    apply_style(out, &segment.style)?;
                    queue!(out, Print(&text))?;
                }
                break 'outer;
            }
            used += w;
            text.push(ch);
        }
        if !text.is_empty() {
            apply_style(out, &segment.style)?;
            queue!(out, Print(&text))?;
        }
    }

    if used < width {
        apply_style(out, &fill)?;
        queue!(out, Print(" ".repeat(width - used)))?;
    }
    Ok(())
}

fn apply_style<W: Write>(out: &mut W, style: &SpanStyle) -> io::Result<()> {
    queue!(
        out,
        SetAttribute(Attribute::Reset),
        SetForegroundColor(style.fg.to_crossterm()),
        SetBackgroundColor(style.bg.to_crossterm())
    )?;
    let flags = style.flags;
    if flags.contains(AttrFlags::BOLD) {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if flags.contains(AttrFlags::DIM) {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if flags.contains(AttrFlags::ITALIC) {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if flags.contains(AttrFlags::UNDERLINE) {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if flags.contains(AttrFlags::BLINK) {
        queue!(out, SetAttribute(Attribute::SlowBlink))?;
    }
    if flags.contains(AttrFlags::STRIKETHROUGH) {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    Ok(())
}
