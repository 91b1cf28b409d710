//! ANSI decoder
//!
//! Turns raw PTY output into [`ScreenCommand`]s. The decoder keeps its state
//! between calls, so escape sequences and UTF-8 characters may be split
//! across arbitrary chunk boundaries.

use tracing::debug;

use super::state::{AttrFlags, Color};

/// A single instruction for the screen buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenCommand {
    Print(char),
    Bell,
    Backspace,
    Tab,
    LineFeed,
    CarriageReturn,
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    CursorNextLine(u16),
    CursorPrevLine(u16),
    /// 1-based column
    CursorColumn(u16),
    /// 1-based row
    CursorRow(u16),
    /// 1-based position
    CursorPosition { row: u16, col: u16 },
    EraseInDisplay(u16),
    EraseInLine(u16),
    EraseChars(u16),
    InsertLines(u16),
    DeleteLines(u16),
    InsertChars(u16),
    DeleteChars(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    /// 1-based, inclusive; `None` bottom means the last row
    SetScrollRegion { top: u16, bottom: Option<u16> },
    SaveCursor,
    RestoreCursor,
    Index,
    ReverseIndex,
    NextLine,
    Reset,
    SetPrivateMode(u16, bool),
    SetMode(u16, bool),
    ResetStyle,
    SetFlags(AttrFlags),
    ClearFlags(AttrFlags),
    SetForeground(Color),
    SetBackground(Color),
    SetTitle(String),
    ReportStatus,
    ReportCursorPosition,
    ReportDeviceAttributes,
    ReportSecondaryDeviceAttributes,
}

/// Response that needs to be sent back to the PTY
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Device status report: terminal OK
    OperatingStatus,
    /// Cursor position report: ESC [ row ; col R
    CursorPosition(u16, u16),
    DeviceAttributes,
    SecondaryDeviceAttributes,
}

impl Response {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::OperatingStatus => b"\x1b[0n".to_vec(),
            Response::CursorPosition(row, col) => format!("\x1b[{};{}R", row, col).into_bytes(),
            // VT220
            Response::DeviceAttributes => b"\x1b[?62;c".to_vec(),
            Response::SecondaryDeviceAttributes => b"\x1b[>1;10;0c".to_vec(),
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Debug)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    /// ESC received within OSC, waiting for backslash
    EscapeInOsc,
}

/// Parameters kept per CSI sequence; later ones are dropped
const MAX_PARAMS: usize = 32;
/// Intermediate bytes kept per sequence
const MAX_INTERMEDIATES: usize = 4;
/// Bytes kept per OSC payload; the rest is dropped until the terminator
const MAX_OSC_LEN: usize = 4096;

/// Incremental escape sequence decoder
pub struct AnsiDecoder {
    state: ParserState,
    /// Parameters with a flag marking colon-separated subparameters
    params: Vec<(u16, bool)>,
    current_param: Option<u16>,
    next_is_sub: bool,
    intermediates: Vec<u8>,
    osc: Vec<u8>,
    utf8: Vec<u8>,
    utf8_len: usize,
}

impl Default for AnsiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiDecoder {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            params: Vec::with_capacity(16),
            current_param: None,
            next_is_sub: false,
            intermediates: Vec::with_capacity(4),
            osc: Vec::new(),
            utf8: Vec::with_capacity(4),
            utf8_len: 0,
        }
    }

    /// Decode a chunk of output
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ScreenCommand> {
        let mut out = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            self.advance(byte, &mut out);
        }
        out
    }

    fn advance(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        if !self.utf8.is_empty() {
            if (0x80..0xC0).contains(&byte) {
                self.push_utf8(byte, out);
                return;
            }
            // Truncated sequence
            self.utf8.clear();
            out.push(ScreenCommand::Print(char::REPLACEMENT_CHARACTER));
        }

        match self.state {
            ParserState::OscString => return self.osc_string(byte, out),
            ParserState::EscapeInOsc => return self.escape_in_osc(byte, out),
            _ => {}
        }

        // C0 controls act immediately, even in the middle of a sequence
        if byte < 0x20 {
            match byte {
                0x1B => self.enter_escape(),
                0x18 | 0x1A => self.state = ParserState::Ground,
                0x07 => out.push(ScreenCommand::Bell),
                0x08 => out.push(ScreenCommand::Backspace),
                0x09 => out.push(ScreenCommand::Tab),
                0x0A..=0x0C => out.push(ScreenCommand::LineFeed),
                0x0D => out.push(ScreenCommand::CarriageReturn),
                _ => {}
            }
            return;
        }

        match self.state {
            ParserState::Ground => self.ground(byte, out),
            ParserState::Escape => self.escape(byte, out),
            ParserState::EscapeIntermediate => self.escape_intermediate(byte),
            ParserState::CsiEntry => self.csi_entry(byte, out),
            ParserState::CsiParam => self.csi_param(byte, out),
            ParserState::CsiIntermediate => self.csi_intermediate(byte, out),
            ParserState::OscString | ParserState::EscapeInOsc => {}
        }
    }

    fn ground(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        match byte {
            0x20..=0x7E => out.push(ScreenCommand::Print(byte as char)),
            0x7F => {}
            0xC2..=0xDF => self.start_utf8(byte, 2),
            0xE0..=0xEF => self.start_utf8(byte, 3),
            0xF0..=0xF4 => self.start_utf8(byte, 4),
            _ => out.push(ScreenCommand::Print(char::REPLACEMENT_CHARACTER)),
        }
    }

    fn start_utf8(&mut self, byte: u8, len: usize) {
        self.utf8.push(byte);
        self.utf8_len = len;
    }

    fn push_utf8(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        self.utf8.push(byte);
        if self.utf8.len() < self.utf8_len {
            return;
        }
        let ch = std::str::from_utf8(&self.utf8)
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.utf8.clear();
        out.push(ScreenCommand::Print(ch));
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.params.clear();
        self.intermediates.clear();
        self.current_param = None;
        self.next_is_sub = false;
    }

    fn escape(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        self.state = ParserState::Ground;
        let cmd = match byte {
            b'[' => {
                self.state = ParserState::CsiEntry;
                return;
            }
            b']' => {
                self.state = ParserState::OscString;
                self.osc.clear();
                return;
            }
            0x20..=0x2F => {
                self.push_intermediate(byte);
                self.state = ParserState::EscapeIntermediate;
                return;
            }
            b'7' => ScreenCommand::SaveCursor,
            b'8' => ScreenCommand::RestoreCursor,
            b'D' => ScreenCommand::Index,
            b'E' => ScreenCommand::NextLine,
            b'M' => ScreenCommand::ReverseIndex,
            b'c' => ScreenCommand::Reset,
            _ => {
                debug!("Unknown ESC: {:?}", byte as char);
                return;
            }
        };
        out.push(cmd);
    }

    fn escape_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2F => self.push_intermediate(byte),
            // Charset designations; nothing to do with them
            _ => self.state = ParserState::Ground,
        }
    }

    fn csi_entry(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        match byte {
            b'?' | b'>' | b'!' | b'=' => self.push_intermediate(byte),
            _ => {
                self.state = ParserState::CsiParam;
                self.csi_param(byte, out);
            }
        }
    }

    fn csi_param(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        match byte {
            b'0'..=b'9' => {
                let digit = (byte - b'0') as u16;
                self.current_param = Some(
                    self.current_param
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit),
                );
            }
            b';' | b':' => {
                let param = self.current_param.take().unwrap_or(0);
                self.push_param(param, self.next_is_sub);
                self.next_is_sub = byte == b':';
            }
            0x20..=0x2F => {
                self.finish_param();
                self.push_intermediate(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => {
                self.finish_param();
                self.execute_csi(byte, out);
            }
            _ => self.state = ParserState::Ground,
        }
    }

    fn csi_intermediate(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        match byte {
            0x20..=0x2F => self.push_intermediate(byte),
            0x40..=0x7E => self.execute_csi(byte, out),
            _ => self.state = ParserState::Ground,
        }
    }

    fn finish_param(&mut self) {
        if let Some(p) = self.current_param.take() {
            self.push_param(p, self.next_is_sub);
        } else if self.next_is_sub {
            self.push_param(0, true);
        }
        self.next_is_sub = false;
    }

    fn push_param(&mut self, value: u16, sub: bool) {
        if self.params.len() < MAX_PARAMS {
            self.params.push((value, sub));
        }
    }

    fn push_intermediate(&mut self, byte: u8) {
        if self.intermediates.len() < MAX_INTERMEDIATES {
            self.intermediates.push(byte);
        }
    }

    fn osc_string(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        match byte {
            0x07 => {
                self.execute_osc(out);
                self.state = ParserState::Ground;
            }
            0x1B => self.state = ParserState::EscapeInOsc,
            0x00..=0x1F => {}
            _ if self.osc.len() >= MAX_OSC_LEN => {}
            _ => self.osc.push(byte),
        }
    }

    fn escape_in_osc(&mut self, byte: u8, out: &mut Vec<ScreenCommand>) {
        self.execute_osc(out);
        if byte == b'\\' {
            self.state = ParserState::Ground;
        } else {
            // Unterminated OSC; the ESC starts a new sequence
            self.enter_escape();
            self.advance(byte, out);
        }
    }

    fn execute_osc(&mut self, out: &mut Vec<ScreenCommand>) {
        let text = String::from_utf8_lossy(&self.osc);
        if let Some((code, title)) = text.split_once(';') {
            if matches!(code, "0" | "1" | "2") {
                out.push(ScreenCommand::SetTitle(title.to_string()));
            }
        }
        self.osc.clear();
    }

    /// Top-level parameter values, ignoring subparameters
    fn main_params(&self) -> Vec<u16> {
        self.params
            .iter()
            .filter(|(_, sub)| !sub)
            .map(|&(p, _)| p)
            .collect()
    }

    fn execute_csi(&mut self, final_byte: u8, out: &mut Vec<ScreenCommand>) {
        self.state = ParserState::Ground;

        let private = self.intermediates.contains(&b'?');
        let secondary = self.intermediates.contains(&b'>');
        let params = self.main_params();
        let first = |default: u16| params.first().copied().filter(|&p| p != 0).unwrap_or(default);
        let count = first(1);

        let cmd = match (private, secondary, final_byte) {
            (false, false, b'A') => ScreenCommand::CursorUp(count),
            (false, false, b'B') | (false, false, b'e') => ScreenCommand::CursorDown(count),
            (false, false, b'C') | (false, false, b'a') => ScreenCommand::CursorForward(count),
            (false, false, b'D') => ScreenCommand::CursorBackward(count),
            (false, false, b'E') => ScreenCommand::CursorNextLine(count),
            (false, false, b'F') => ScreenCommand::CursorPrevLine(count),
            (false, false, b'G') | (false, false, b'`') => ScreenCommand::CursorColumn(count),
            (false, false, b'd') => ScreenCommand::CursorRow(count),
            (false, false, b'H') | (false, false, b'f') => ScreenCommand::CursorPosition {
                row: count,
                col: params.get(1).copied().filter(|&p| p != 0).unwrap_or(1),
            },
            (false, false, b'J') => ScreenCommand::EraseInDisplay(first(0)),
            (false, false, b'K') => ScreenCommand::EraseInLine(first(0)),
            (false, false, b'X') => ScreenCommand::EraseChars(count),
            (false, false, b'L') => ScreenCommand::InsertLines(count),
            (false, false, b'M') => ScreenCommand::DeleteLines(count),
            (false, false, b'@') => ScreenCommand::InsertChars(count),
            (false, false, b'P') => ScreenCommand::DeleteChars(count),
            (false, false, b'S') => ScreenCommand::ScrollUp(count),
            (false, false, b'T') => ScreenCommand::ScrollDown(count),
            (false, false, b'r') => ScreenCommand::SetScrollRegion {
                top: count,
                bottom: params.get(1).copied().filter(|&p| p != 0),
            },
            (false, false, b's') => ScreenCommand::SaveCursor,
            (false, false, b'u') => ScreenCommand::RestoreCursor,
            (false, false, b'm') => {
                self.execute_sgr(out);
                return;
            }
            (false, false, b'n') => match params.first() {
                Some(5) => ScreenCommand::ReportStatus,
                Some(6) => ScreenCommand::ReportCursorPosition,
                _ => return,
            },
            (false, false, b'c') => ScreenCommand::ReportDeviceAttributes,
            (false, true, b'c') => ScreenCommand::ReportSecondaryDeviceAttributes,
            // Window operations (XTWINOPS); the host owns the geometry
            (false, false, b't') => return,
            (_, false, b'h') | (_, false, b'l') => {
                let enable = final_byte == b'h';
                out.extend(params.iter().map(|&p| {
                    if private {
                        ScreenCommand::SetPrivateMode(p, enable)
                    } else {
                        ScreenCommand::SetMode(p, enable)
                    }
                }));
                return;
            }
            // DECSCUSR cursor shape
            (false, false, b'q') if self.intermediates.contains(&b' ') => return,
            _ => {
                debug!(
                    "Unknown CSI: intermediates={:?}, params={:?}, final={:?}",
                    self.intermediates, self.params, final_byte as char
                );
                return;
            }
        };
        out.push(cmd);
    }

    fn execute_sgr(&self, out: &mut Vec<ScreenCommand>) {
        // Group each parameter with the colon subparameters that follow it
        let mut groups: Vec<Vec<u16>> = Vec::new();
        for &(p, sub) in &self.params {
            match groups.last_mut() {
                Some(group) if sub => group.push(p),
                _ => groups.push(vec![p]),
            }
        }
        if groups.is_empty() {
            out.push(ScreenCommand::ResetStyle);
            return;
        }

        let mut iter = groups.iter();
        while let Some(group) = iter.next() {
            let param = group[0];
            let cmd = match param {
                0 => ScreenCommand::ResetStyle,
                1 => ScreenCommand::SetFlags(AttrFlags::BOLD),
                2 => ScreenCommand::SetFlags(AttrFlags::DIM),
                3 => ScreenCommand::SetFlags(AttrFlags::ITALIC),
                4 => ScreenCommand::SetFlags(AttrFlags::UNDERLINE),
                5 | 6 => ScreenCommand::SetFlags(AttrFlags::BLINK),
                7 => ScreenCommand::SetFlags(AttrFlags::INVERSE),
                8 => ScreenCommand::SetFlags(AttrFlags::HIDDEN),
                9 => ScreenCommand::SetFlags(AttrFlags::STRIKETHROUGH),
                21 | 24 => ScreenCommand::ClearFlags(AttrFlags::UNDERLINE),
                22 => ScreenCommand::ClearFlags(AttrFlags::BOLD | AttrFlags::DIM),
                23 => ScreenCommand::ClearFlags(AttrFlags::ITALIC),
                25 => ScreenCommand::ClearFlags(AttrFlags::BLINK),
                27 => ScreenCommand::ClearFlags(AttrFlags::INVERSE),
                28 => ScreenCommand::ClearFlags(AttrFlags::HIDDEN),
                29 => ScreenCommand::ClearFlags(AttrFlags::STRIKETHROUGH),
                30..=37 => ScreenCommand::SetForeground(Color::Indexed((param - 30) as u8)),
                39 => ScreenCommand::SetForeground(Color::Default),
                40..=47 => ScreenCommand::SetBackground(Color::Indexed((param - 40) as u8)),
                49 => ScreenCommand::SetBackground(Color::Default),
                90..=97 => ScreenCommand::SetForeground(Color::Indexed((param - 90 + 8) as u8)),
                100..=107 => ScreenCommand::SetBackground(Color::Indexed((param - 100 + 8) as u8)),
                38 | 48 => {
                    let color = if group.len() > 1 {
                        extended_color_colon(&group[1..])
                    } else {
                        extended_color_semicolon(&mut iter)
                    };
                    match color {
                        Some(c) if param == 38 => ScreenCommand::SetForeground(c),
                        Some(c) => ScreenCommand::SetBackground(c),
                        None => continue,
                    }
                }
                _ => continue,
            };
            out.push(cmd);
        }
    }
}

/// `38:5:n`, `38:2:r:g:b` or `38:2:colorspace:r:g:b`
fn extended_color_colon(sub: &[u16]) -> Option<Color> {
    match sub {
        [5, n, ..] => Some(Color::Indexed(u8::try_from(*n).ok()?)),
        [2, _, r, g, b, ..] | [2, r, g, b] => rgb(*r, *g, *b),
        _ => None,
    }
}

/// `38;5;n` or `38;2;r;g;b`, consuming the following parameters.
/// Components above 255 invalidate the color.
fn extended_color_semicolon<'a>(iter: &mut impl Iterator<Item = &'a Vec<u16>>) -> Option<Color> {
    let mut next = || iter.next().map(|g| g[0]);
    match next()? {
        5 => next().and_then(|n| u8::try_from(n).ok()).map(Color::Indexed),
        2 => {
            let r = next().unwrap_or(0);
            let g = next().unwrap_or(0);
            let b = next().unwrap_or(0);
            rgb(r, g, b)
        }
        _ => None,
    }
}

fn rgb(r: u16, g: u16, b: u16) -> Option<Color> {
    Some(Color::Rgb(u8::try_from(r).ok()?, u8::try_from(g).ok()?, u8::try_from(b).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(cmds: &[ScreenCommand]) -> String {
        cmds.iter()
            .filter_map(|c| match c {
                ScreenCommand::Print(ch) => Some(*ch),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text_and_controls() {
        let mut decoder = AnsiDecoder::new();
        let cmds = decoder.feed(b"hi\r\n\x07");
        assert_eq!(
            cmds,
            vec![
                ScreenCommand::Print('h'),
                ScreenCommand::Print('i'),
                ScreenCommand::CarriageReturn,
                ScreenCommand::LineFeed,
                ScreenCommand::Bell,
            ]
        );
    }

    #[test]
    fn test_cursor_movement() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[5;10H\x1b[H\x1b[3A"),
            vec![
                ScreenCommand::CursorPosition { row: 5, col: 10 },
                ScreenCommand::CursorPosition { row: 1, col: 1 },
                ScreenCommand::CursorUp(3),
            ]
        );
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut decoder = AnsiDecoder::new();
        assert!(decoder.feed(b"\x1b[3").is_empty());
        assert!(decoder.feed(b"1").is_empty());
        assert_eq!(
            decoder.feed(b"mX"),
            vec![
                ScreenCommand::SetForeground(Color::Indexed(1)),
                ScreenCommand::Print('X'),
            ]
        );
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = AnsiDecoder::new();
        let bytes = "é日".as_bytes();
        let mut cmds = decoder.feed(&bytes[..1]);
        cmds.extend(decoder.feed(&bytes[1..3]));
        cmds.extend(decoder.feed(&bytes[3..]));
        assert_eq!(text(&cmds), "é日");
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(text(&decoder.feed(b"a\xffb")), "a\u{fffd}b");
        // Lead byte followed by ASCII
        assert_eq!(text(&decoder.feed(b"\xe6x")), "\u{fffd}x");
    }

    #[test]
    fn test_sgr_extended_colors() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[1;38;2;10;20;30;48;5;200m"),
            vec![
                ScreenCommand::SetFlags(AttrFlags::BOLD),
                ScreenCommand::SetForeground(Color::Rgb(10, 20, 30)),
                ScreenCommand::SetBackground(Color::Indexed(200)),
            ]
        );
        assert_eq!(
            decoder.feed(b"\x1b[38:2::1:2:3;4m\x1b[48:5:7m"),
            vec![
                ScreenCommand::SetForeground(Color::Rgb(1, 2, 3)),
                ScreenCommand::SetFlags(AttrFlags::UNDERLINE),
                ScreenCommand::SetBackground(Color::Indexed(7)),
            ]
        );
        assert_eq!(decoder.feed(b"\x1b[m"), vec![ScreenCommand::ResetStyle]);
    }

    #[test]
    fn test_osc_title() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b]0;build \xe2\x9c\x93\x07"),
            vec![ScreenCommand::SetTitle("build ✓".to_string())]
        );
        assert_eq!(
            decoder.feed(b"\x1b]2;other\x1b\\x"),
            vec![ScreenCommand::SetTitle("other".to_string()), ScreenCommand::Print('x')]
        );
    }

    #[test]
    fn test_private_modes_and_reports() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[?1049;25h\x1b[4l\x1b[6n\x1b[>c"),
            vec![
                ScreenCommand::SetPrivateMode(1049, true),
                ScreenCommand::SetPrivateMode(25, true),
                ScreenCommand::SetMode(4, false),
                ScreenCommand::ReportCursorPosition,
                ScreenCommand::ReportSecondaryDeviceAttributes,
            ]
        );
        assert_eq!(Response::CursorPosition(3, 7).to_bytes(), b"\x1b[3;7R");
    }

    #[test]
    fn test_out_of_range_colors_are_ignored() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[38;2;300;0;0;1m\x1b[48;5;256m\x1b[38:2::1:2:999m"),
            vec![ScreenCommand::SetFlags(AttrFlags::BOLD)]
        );
    }

    #[test]
    fn test_oversized_sequences_are_bounded() {
        let mut decoder = AnsiDecoder::new();
        decoder.feed(b"\x1b]0;");
        let chunk = vec![b'a'; 64 * 1024];
        for _ in 0..16 {
            assert!(decoder.feed(&chunk).is_empty());
        }
        assert_eq!(decoder.osc.len(), MAX_OSC_LEN);
        let cmds = decoder.feed(b"\x07");
        assert!(matches!(&cmds[..], [ScreenCommand::SetTitle(t)] if t.len() == MAX_OSC_LEN - 2));

        let mut csi = b"\x1b[".to_vec();
        for _ in 0..10_000 {
            csi.extend_from_slice(b"1;");
        }
        decoder.feed(&csi);
        assert_eq!(decoder.params.len(), MAX_PARAMS);
        assert_eq!(decoder.feed(b"Ax"), vec![ScreenCommand::CursorUp(1), ScreenCommand::Print('x')]);
    }

    #[test]
    fn test_window_ops_are_ignored() {
        let mut decoder = AnsiDecoder::new();
        assert!(decoder.feed(b"\x1b[8;65535;65535t").is_empty());
        assert_eq!(decoder.feed(b"\x1b[8;0;0tx"), vec![ScreenCommand::Print('x')]);
    }

    #[test]
    fn test_unknown_sequences_are_dropped() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(text(&decoder.feed(b"\x1b[2 q\x1b[5zok\x1b(Bk")), "okk");
    }

    #[test]
    fn test_control_inside_csi_executes() {
        let mut decoder = AnsiDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[2\rC"),
            vec![ScreenCommand::CarriageReturn, ScreenCommand::CursorForward(2)]
        );
    }
}
