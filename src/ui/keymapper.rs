//! Key mapping
//!
//! Two tables live here: [`KeyMapper`] turns key events into VT sequences
//! for the embedded shell, and [`EditorKeymap`] turns them into editor
//! [`Action`]s.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{CloseMode, Command};
use crate::core::term::TerminalModes;
use crate::editor::{Direction, Motion, SplitAxis};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to bytes
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to bytes for the PTY
    pub fn map(event: &KeyEvent, modes: &TerminalModes) -> Option<Vec<u8>> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Some(Self::map_char(ch, mods)),

            KeyCode::Enter => {
                if modes.linefeed_newline {
                    Some(vec![0x0D, 0x0A])
                } else {
                    Some(vec![0x0D])
                }
            }

            KeyCode::Backspace => {
                if mods.contains(Modifiers::ALT) {
                    Some(vec![0x1B, 0x7F])
                } else {
                    Some(vec![0x7F])
                }
            }

            KeyCode::Tab => Some(vec![0x09]),
            KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),
            KeyCode::Esc => Some(vec![0x1B]),

            KeyCode::Up => Some(Self::arrow_key(b'A', mods, modes)),
            KeyCode::Down => Some(Self::arrow_key(b'B', mods, modes)),
            KeyCode::Right => Some(Self::arrow_key(b'C', mods, modes)),
            KeyCode::Left => Some(Self::arrow_key(b'D', mods, modes)),

            KeyCode::Home => Some(Self::special_key(b'H', mods)),
            KeyCode::End => Some(Self::special_key(b'F', mods)),
            KeyCode::PageUp => Some(Self::tilde_key(5, mods)),
            KeyCode::PageDown => Some(Self::tilde_key(6, mods)),
            KeyCode::Insert => Some(Self::tilde_key(2, mods)),
            KeyCode::Delete => Some(Self::tilde_key(3, mods)),

            KeyCode::F(n) => Some(Self::function_key(n, mods)).filter(|b| !b.is_empty()),

            _ => None,
        }
    }

    /// Wrap pasted text for the shell, honouring bracketed paste mode
    pub fn paste(text: &str, modes: &TerminalModes) -> Vec<u8> {
        // The shell expects CR for newlines, as if typed
        let body = text.replace("\r\n", "\r").replace('\n', "\r");
        if modes.bracketed_paste {
            let mut bytes = b"\x1b[200~".to_vec();
            bytes.extend_from_slice(body.as_bytes());
            bytes.extend_from_slice(b"\x1b[201~");
            bytes
        } else {
            body.into_bytes()
        }
    }

    fn map_char(ch: char, mods: Modifiers) -> Vec<u8> {
        // Ctrl + letter = control character
        if mods.contains(Modifiers::CTRL) && !mods.contains(Modifiers::ALT) {
            if ch.is_ascii_alphabetic() {
                return vec![(ch.to_ascii_lowercase() as u8) - b'a' + 1];
            }
            match ch {
                '@' | '`' | ' ' | '2' => return vec![0x00],
                '[' | '3' => return vec![0x1B],
                '\\' | '4' => return vec![0x1C],
                ']' | '5' => return vec![0x1D],
                '^' | '~' | '6' => return vec![0x1E],
                '_' | '?' | '7' => return vec![0x1F],
                _ => {}
            }
        }

        if mods.contains(Modifiers::CTRL | Modifiers::ALT) && ch.is_ascii_alphabetic() {
            return vec![0x1B, (ch.to_ascii_lowercase() as u8) - b'a' + 1];
        }

        // Alt + key = ESC + key
        if mods.contains(Modifiers::ALT) {
            let mut bytes = vec![0x1B];
            bytes.extend(ch.to_string().as_bytes());
            return bytes;
        }

        ch.to_string().into_bytes()
    }

    fn arrow_key(key: u8, mods: Modifiers, modes: &TerminalModes) -> Vec<u8> {
        if !mods.is_empty() {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        } else if modes.application_cursor {
            vec![0x1B, b'O', key]
        } else {
            vec![0x1B, b'[', key]
        }
    }

    /// Home and End
    fn special_key(key: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            vec![0x1B, b'[', key]
        } else {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        }
    }

    /// PageUp, PageDown, Insert, Delete
    fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            format!("\x1b[{}~", code).into_bytes()
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods)).into_bytes()
        }
    }

    fn function_key(n: u8, mods: Modifiers) -> Vec<u8> {
        let (code, ss3) = match n {
            1 => (0, Some(b'P')),
            2 => (0, Some(b'Q')),
            3 => (0, Some(b'R')),
            4 => (0, Some(b'S')),
            5 => (15, None),
            6 => (17, None),
            7 => (18, None),
            8 => (19, None),
            9 => (20, None),
            10 => (21, None),
            11 => (23, None),
            12 => (24, None),
            _ => return Vec::new(),
        };

        match (ss3, mods.is_empty()) {
            (Some(key), true) => vec![0x1B, b'O', key],
            (Some(key), false) => format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes(),
            (None, _) => Self::tilde_key(code, mods),
        }
    }

    /// xterm modifier parameter
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + if mods.contains(Modifiers::SHIFT) { 1 } else { 0 }
            + if mods.contains(Modifiers::ALT) { 2 } else { 0 }
            + if mods.contains(Modifiers::CTRL) { 4 } else { 0 }
    }
}

/// Which line prompt to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Find,
    ProjectSearch,
    GotoLine,
    OpenFile,
}

/// What an editor key does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Command),
    /// Run `first`; if the workspace leaves it unhandled, run `fallback`
    Either { first: Command, fallback: Command },
    Prompt(PromptKind),
    /// Repeat the last find
    FindAgain { reverse: bool },
    FocusTerminal,
    FocusEditor,
    ToggleTerminal,
    Quit,
}

/// Key bindings while the editor has focus
pub struct EditorKeymap;

impl EditorKeymap {
    pub fn map(event: &KeyEvent) -> Option<Action> {
        let mods = Modifiers::from(event.modifiers);
        let run = |command| Some(Action::Run(command));

        if mods == Modifiers::CTRL | Modifiers::SHIFT {
            let direction = match event.code {
                KeyCode::Left => Direction::Left,
                KeyCode::Right => Direction::Right,
                KeyCode::Up => Direction::Up,
                KeyCode::Down => Direction::Down,
                _ => return None,
            };
            return run(Command::MoveFile(direction));
        }

        if mods == Modifiers::CTRL {
            return match event.code {
                KeyCode::Char(ch) => Self::map_ctrl(ch.to_ascii_lowercase()),
                KeyCode::PageDown => run(Command::NextTab),
                KeyCode::PageUp => run(Command::PrevTab),
                _ => None,
            };
        }

        if mods == Modifiers::ALT {
            return match event.code {
                KeyCode::Char(ch @ '1'..='9') => run(Command::GotoTab(ch as usize - '0' as usize)),
                KeyCode::Char('0') => run(Command::GotoLastTab),
                KeyCode::Char('\\') => run(Command::Split(SplitAxis::Horizontal)),
                KeyCode::Char('-') => run(Command::Split(SplitAxis::Vertical)),
                KeyCode::Char('x') => run(Command::CloseSplit { mode: CloseMode::Ask }),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(ch) if !mods.contains(Modifiers::CTRL) => run(Command::InsertText(ch.to_string())),
            KeyCode::Enter => Some(Action::Either {
                first: Command::ApplyMultiSelect,
                fallback: Command::InsertText("\n".to_string()),
            }),
            KeyCode::Esc => run(Command::CancelMultiSelect),
            KeyCode::Tab => run(Command::Indent),
            KeyCode::Backspace => run(Command::Backspace),
            KeyCode::Delete => run(Command::DeleteForward),
            KeyCode::Left => run(Command::MoveCursor(Motion::Left)),
            KeyCode::Right => run(Command::MoveCursor(Motion::Right)),
            KeyCode::Up => run(Command::MoveCursor(Motion::Up)),
            KeyCode::Down => run(Command::MoveCursor(Motion::Down)),
            KeyCode::Home => run(Command::MoveCursor(Motion::LineStart)),
            KeyCode::End => run(Command::MoveCursor(Motion::LineEnd)),
            KeyCode::F(3) => Some(Action::FindAgain {
                reverse: mods.contains(Modifiers::SHIFT),
            }),
            KeyCode::F(6) => run(Command::CyclePane),
            _ => None,
        }
    }

    fn map_ctrl(ch: char) -> Option<Action> {
        let action = match ch {
            's' => Action::Run(Command::SaveFile),
            'q' => Action::Quit,
            't' => Action::FocusTerminal,
            'e' => Action::FocusEditor,
            'b' => Action::ToggleTerminal,
            'w' => Action::Run(Command::CloseTab { mode: CloseMode::Ask }),
            'f' => Action::Prompt(PromptKind::Find),
            'g' => Action::Prompt(PromptKind::ProjectSearch),
            'l' => Action::Prompt(PromptKind::GotoLine),
            'o' => Action::Prompt(PromptKind::OpenFile),
            // Ctrl+I is indistinguishable from Tab on most terminals
            'i' | 'n' => Action::Run(Command::SelectNextMatch),
            'd' => Action::Run(Command::DeleteLine),
            _ => return None,
        };
        Some(action)
    }
}

/// Bindings the host intercepts while the terminal panel has focus;
/// everything else goes to the shell
pub fn terminal_escape(event: &KeyEvent) -> Option<Action> {
    if Modifiers::from(event.modifiers) != Modifiers::CTRL {
        return None;
    }
    match event.code {
        KeyCode::Char('e') | KeyCode::Char('E') => Some(Action::FocusEditor),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        _ => None,
    }
}
