//! Single-line prompt shown in the status row (find, search, goto, open),
//! and the list of project search results picked from after a search.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::keymapper::PromptKind;
use crate::search::{SearchMatch, SearchReport};

/// Result of feeding a key to a [`Prompt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Edited,
    Submit(String),
    Cancel,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    input: String,
    /// Cursor in chars
    cursor: usize,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
            cursor: 0,
        }
    }

    /// Start with `text` already typed
    pub fn with_text(kind: PromptKind, text: &str) -> Self {
        Self {
            kind,
            input: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::Find => "Find: ",
            PromptKind::ProjectSearch => "Search project: ",
            PromptKind::GotoLine => "Go to line: ",
            PromptKind::OpenFile => "Open: ",
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor column within the rendered prompt, label included
    pub fn cursor_column(&self) -> usize {
        self.label().chars().count() + self.cursor
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> PromptEvent {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') | KeyCode::Char('g') => PromptEvent::Cancel,
                KeyCode::Char('u') => {
                    self.input.clear();
                    self.cursor = 0;
                    PromptEvent::Edited
                }
                _ => PromptEvent::Ignored,
            };
        }

        match event.code {
            KeyCode::Enter => PromptEvent::Submit(self.input.clone()),
            KeyCode::Esc => PromptEvent::Cancel,
            KeyCode::Char(ch) => {
                if self.kind == PromptKind::GotoLine && !ch.is_ascii_digit() {
                    return PromptEvent::Ignored;
                }
                let at = self.byte_at(self.cursor);
                self.input.insert(at, ch);
                self.cursor += 1;
                PromptEvent::Edited
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_at(self.cursor);
                self.input.remove(at);
                PromptEvent::Edited
            }
            KeyCode::Delete if self.cursor < self.input.chars().count() => {
                let at = self.byte_at(self.cursor);
                self.input.remove(at);
                PromptEvent::Edited
            }
            KeyCode::Left if self.cursor > 0 => {
                self.cursor -= 1;
                PromptEvent::Edited
            }
            KeyCode::Right if self.cursor < self.input.chars().count() => {
                self.cursor += 1;
                PromptEvent::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                PromptEvent::Edited
            }
            KeyCode::End => {
                self.cursor = self.input.chars().count();
                PromptEvent::Edited
            }
            _ => PromptEvent::Ignored,
        }
    }

    fn byte_at(&self, col: usize) -> usize {
        self.input
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

/// Project search results with one highlighted entry
#[derive(Debug, Clone)]
pub struct ResultList {
    pub report: SearchReport,
    selected: usize,
}

impl ResultList {
    pub fn new(report: SearchReport) -> Self {
        Self { report, selected: 0 }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_match(&self) -> Option<&SearchMatch> {
        self.report.matches.get(self.selected)
    }

    /// Up/Down move, Enter yields the chosen `(path, line)`, Esc closes
    pub fn handle_key(&mut self, event: &KeyEvent) -> ListEvent {
        match event.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ListEvent::Moved
            }
            KeyCode::Down => {
                if self.selected + 1 < self.report.matches.len() {
                    self.selected += 1;
                }
                ListEvent::Moved
            }
            KeyCode::Enter => match self.selected_match() {
                Some(m) => ListEvent::Open(m.path.clone(), m.line_number),
                None => ListEvent::Close,
            },
            KeyCode::Esc => ListEvent::Close,
            _ => ListEvent::Ignored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Moved,
    Open(PathBuf, usize),
    Close,
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(prompt: &mut Prompt, text: &str) {
        for ch in text.chars() {
            prompt.handle_key(&key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn test_typing_and_submit() {
        let mut prompt = Prompt::new(PromptKind::Find);
        type_text(&mut prompt, "fób");
        prompt.handle_key(&key(KeyCode::Left));
        prompt.handle_key(&key(KeyCode::Backspace));
        assert_eq!(prompt.input(), "fb");
        assert_eq!(prompt.cursor_column(), "Find: ".len() + 1);
        assert_eq!(prompt.handle_key(&key(KeyCode::Enter)), PromptEvent::Submit("fb".to_string()));
    }

    #[test]
    fn test_goto_line_accepts_digits_only() {
        let mut prompt = Prompt::new(PromptKind::GotoLine);
        type_text(&mut prompt, "1a2");
        assert_eq!(prompt.input(), "12");
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut prompt = Prompt::with_text(PromptKind::OpenFile, "src/main.rs");
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(prompt.handle_key(&ctrl_u), PromptEvent::Edited);
        assert_eq!(prompt.input(), "");
        assert_eq!(prompt.handle_key(&key(KeyCode::Backspace)), PromptEvent::Ignored);
        assert_eq!(prompt.handle_key(&key(KeyCode::Esc)), PromptEvent::Cancel);
    }

    #[test]
    fn test_result_list_navigation() {
        let report = SearchReport::from(Ok(crate::search::parse_search_output("/p/a.rs:3:x\n/p/b.rs:9:y", 50)));
        let mut list = ResultList::new(report);
        list.handle_key(&key(KeyCode::Up));
        assert_eq!(list.selected(), 0);
        list.handle_key(&key(KeyCode::Down));
        list.handle_key(&key(KeyCode::Down));
        assert_eq!(list.selected(), 1);
        assert_eq!(
            list.handle_key(&key(KeyCode::Enter)),
            ListEvent::Open(PathBuf::from("/p/b.rs"), 9)
        );

        let mut empty = ResultList::new(SearchReport::from(Ok(Vec::new())));
        assert_eq!(empty.handle_key(&key(KeyCode::Enter)), ListEvent::Close);
    }
}
