//! Multi-cursor editing.
//!
//! The engine marks occurrences of a token one at a time. The user then
//! edits one occurrence (the *original selection*), and applying the
//! multi-select copies that edit onto every other marked occurrence.
//!
//! ```text
//! inactive --select_next--> active --apply--> inactive
//!                             |   \--cancel--> inactive
//!                             \--select_next (new token)--> active (reset)
//! ```
//!
//! Highlights are owned here; renderers read them through
//! [`MultiCursorEngine::highlights`].

use tracing::debug;

use super::buffer::{Position, TextBuffer};

/// Live multi-select state. `highlighted_positions` keeps insertion order
/// and is empty whenever `active` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSelectState {
    pub target_text: String,
    pub highlighted_positions: Vec<Position>,
    pub active: bool,
    pub original_selection: Position,
}

impl MultiSelectState {
    pub fn count(&self) -> usize {
        self.highlighted_positions.len()
    }
}

/// Input vocabulary for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiCursorEvent {
    SelectNext,
    Apply,
    Cancel,
}

/// Result of handling a [`MultiCursorEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Another occurrence was highlighted; carries the new total
    Added(usize),
    /// The next occurrence is already highlighted; carries the total
    AllSelected(usize),
    /// The target no longer occurs in the document
    NoMoreMatches,
    /// Nothing selected and no word under the cursor
    NoWord,
    /// The edit was copied; carries the number of occurrences now holding
    /// the replacement, including the one the user edited
    Applied(usize),
    /// Highlights were discarded without touching the document
    Cancelled,
    /// No multi-select in progress; the host should handle the key itself
    Inactive,
}

#[derive(Debug, Default)]
pub struct MultiCursorEngine {
    state: MultiSelectState,
}

impl MultiCursorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MultiSelectState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn count(&self) -> usize {
        self.state.count()
    }

    /// Highlighted spans as `(start, char_len)`, in insertion order
    pub fn highlights(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        let len = self.state.target_text.chars().count();
        self.state.highlighted_positions.iter().map(move |p| (*p, len))
    }

    /// Positions the next apply would rewrite, in the order it would visit them
    pub fn rewrite_order(&self) -> Vec<Position> {
        let mut order: Vec<Position> = self
            .state
            .highlighted_positions
            .iter()
            .copied()
            .filter(|p| *p != self.state.original_selection)
            .collect();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order
    }

    pub fn handle(&mut self, event: MultiCursorEvent, buf: &mut TextBuffer) -> Transition {
        match event {
            MultiCursorEvent::SelectNext => self.select_next_match(buf),
            MultiCursorEvent::Apply => self.apply(buf),
            MultiCursorEvent::Cancel => self.cancel(),
        }
    }

    /// Highlight the next occurrence of the selected text.
    ///
    /// With no selection the word under the cursor is selected first. A
    /// selection that differs from the current target starts over.
    pub fn select_next_match(&mut self, buf: &mut TextBuffer) -> Transition {
        let selected = match buf.selected_text() {
            Some(text) => text,
            None => match buf.select_word_at_cursor() {
                Some(word) => word,
                None => return Transition::NoWord,
            },
        };
        let sel_start = buf
            .selection()
            .map(|s| s.ordered().0)
            .unwrap_or_else(|| buf.cursor());

        if !self.state.active || self.state.target_text != selected {
            self.state = MultiSelectState {
                target_text: selected,
                highlighted_positions: vec![sel_start],
                active: true,
                original_selection: sel_start,
            };
        }

        let target = self.state.target_text.as_str();
        let from = self
            .state
            .highlighted_positions
            .last()
            .map(|last| buf.offset_of(*last) + target.chars().count())
            .unwrap_or(0);
        let found = buf
            .find_forward(target, from)
            .or_else(|| buf.find_forward(target, 0));

        let Some(offset) = found else {
            return Transition::NoMoreMatches;
        };
        let pos = buf.position_at(offset);
        if self.state.highlighted_positions.contains(&pos) {
            return Transition::AllSelected(self.count());
        }
        self.state.highlighted_positions.push(pos);
        Transition::Added(self.count())
    }

    /// Copy the user's edit onto every other highlighted occurrence.
    ///
    /// The replacement is the current selection if there is one, otherwise
    /// the text typed on the original line between the original selection
    /// and the cursor. A cursor on another line yields no replacement, which
    /// cancels.
    pub fn apply(&mut self, buf: &mut TextBuffer) -> Transition {
        if !self.state.active || self.count() <= 1 {
            return Transition::Inactive;
        }

        let replacement = self.replacement_text(buf);
        if replacement.is_empty() || replacement == self.state.target_text {
            return self.cancel();
        }

        let target_len = self.state.target_text.chars().count();
        let origin = self.state.original_selection;
        // How far the user's own edit moved text to its right
        let shift = replacement.chars().count() as isize - target_len as isize;

        let mut applied = 1;
        for pos in self.rewrite_order() {
            let shifted = if pos.row == origin.row && pos.col > origin.col {
                pos.col.checked_add_signed(shift).map(|col| Position::new(pos.row, col))
            } else {
                None
            };
            let located = shifted
                .into_iter()
                .chain(std::iter::once(pos))
                .find(|p| buf.text_range(*p, Position::new(p.row, p.col + target_len)) == self.state.target_text);

            match located {
                Some(at) => {
                    buf.delete(at, Position::new(at.row, at.col + target_len));
                    buf.insert(at, &replacement);
                    applied += 1;
                }
                None => debug!(row = pos.row, col = pos.col, "occurrence changed before apply, skipping"),
            }
        }

        self.state = MultiSelectState::default();
        Transition::Applied(applied)
    }

    /// Drop all highlights without touching the document
    pub fn cancel(&mut self) -> Transition {
        if !self.state.active {
            return Transition::Inactive;
        }
        self.state = MultiSelectState::default();
        Transition::Cancelled
    }

    fn replacement_text(&self, buf: &TextBuffer) -> String {
        if let Some(selected) = buf.selected_text() {
            return selected;
        }
        let origin = self.state.original_selection;
        let cursor = buf.cursor();
        if cursor.row != origin.row || cursor.col <= origin.col {
            return String::new();
        }
        buf.text_range(origin, cursor)
    }
}
