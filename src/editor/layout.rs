//! Split layout management.
//!
//! A session holds at most two panes along a single axis. These operations
//! are the only way panes are created or destroyed, which keeps the
//! one-or-two-pane invariant of [`EditorState`] intact.

use std::path::Path;

use tracing::info;

use super::pane::EditorPane;
use super::state::{EditorState, PaneId, SplitOrientation};
use crate::error::LayoutError;

/// Axis of a split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    /// Panes side by side
    Horizontal,
    /// Panes stacked
    Vertical,
}

impl From<SplitAxis> for SplitOrientation {
    fn from(axis: SplitAxis) -> Self {
        match axis {
            SplitAxis::Horizontal => SplitOrientation::Horizontal,
            SplitAxis::Vertical => SplitOrientation::Vertical,
        }
    }
}

/// Where to move a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Split axis this direction moves along
    pub fn axis(self) -> SplitAxis {
        match self {
            Direction::Left | Direction::Right => SplitAxis::Horizontal,
            Direction::Up | Direction::Down => SplitAxis::Vertical,
        }
    }

    /// Left and up land in the first pane
    fn targets_first(self) -> bool {
        matches!(self, Direction::Left | Direction::Up)
    }
}

/// Result of a successful [`EditorState::move_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: PaneId, to: PaneId },
    /// The file already lives in the target pane
    AlreadyThere,
}

impl EditorState {
    /// Split the session along `axis` and return the second pane's id.
    ///
    /// Splitting again along the current axis returns the existing second
    /// pane. Splitting along the other axis is rejected.
    pub fn split(&mut self, axis: SplitAxis) -> Result<PaneId, LayoutError> {
        let requested = SplitOrientation::from(axis);
        match self.split_orientation {
            SplitOrientation::None => {}
            existing if existing == requested => return Ok(self.panes[1].id()),
            existing => return Err(LayoutError::SplitConflict { existing, requested }),
        }

        let id = self.next_pane_id;
        self.next_pane_id += 1;
        self.panes.push(EditorPane::new(id));
        self.split_orientation = requested;
        info!(pane = id, orientation = %requested, "split created");
        Ok(id)
    }

    /// Remove `pane_id` and its tabs, leaving the other pane as sole occupant
    pub fn close_split(&mut self, pane_id: PaneId) -> Result<(), LayoutError> {
        if self.panes.len() < 2 {
            return Err(LayoutError::NotSplit);
        }
        let index = self
            .panes
            .iter()
            .position(|p| p.id() == pane_id)
            .ok_or(LayoutError::UnknownPane(pane_id))?;

        let closed = self.panes.remove(index);
        self.split_orientation = SplitOrientation::None;
        if self.active_pane_id == pane_id {
            self.active_pane_id = self.panes[0].id();
        }
        info!(pane = pane_id, dropped_tabs = closed.len(), "split closed");
        Ok(())
    }

    /// Move an open file to the pane in `direction`, splitting if needed.
    ///
    /// The file's tab closes in its source pane (which reactivates a
    /// neighbour), opens in the target pane, and the target gains focus.
    /// A target that already holds the path is left alone and the move fails.
    pub fn move_file(&mut self, path: &Path, direction: Direction) -> Result<MoveOutcome, LayoutError> {
        let source = self
            .pane_of(path)
            .ok_or_else(|| LayoutError::FileNotOpen(path.to_path_buf()))?;

        let requested = SplitOrientation::from(direction.axis());
        if self.is_split() && self.split_orientation != requested {
            return Err(LayoutError::SplitConflict {
                existing: self.split_orientation,
                requested,
            });
        }
        if !self.is_split() {
            if direction.targets_first() {
                // The lone pane is already the first one
                return Ok(MoveOutcome::AlreadyThere);
            }
            self.split(direction.axis())?;
        }

        let target = if direction.targets_first() {
            self.panes[0].id()
        } else {
            self.panes[1].id()
        };
        if target == source {
            return Ok(MoveOutcome::AlreadyThere);
        }
        if self.pane(target).map_or(false, |pane| pane.contains(path)) {
            return Err(LayoutError::AlreadyOpen(path.to_path_buf()));
        }

        let file = self
            .pane_mut(source)
            .and_then(|pane| pane.take_file(path))
            .ok_or_else(|| LayoutError::FileNotOpen(path.to_path_buf()))?;
        self.pane_mut(target)
            .ok_or(LayoutError::UnknownPane(target))?
            .add_file(file);
        self.active_pane_id = target;
        Ok(MoveOutcome::Moved { from: source, to: target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::state::MAIN_PANE_ID;
    use crate::editor::OpenFile;
    use std::path::PathBuf;

    fn state_with(names: &[&str]) -> EditorState {
        let mut state = EditorState::new();
        for name in names {
            state.active_pane_mut().add_file(OpenFile::new(*name, ""));
        }
        state
    }

    #[test]
    fn test_split_creates_one_empty_pane() {
        let mut state = EditorState::new();
        let id = state.split(SplitAxis::Horizontal).unwrap();
        assert_eq!(state.panes().len(), 2);
        assert_eq!(state.panes()[1].id(), id);
        assert!(state.panes()[1].is_empty());
        assert_eq!(state.split_orientation(), SplitOrientation::Horizontal);
        // Splitting again on the same axis reuses the pane
        assert_eq!(state.split(SplitAxis::Horizontal), Ok(id));
        assert_eq!(state.panes().len(), 2);
    }

    #[test]
    fn test_split_on_other_axis_is_rejected() {
        let mut state = EditorState::new();
        state.split(SplitAxis::Vertical).unwrap();
        let err = state.split(SplitAxis::Horizontal).unwrap_err();
        assert_eq!(
            err,
            LayoutError::SplitConflict {
                existing: SplitOrientation::Vertical,
                requested: SplitOrientation::Horizontal,
            }
        );
        assert_eq!(state.split_orientation(), SplitOrientation::Vertical);
        assert_eq!(state.panes().len(), 2);
    }

    #[test]
    fn test_close_split_requires_two_panes() {
        let mut state = EditorState::new();
        assert_eq!(state.close_split(MAIN_PANE_ID), Err(LayoutError::NotSplit));
    }

    #[test]
    fn test_close_split_refocuses_survivor() {
        let mut state = EditorState::new();
        let second = state.split(SplitAxis::Horizontal).unwrap();
        state.set_active_pane(second).unwrap();
        state.close_split(second).unwrap();
        assert_eq!(state.panes().len(), 1);
        assert_eq!(state.active_pane_id(), MAIN_PANE_ID);
        assert_eq!(state.split_orientation(), SplitOrientation::None);
    }

    #[test]
    fn test_move_right_creates_split_and_focuses_target() {
        let mut state = state_with(&["a.rs", "b.rs", "c.rs"]);
        state.active_pane_mut().activate(Path::new("b.rs"));

        let outcome = state.move_file(Path::new("b.rs"), Direction::Right).unwrap();
        let target = state.panes()[1].id();
        assert_eq!(outcome, MoveOutcome::Moved { from: MAIN_PANE_ID, to: target });
        assert_eq!(state.active_pane_id(), target);

        let source = state.pane(MAIN_PANE_ID).unwrap();
        assert_eq!(source.tab_order(), &[PathBuf::from("a.rs"), PathBuf::from("c.rs")]);
        assert_eq!(source.active_file(), Some(Path::new("c.rs")));
        assert_eq!(state.active_pane().active_file(), Some(Path::new("b.rs")));
    }

    #[test]
    fn test_move_into_own_pane_is_noop() {
        let mut state = state_with(&["a.rs"]);
        assert_eq!(state.move_file(Path::new("a.rs"), Direction::Left), Ok(MoveOutcome::AlreadyThere));
        assert!(!state.is_split());

        state.move_file(Path::new("a.rs"), Direction::Down).unwrap();
        assert_eq!(state.move_file(Path::new("a.rs"), Direction::Down), Ok(MoveOutcome::AlreadyThere));
        assert_eq!(state.move_file(Path::new("a.rs"), Direction::Up).map(|_| ()), Ok(()));
        assert_eq!(state.active_pane_id(), MAIN_PANE_ID);
    }

    #[test]
    fn test_move_across_axis_is_rejected() {
        let mut state = state_with(&["a.rs", "b.rs"]);
        state.move_file(Path::new("a.rs"), Direction::Right).unwrap();
        let err = state.move_file(Path::new("a.rs"), Direction::Up).unwrap_err();
        assert!(matches!(err, LayoutError::SplitConflict { .. }));
    }

    #[test]
    fn test_move_onto_existing_copy_is_rejected() {
        let mut state = state_with(&["a.rs"]);
        state.split(SplitAxis::Horizontal).unwrap();
        let second = state.panes()[1].id();
        state.pane_mut(second).unwrap().add_file(OpenFile::new("a.rs", "other"));
        state.pane_mut(MAIN_PANE_ID).unwrap().active_mut().unwrap().buffer.insert_at_cursor("EDIT ");

        state.set_active_pane(MAIN_PANE_ID).unwrap();
        assert_eq!(
            state.move_file(Path::new("a.rs"), Direction::Right),
            Err(LayoutError::AlreadyOpen(PathBuf::from("a.rs")))
        );
        let kept = state.pane(MAIN_PANE_ID).unwrap().file(Path::new("a.rs")).unwrap();
        assert_eq!(kept.content(), "EDIT ");
        assert_eq!(state.pane(second).unwrap().file(Path::new("a.rs")).unwrap().content(), "other");
        assert_eq!(state.active_pane_id(), MAIN_PANE_ID);
    }

    #[test]
    fn test_move_unknown_file() {
        let mut state = EditorState::new();
        assert_eq!(
            state.move_file(Path::new("nope"), Direction::Right),
            Err(LayoutError::FileNotOpen(PathBuf::from("nope")))
        );
    }
}
