//! EditorState - the pane topology of one session

use std::fmt;
use std::path::Path;

use super::pane::EditorPane;
use crate::error::LayoutError;

/// Unique identifier for a pane
pub type PaneId = u64;

/// Id of the pane every session starts with
pub const MAIN_PANE_ID: PaneId = 1;

/// How the two panes of a split session are arranged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitOrientation {
    #[default]
    None,
    /// Side by side
    Horizontal,
    /// Stacked
    Vertical,
}

impl fmt::Display for SplitOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SplitOrientation::None => "none",
            SplitOrientation::Horizontal => "horizontal",
            SplitOrientation::Vertical => "vertical",
        })
    }
}

/// One or two panes plus the split that arranges them.
///
/// `split_orientation` is `None` exactly when there is one pane. With two
/// panes the first is left/top and the second right/bottom. Panes are only
/// added or removed by the layout operations in [`super::layout`].
#[derive(Debug)]
pub struct EditorState {
    pub(super) panes: Vec<EditorPane>,
    pub(super) active_pane_id: PaneId,
    pub(super) split_orientation: SplitOrientation,
    pub(super) next_pane_id: PaneId,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            panes: vec![EditorPane::new(MAIN_PANE_ID)],
            active_pane_id: MAIN_PANE_ID,
            split_orientation: SplitOrientation::None,
            next_pane_id: MAIN_PANE_ID + 1,
        }
    }

    pub fn panes(&self) -> &[EditorPane] {
        &self.panes
    }

    pub fn split_orientation(&self) -> SplitOrientation {
        self.split_orientation
    }

    pub fn is_split(&self) -> bool {
        self.split_orientation != SplitOrientation::None
    }

    pub fn active_pane_id(&self) -> PaneId {
        self.active_pane_id
    }

    pub fn pane(&self, id: PaneId) -> Option<&EditorPane> {
        self.panes.iter().find(|p| p.id() == id)
    }

    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut EditorPane> {
        self.panes.iter_mut().find(|p| p.id() == id)
    }

    pub fn active_pane(&self) -> &EditorPane {
        &self.panes[self.active_index()]
    }

    pub fn active_pane_mut(&mut self) -> &mut EditorPane {
        let index = self.active_index();
        &mut self.panes[index]
    }

    /// Focus a pane
    pub fn set_active_pane(&mut self, id: PaneId) -> Result<(), LayoutError> {
        if self.pane(id).is_none() {
            return Err(LayoutError::UnknownPane(id));
        }
        self.active_pane_id = id;
        Ok(())
    }

    /// Focus the other pane of a split; a no-op with one pane
    pub fn cycle_pane(&mut self) {
        let index = (self.active_index() + 1) % self.panes.len();
        self.active_pane_id = self.panes[index].id();
    }

    /// Pane holding `path`, preferring the active pane
    pub fn pane_of(&self, path: &Path) -> Option<PaneId> {
        if self.active_pane().contains(path) {
            return Some(self.active_pane_id);
        }
        self.panes.iter().find(|p| p.contains(path)).map(|p| p.id())
    }

    pub(super) fn active_index(&self) -> usize {
        // The active id always names a live pane; index 0 is never reached
        // through the public operations
        self.panes
            .iter()
            .position(|p| p.id() == self.active_pane_id)
            .unwrap_or(0)
    }
}
