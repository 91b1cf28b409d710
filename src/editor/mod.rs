//! Editor session model.
//!
//! - **buffer**: text buffer with cursor and selection
//! - **file**: an open document and its modified flag
//! - **pane**: tab order and active tab of one pane
//! - **state**: the one-or-two pane topology
//! - **layout**: split, close-split and move-file operations
//! - **multicursor**: multi-occurrence editing
//!
//! # Architecture
//!
//! ```text
//! EditorState
//! ├── EditorPane (left/top)
//! │   ├── OpenFile ... (tab order)
//! │   └── MultiCursorEngine
//! └── EditorPane (right/bottom, only when split)
//! ```

pub mod buffer;
pub mod file;
pub mod layout;
pub mod multicursor;
pub mod pane;
pub mod state;

pub use buffer::{Motion, Position, Selection, TextBuffer};
pub use file::OpenFile;
pub use layout::{Direction, MoveOutcome, SplitAxis};
pub use multicursor::{MultiCursorEngine, MultiCursorEvent, MultiSelectState, Transition};
pub use pane::EditorPane;
pub use state::{EditorState, PaneId, SplitOrientation, MAIN_PANE_ID};
