//! User interface rendering and input handling.
//!
//! - **renderer**: full-frame renderer for panes, terminal and status row
//! - **keymapper**: key events to PTY bytes or editor actions
//! - **prompt**: the status-row line prompt and the search result list

pub mod keymapper;
pub mod prompt;
pub mod renderer;

pub use keymapper::{terminal_escape, Action, EditorKeymap, KeyMapper, Modifiers, PromptKind};
pub use prompt::{ListEvent, Prompt, PromptEvent, ResultList};
pub use renderer::{Focus, Rect, Renderer, ScreenLayout, View};
