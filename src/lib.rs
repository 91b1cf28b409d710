//! cli-ide - a terminal-resident IDE core.
//!
//! The crate is split the way the running program is:
//!
//! - [`editor`]: open files, panes, splits and multi-cursor editing
//! - [`core`]: the embedded shell (PTY, ANSI decoding, screen grid)
//! - [`app`]: the [`Workspace`](app::Workspace) that commands run against
//! - [`ui`]: crossterm rendering and key mapping
//! - [`search`], [`config`], [`fs`]: project search, settings and file access

pub mod app;
pub mod config;
pub mod core;
pub mod editor;
pub mod error;
pub mod fs;
pub mod search;
pub mod ui;
pub mod util;

pub use app::{CloseMode, Command, Notification, Outcome, Severity, Workspace};
pub use config::Config;
pub use error::{IdeError, Result};
