//! Core terminal emulation components.
//!
//! - **pty**: pseudo-terminal allocation and the shell process
//! - **term**: ANSI decoder, screen buffer and color palettes
//! - **session**: a shell, its PTY and its screen tied together
//!
//! # Architecture
//!
//! ```text
//! PtySession
//! ├── PtyDevice (non-blocking master fd) + Child (shell)
//! ├── read loop (tokio task) ──SessionEvent──┐
//! └── AnsiDecoder ──ScreenCommand──> ScreenBuffer
//! ```

pub mod pty;
pub mod session;
pub mod term;

pub use pty::{PtyError, ShellCommand};
pub use session::{PtySession, ReadSettings, SessionEvent};
