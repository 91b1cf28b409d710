//! Error types shared across the crate.
//!
//! Each subsystem has its own error enum; [`IdeError`] wraps them so callers
//! that cross subsystem boundaries can use a single `Result` type.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::pty::PtyError;
use crate::editor::SplitOrientation;

/// Base error for the whole application
#[derive(Debug, Error)]
pub enum IdeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Terminal(#[from] PtyError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Failures reading or writing documents
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open binary file: {}", display_name(.0))]
    Binary(PathBuf),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Rejected pane topology changes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Already split {existing}; cannot split {requested}")]
    SplitConflict {
        existing: SplitOrientation,
        requested: SplitOrientation,
    },

    #[error("No split to close")]
    NotSplit,

    #[error("Unknown pane {0}")]
    UnknownPane(u64),

    #[error("File is not open: {}", .0.display())]
    FileNotOpen(PathBuf),

    #[error("{} is already open in that pane", display_name(.0))]
    AlreadyOpen(PathBuf),
}

/// Project search failures
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Enter at least {0} characters")]
    QueryTooShort(usize),

    #[error("Search timed out")]
    TimedOut,

    #[error("Error: {0}")]
    ToolFailed(String),

    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub type Result<T, E = IdeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_message_uses_file_name() {
        let err = FileError::Binary(PathBuf::from("/tmp/project/logo.png"));
        assert_eq!(err.to_string(), "Cannot open binary file: logo.png");
    }

    #[test]
    fn test_split_conflict_message() {
        let err = LayoutError::SplitConflict {
            existing: SplitOrientation::Horizontal,
            requested: SplitOrientation::Vertical,
        };
        assert_eq!(err.to_string(), "Already split horizontal; cannot split vertical");
    }

    #[test]
    fn test_short_query_message() {
        assert_eq!(SearchError::QueryTooShort(2).to_string(), "Enter at least 2 characters");
    }
}
