//! OpenFile - a document open in an editor tab

use std::path::{Path, PathBuf};

use super::buffer::TextBuffer;
use crate::util::{language_for, path_to_tab_id};

/// A document open in a pane.
///
/// The modified flag is derived by comparing the live buffer against the
/// snapshot taken at the last load or save.
#[derive(Debug, Clone)]
pub struct OpenFile {
    path: PathBuf,
    pub buffer: TextBuffer,
    original_content: String,
    language: Option<&'static str>,
}

impl OpenFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let language = language_for(&path);
        Self {
            buffer: TextBuffer::from_text(&content),
            original_content: content,
            language,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> String {
        self.buffer.text()
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.text() != self.original_content
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    /// Reconcile the snapshot after a successful save
    pub fn mark_saved(&mut self) {
        self.original_content = self.buffer.text();
    }

    /// Tab identifier
    pub fn id(&self) -> String {
        path_to_tab_id(&self.path)
    }

    /// File name, prefixed with `* ` when modified
    pub fn display_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        if self.is_modified() {
            format!("* {}", name)
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::buffer::Position;

    #[test]
    fn test_modified_flag_is_derived() {
        let mut file = OpenFile::new("/tmp/test.py", "print('hello')");
        assert!(!file.is_modified());
        assert_eq!(file.language(), Some("python"));

        file.buffer.insert(Position::new(0, 0), "# ");
        assert!(file.is_modified());
        assert_eq!(file.display_name(), "* test.py");

        // Typing the original text back clears the flag
        file.buffer.delete(Position::new(0, 0), Position::new(0, 2));
        assert!(!file.is_modified());
    }

    #[test]
    fn test_mark_saved_reconciles() {
        let mut file = OpenFile::new("notes.txt", "a");
        file.buffer.insert(Position::new(0, 1), "b");
        file.mark_saved();
        assert!(!file.is_modified());
        assert_eq!(file.original_content(), "ab");
        assert_eq!(file.language(), None);
        assert_eq!(file.display_name(), "notes.txt");
    }
}
