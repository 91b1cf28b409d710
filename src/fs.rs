//! Filesystem collaborator.
//!
//! Documents are read and written through [`Filesystem`] so the workspace
//! can be driven against an in-memory store in tests.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::FileError;

pub trait Filesystem {
    /// Read a document as UTF-8 text
    fn read(&self, path: &Path) -> Result<String, FileError>;

    /// Replace a document's contents
    fn write(&self, path: &Path, contents: &str) -> Result<(), FileError>;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read(&self, path: &Path) -> Result<String, FileError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            _ => FileError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        String::from_utf8(bytes).map_err(|_| FileError::Binary(path.to_path_buf()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), FileError> {
        std::fs::write(path, contents).map_err(|e| FileError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// In-memory filesystem. Files inserted as raw bytes behave like binary
/// files when they are not valid UTF-8.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    read_only: bool,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail
    pub fn read_only() -> Self {
        Self {
            files: Mutex::default(),
            read_only: true,
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), bytes.into());
        }
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(path).cloned()
    }
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> Result<String, FileError> {
        let bytes = self
            .contents(path)
            .ok_or_else(|| FileError::NotFound(path.to_path_buf()))?;
        String::from_utf8(bytes).map_err(|_| FileError::Binary(path.to_path_buf()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), FileError> {
        if self.read_only {
            return Err(FileError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(ErrorKind::PermissionDenied, "read-only filesystem"),
            });
        }
        self.insert(path, contents.as_bytes().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_roundtrip_and_binary_detection() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let binary = dir.path().join("b.bin");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let fs = OsFilesystem;
        fs.write(&text, "hello\n").unwrap();
        assert_eq!(fs.read(&text).unwrap(), "hello\n");
        assert!(matches!(fs.read(&binary), Err(FileError::Binary(_))));
        assert!(matches!(
            fs.read(&dir.path().join("missing")),
            Err(FileError::NotFound(_))
        ));
    }

    #[test]
    fn test_memory_read_only_rejects_writes() {
        let fs = MemoryFilesystem::read_only();
        assert!(matches!(
            fs.write(Path::new("x.txt"), "data"),
            Err(FileError::Io { .. })
        ));
    }
}
