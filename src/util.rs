//! Small lookups used when opening files.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Extension to language tag
const LANG_MAP: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "javascript"),
    ("tsx", "javascript"),
    ("jsx", "javascript"),
    ("json", "json"),
    ("md", "markdown"),
    ("html", "html"),
    ("css", "css"),
    ("scss", "css"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("rs", "rust"),
    ("go", "go"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("sql", "sql"),
    ("java", "java"),
    ("xml", "xml"),
];

const TAB_ID_PREFIX: &str = "tab-";
const TAB_ID_HEX_LEN: usize = 8;

/// Language tag for a path, keyed on its (case-insensitive) extension.
///
/// Unmapped extensions return `None`, which turns off language-aware features.
pub fn language_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    LANG_MAP
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Stable tab identifier for a path: `tab-` plus the first 8 hex digits of
/// the SHA-256 of the path string.
pub fn path_to_tab_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    let mut id = String::with_capacity(TAB_ID_PREFIX.len() + TAB_ID_HEX_LEN);
    id.push_str(TAB_ID_PREFIX);
    for byte in digest.iter().take(TAB_ID_HEX_LEN / 2) {
        id.push_str(&format!("{:02x}", byte));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_language_lookup() {
        assert_eq!(language_for(Path::new("main.py")), Some("python"));
        assert_eq!(language_for(Path::new("App.TSX")), Some("javascript"));
        assert_eq!(language_for(Path::new("lib.rs")), Some("rust"));
        assert_eq!(language_for(Path::new("notes.txt")), None);
        assert_eq!(language_for(Path::new("Makefile")), None);
    }

    #[test]
    fn test_tab_id_is_deterministic() {
        let p = Path::new("/home/user/project/src/main.rs");
        let a = path_to_tab_id(p);
        let b = path_to_tab_id(p);
        assert_eq!(a, b);
        assert!(a.starts_with("tab-"));
        assert_eq!(a.len(), 12);
        assert!(a[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tab_id_no_collisions_in_sample() {
        let ids: HashSet<String> = (0..2000)
            .map(|i| PathBuf::from(format!("/project/src/module_{}/file_{}.rs", i % 37, i)))
            .map(|p| path_to_tab_id(&p))
            .collect();
        assert_eq!(ids.len(), 2000);
    }
}
