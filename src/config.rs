//! Configuration loading.
//!
//! Settings come from up to two TOML files layered over the built-in
//! defaults:
//!
//! 1. `$XDG_CONFIG_HOME/cli-ide/config.toml` (or `~/.config/cli-ide/config.toml`)
//! 2. `<project root>/.cli-ide.toml`
//!
//! Later files win key by key, so a project file may override a single
//! value without repeating the rest of its section.
//!
//! ```toml
//! [editor]
//! theme = "dark"          # light-ide, dark
//! tab_size = 4
//! show_line_numbers = true
//!
//! [terminal]
//! shell = ""              # empty: $SHELL, then /bin/sh
//! height = 14
//!
//! [search]
//! max_matches = 50
//! timeout_secs = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::term::Palette;
use crate::error::{IdeError, Result};

/// Name of the per-project override file
pub const PROJECT_CONFIG_FILE: &str = ".cli-ide.toml";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub terminal: TerminalConfig,
    pub search: SearchConfig,
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Palette name: light-ide, dark
    pub theme: String,
    /// Spaces inserted for Tab
    pub tab_size: usize,
    pub show_line_numbers: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            theme: "light-ide".to_string(),
            tab_size: 4,
            show_line_numbers: true,
        }
    }
}

/// Embedded terminal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Shell program; empty means `$SHELL`, then `/bin/sh`
    pub shell: String,
    /// Rows given to the terminal panel
    pub height: u16,
    pub poll_interval_ms: u64,
    pub read_chunk_size: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell: String::new(),
            height: 14,
            poll_interval_ms: 20,
            read_chunk_size: 65536,
        }
    }
}

/// Project search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_matches: usize,
    pub timeout_secs: u64,
    /// Timeout for the slower grep fallback
    pub fallback_timeout_secs: u64,
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_matches: 50,
            timeout_secs: 5,
            fallback_timeout_secs: 10,
            min_query_len: 2,
        }
    }
}

impl Config {
    /// Load the user file and the project file under `project_root`
    pub fn load(project_root: &Path) -> Self {
        let user = config_dir().map(|dir| dir.join("config.toml"));
        Self::load_from(user.as_deref(), project_root)
    }

    /// Layer `user` (if any) and the project file over the defaults.
    ///
    /// Missing files are skipped silently, unreadable or invalid ones with
    /// a warning. Never fails.
    pub fn load_from(user: Option<&Path>, project_root: &Path) -> Self {
        let project = project_root.join(PROJECT_CONFIG_FILE);
        let mut merged = toml::Table::new();

        for path in user.into_iter().chain([project.as_path()]) {
            if let Some(layer) = read_layer(path) {
                info!(path = %path.display(), "config loaded");
                merge_tables(&mut merged, layer);
            }
        }

        toml::Value::Table(merged).try_into().unwrap_or_else(|e| {
            warn!(error = %e, "merged config rejected, using defaults");
            Self::default()
        })
    }

    /// Write this configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| IdeError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| IdeError::Config(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(path, content)
            .map_err(|e| IdeError::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Palette selected by `editor.theme`
    pub fn palette(&self) -> Palette {
        Palette::by_name(&self.editor.theme)
    }
}

/// One file's table, if it exists and describes a valid configuration
fn read_layer(path: &Path) -> Option<toml::Table> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config");
            return None;
        }
    };

    let table: toml::Table = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid config ignored");
            return None;
        }
    };
    // Reject files with wrongly typed values before they poison the merge
    if let Err(e) = toml::Value::Table(table.clone()).try_into::<Config>() {
        warn!(path = %path.display(), error = %e, "invalid config ignored");
        return None;
    }
    Some(table)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(table)) => merge_tables(existing, table),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Per-user directory for the config file and the log
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| home_dir().map(|home| home.join(".config")))
        .map(|dir| dir.join("cli-ide"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
