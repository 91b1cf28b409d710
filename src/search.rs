//! Searching: project-wide through an external tool, and within a buffer.
//!
//! Project search shells out to `rg`, falling back to `grep -rn` when
//! ripgrep is not installed. Both print `path:line:content`, which
//! [`parse_search_output`] turns into [`SearchMatch`]es.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::editor::{Position, TextBuffer};
use crate::error::SearchError;

/// Directories never searched
const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "__pycache__", ".venv"];

/// File types the grep fallback looks at
const GREP_INCLUDES: &[&str] = &["*.py", "*.js", "*.ts", "*.tsx", "*.json", "*.md", "*.rs", "*.toml"];

/// One matching line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based, as printed by the tool
    pub line_number: usize,
    pub snippet: String,
}

impl SearchMatch {
    /// Path relative to `root`, shortened from the left to 40 chars
    pub fn display_path(&self, root: &Path) -> String {
        let rel = self
            .path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .display()
            .to_string();
        let len = rel.chars().count();
        if len > 40 {
            let tail: String = rel.chars().skip(len - 37).collect();
            format!("...{}", tail)
        } else {
            rel
        }
    }
}

/// Matches plus the status line shown with them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub matches: Vec<SearchMatch>,
    pub status: String,
}

impl From<Result<Vec<SearchMatch>, SearchError>> for SearchReport {
    fn from(result: Result<Vec<SearchMatch>, SearchError>) -> Self {
        match result {
            Ok(matches) if matches.is_empty() => Self {
                matches,
                status: "No matches found".to_string(),
            },
            Ok(matches) => Self {
                status: format!("{} matches", matches.len()),
                matches,
            },
            Err(e) => Self {
                matches: Vec::new(),
                status: e.to_string(),
            },
        }
    }
}

/// Search every file under `root` for `query`
pub async fn search_project(root: &Path, query: &str, config: &SearchConfig) -> Result<Vec<SearchMatch>, SearchError> {
    if query.chars().count() < config.min_query_len {
        return Err(SearchError::QueryTooShort(config.min_query_len));
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    let output = match run_tool(ripgrep_command(root, query, config.max_matches), timeout).await {
        Err(SearchError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!("rg not found, falling back to grep");
            let timeout = Duration::from_secs(config.fallback_timeout_secs);
            run_tool(grep_command(root, query, config.max_matches), timeout).await?
        }
        result => result?,
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    // Both tools exit with 1 when nothing matched
    if stdout.trim().is_empty() && output.status.code().map_or(true, |code| code > 1) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().next().unwrap_or("search failed").trim();
        warn!(status = %output.status, detail, "search tool failed");
        return Err(SearchError::ToolFailed(detail.chars().take(30).collect()));
    }

    let matches = parse_search_output(&stdout, config.max_matches);
    info!(query, count = matches.len(), "project search finished");
    Ok(matches)
}

async fn run_tool(mut cmd: Command, timeout: Duration) -> Result<Output, SearchError> {
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!(?timeout, "search tool timed out");
            Err(SearchError::TimedOut)
        }
    }
}

fn ripgrep_command(root: &Path, query: &str, max: usize) -> Command {
    let mut cmd = Command::new("rg");
    cmd.args(["--line-number", "--no-heading", "--color=never", "-m"])
        .arg(max.to_string());
    for dir in EXCLUDED_DIRS {
        cmd.arg("-g").arg(format!("!{}", dir));
    }
    cmd.args(["-g", "!*.min.*", "--max-depth", "10", "--"])
        .arg(query)
        .arg(root);
    cmd
}

fn grep_command(root: &Path, query: &str, max: usize) -> Command {
    let mut cmd = Command::new("grep");
    cmd.args(["-rn", "-m"]).arg(max.to_string());
    for pattern in GREP_INCLUDES {
        cmd.arg(format!("--include={}", pattern));
    }
    for dir in EXCLUDED_DIRS {
        cmd.arg(format!("--exclude-dir={}", dir));
    }
    cmd.arg("--").arg(query).arg(root);
    cmd
}

/// Parse `path:line:content` lines, skipping anything malformed
pub fn parse_search_output(output: &str, max: usize) -> Vec<SearchMatch> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, ':');
            let path = parts.next()?;
            let line_number = parts.next()?.parse().ok()?;
            let snippet = parts.next()?;
            Some(SearchMatch {
                path: PathBuf::from(path),
                line_number,
                snippet: snippet.trim().to_string(),
            })
        })
        .take(max)
        .collect()
}

/// An occurrence found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindMatch {
    pub start: Position,
    pub end: Position,
    /// 1-based index among all occurrences
    pub index: usize,
    pub total: usize,
}

impl FindMatch {
    /// `i/N`
    pub fn status(&self) -> String {
        format!("{}/{}", self.index, self.total)
    }
}

/// Next (or previous) occurrence of `query` relative to the cursor,
/// wrapping around either end of the document
pub fn find_in_buffer(buf: &TextBuffer, query: &str, reverse: bool) -> Option<FindMatch> {
    let cursor = buf.offset_of(buf.cursor());
    let offset = if reverse {
        buf.find_backward(query, cursor)
            .or_else(|| buf.find_backward(query, usize::MAX))?
    } else {
        buf.find_forward(query, cursor + 1)
            .or_else(|| buf.find_forward(query, 0))?
    };

    let len = query.chars().count();
    Some(FindMatch {
        start: buf.position_at(offset),
        end: buf.position_at(offset + len),
        index: buf.count_occurrences(query, Some(offset + len)),
        total: buf.count_occurrences(query, None),
    })
}
