//! Workspace: the editing session handed to every command.
//!
//! The host turns input into [`Command`]s and calls [`Workspace::dispatch`].
//! Every user-facing failure comes back as an [`Outcome::Notice`]; nothing
//! here aborts the session.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::editor::{
    Direction, EditorPane, EditorState, Motion, OpenFile, PaneId, Position, SplitAxis, TextBuffer,
    Transition,
};
use crate::error::{FileError, LayoutError};
use crate::fs::{Filesystem, OsFilesystem};
use crate::search::{self, SearchReport};

/// How loudly to show a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A transient message for the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Information,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// What closing does with unsaved changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Stop with [`Outcome::ConfirmClose`]
    Ask,
    /// Save first; a failed save keeps the file open
    Save,
    Discard,
}

/// Everything the host can ask the workspace to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenFile(PathBuf),
    /// Open a file and jump to a 1-based line
    OpenAt { path: PathBuf, line: usize },
    SaveFile,
    /// Close the active tab
    CloseTab { mode: CloseMode },
    NextTab,
    PrevTab,
    /// 1-based tab index
    GotoTab(usize),
    GotoLastTab,
    FocusPane(PaneId),
    CyclePane,
    Split(SplitAxis),
    /// Close the active pane of a split with all its tabs
    CloseSplit { mode: CloseMode },
    MoveFile(Direction),
    SelectNextMatch,
    ApplyMultiSelect,
    CancelMultiSelect,
    Find { query: String, reverse: bool },
    GotoLine(usize),
    DeleteLine,
    InsertText(String),
    /// Insert `tab_size` spaces
    Indent,
    Backspace,
    DeleteForward,
    MoveCursor(Motion),
    SetCursor(Position),
    Select { anchor: Position, head: Position },
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The command did not apply; the host may treat the key another way
    Unhandled,
    Notice(Notification),
    /// The file has unsaved changes; repeat with another [`CloseMode`]
    ConfirmClose(PathBuf),
}

impl Outcome {
    fn info(message: impl Into<String>) -> Self {
        Outcome::Notice(Notification::info(message))
    }

    fn warning(message: impl Into<String>) -> Self {
        Outcome::Notice(Notification::warning(message))
    }

    fn error(message: impl Into<String>) -> Self {
        Outcome::Notice(Notification::error(message))
    }
}

/// An editing session rooted at a project directory
pub struct Workspace<F: Filesystem = OsFilesystem> {
    root: PathBuf,
    config: Config,
    fs: F,
    editor: EditorState,
}

impl Workspace<OsFilesystem> {
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_filesystem(root, config, OsFilesystem)
    }
}

impl<F: Filesystem> Workspace<F> {
    pub fn with_filesystem(root: impl Into<PathBuf>, config: Config, fs: F) -> Self {
        Self {
            root: root.into(),
            config,
            fs,
            editor: EditorState::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn active_file(&self) -> Option<&OpenFile> {
        self.editor.active_pane().active()
    }

    /// Any open file has unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.editor
            .panes()
            .iter()
            .flat_map(EditorPane::files)
            .any(OpenFile::is_modified)
    }

    pub fn dispatch(&mut self, command: Command) -> Outcome {
        match command {
            Command::OpenFile(path) => self.open_file(&path),
            Command::OpenAt { path, line } => {
                let outcome = self.open_file(&path);
                let path = self.resolve(&path);
                if let Some(file) = self.editor.active_pane_mut().active_mut() {
                    if file.path() == path.as_path() {
                        file.buffer.goto_line(line);
                    }
                }
                outcome
            }
            Command::SaveFile => self.save_file(),
            Command::CloseTab { mode } => self.close_tab(mode),
            Command::NextTab => self.switch_tab(|pane| pane.get_next_file()),
            Command::PrevTab => self.switch_tab(|pane| pane.get_prev_file()),
            Command::GotoTab(index) => {
                self.switch_tab(|pane| index.checked_sub(1).and_then(|i| pane.get_file_at_index(i)))
            }
            Command::GotoLastTab => {
                self.switch_tab(|pane| pane.len().checked_sub(1).and_then(|i| pane.get_file_at_index(i)))
            }
            Command::FocusPane(id) => match self.editor.set_active_pane(id) {
                Ok(()) => Outcome::Done,
                Err(e) => Outcome::error(e.to_string()),
            },
            Command::CyclePane => {
                self.editor.cycle_pane();
                Outcome::Done
            }
            Command::Split(axis) => match self.editor.split(axis) {
                Ok(_) => Outcome::Done,
                Err(e) => Outcome::warning(e.to_string()),
            },
            Command::CloseSplit { mode } => self.close_split(mode),
            Command::MoveFile(direction) => self.move_file(direction),
            Command::SelectNextMatch => self.select_next_match(),
            Command::ApplyMultiSelect => self.apply_multi_select(),
            Command::CancelMultiSelect => self.cancel_multi_select(),
            Command::Find { query, reverse } => self.find(&query, reverse),
            Command::GotoLine(line) => self.edit(|buf| buf.goto_line(line)),
            Command::DeleteLine => self.edit(|buf| buf.delete_line()),
            Command::InsertText(text) => self.edit(|buf| buf.insert_at_cursor(&text)),
            Command::Indent => {
                let spaces = " ".repeat(self.config.editor.tab_size.max(1));
                self.edit(|buf| buf.insert_at_cursor(&spaces))
            }
            Command::Backspace => self.edit(|buf| buf.backspace()),
            Command::DeleteForward => self.edit(|buf| buf.delete_forward()),
            Command::MoveCursor(motion) => self.edit(|buf| buf.move_cursor(motion)),
            Command::SetCursor(pos) => self.edit(|buf| buf.set_cursor(pos)),
            Command::Select { anchor, head } => self.edit(|buf| buf.select(anchor, head)),
        }
    }

    /// Search the project; failures come back as the report's status.
    ///
    /// The future owns its inputs so the host can spawn it.
    pub fn search_project(&self, query: &str) -> impl Future<Output = SearchReport> + Send + 'static {
        let root = self.root.clone();
        let config = self.config.search.clone();
        let query = query.to_string();
        async move { SearchReport::from(search::search_project(&root, &query, &config).await) }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn open_file(&mut self, path: &Path) -> Outcome {
        let path = self.resolve(path);
        // A path lives in one pane at most; reopening focuses it there
        if let Some(pane_id) = self.editor.pane_of(&path) {
            if let Some(pane) = self.editor.pane_mut(pane_id) {
                pane.activate(&path);
            }
            return match self.editor.set_active_pane(pane_id) {
                Ok(()) => Outcome::Done,
                Err(e) => Outcome::error(e.to_string()),
            };
        }

        let content = match self.fs.read(&path) {
            Ok(content) => content,
            Err(e @ FileError::Binary(_)) => return Outcome::warning(e.to_string()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "open failed");
                return Outcome::error(format!("Error opening file: {}", e));
            }
        };

        let file = OpenFile::new(&path, content);
        info!(path = %path.display(), language = ?file.language(), "file opened");
        let name = file.display_name();
        self.editor.active_pane_mut().add_file(file);
        Outcome::info(format!("Opened: {}", name))
    }

    fn save_file(&mut self) -> Outcome {
        let Some(file) = self.editor.active_pane_mut().active_mut() else {
            return Outcome::warning("No file open");
        };
        match save(&self.fs, file) {
            Ok(()) => Outcome::info(format!("Saved: {}", file.display_name())),
            Err(outcome) => outcome,
        }
    }

    fn close_tab(&mut self, mode: CloseMode) -> Outcome {
        let pane_id = self.editor.active_pane_id();
        let pane = self.editor.active_pane_mut();

        if let Some(file) = pane.active_mut() {
            let path = file.path().to_path_buf();
            if file.is_modified() {
                match mode {
                    CloseMode::Ask => return Outcome::ConfirmClose(path),
                    CloseMode::Save => {
                        if let Err(outcome) = save(&self.fs, file) {
                            return outcome;
                        }
                    }
                    CloseMode::Discard => info!(path = %path.display(), "discarding changes"),
                }
            }
            pane.remove_file(&path);
        }

        // An emptied pane of a split goes away with its last tab
        if self.editor.active_pane().is_empty() && self.editor.is_split() {
            if let Err(e) = self.editor.close_split(pane_id) {
                return Outcome::warning(e.to_string());
            }
        }
        Outcome::Done
    }

    fn close_split(&mut self, mode: CloseMode) -> Outcome {
        let pane_id = self.editor.active_pane_id();
        if !self.editor.is_split() {
            return Outcome::warning(LayoutError::NotSplit.to_string());
        }

        {
            let pane = self.editor.active_pane_mut();
            let mut modified: Vec<&mut OpenFile> = pane.files_mut().filter(|f| f.is_modified()).collect();
            modified.sort_by(|a, b| a.path().cmp(b.path()));
            match mode {
                CloseMode::Ask => {
                    if let Some(file) = modified.first() {
                        return Outcome::ConfirmClose(file.path().to_path_buf());
                    }
                }
                CloseMode::Save => {
                    for file in modified {
                        if let Err(outcome) = save(&self.fs, file) {
                            return outcome;
                        }
                    }
                }
                CloseMode::Discard if !modified.is_empty() => {
                    info!(pane = pane_id, files = modified.len(), "discarding changes");
                }
                CloseMode::Discard => {}
            }
        }

        match self.editor.close_split(pane_id) {
            Ok(()) => Outcome::Done,
            Err(e) => Outcome::warning(e.to_string()),
        }
    }

    fn switch_tab(&mut self, pick: impl FnOnce(&EditorPane) -> Option<&Path>) -> Outcome {
        let pane = self.editor.active_pane_mut();
        match pick(pane).map(Path::to_path_buf) {
            Some(path) => {
                pane.activate(&path);
                Outcome::Done
            }
            None => Outcome::Unhandled,
        }
    }

    fn move_file(&mut self, direction: Direction) -> Outcome {
        let Some(path) = self.editor.active_pane().active_file().map(Path::to_path_buf) else {
            return Outcome::warning("No file open");
        };
        match self.editor.move_file(&path, direction) {
            Ok(_) => Outcome::Done,
            Err(e) => Outcome::warning(e.to_string()),
        }
    }

    fn select_next_match(&mut self) -> Outcome {
        let Some((file, engine)) = self.editor.active_pane_mut().active_with_cursor() else {
            return Outcome::warning("No file open");
        };
        match engine.select_next_match(&mut file.buffer) {
            Transition::Added(count) => Outcome::info(format!("Selected {} matches", count)),
            Transition::AllSelected(_) => Outcome::info("All occurrences selected"),
            Transition::NoMoreMatches => Outcome::warning("No more matches"),
            _ => Outcome::Done,
        }
    }

    fn apply_multi_select(&mut self) -> Outcome {
        let Some((file, engine)) = self.editor.active_pane_mut().active_with_cursor() else {
            return Outcome::Unhandled;
        };
        match engine.apply(&mut file.buffer) {
            Transition::Applied(count) => Outcome::info(format!("Replaced {} occurrences", count)),
            Transition::Cancelled => Outcome::info("Multi-select cancelled"),
            _ => Outcome::Unhandled,
        }
    }

    fn cancel_multi_select(&mut self) -> Outcome {
        match self.editor.active_pane_mut().multi_cursor.cancel() {
            Transition::Cancelled => Outcome::info("Multi-select cancelled"),
            _ => Outcome::Unhandled,
        }
    }

    fn find(&mut self, query: &str, reverse: bool) -> Outcome {
        let Some(file) = self.editor.active_pane_mut().active_mut() else {
            return Outcome::warning("No file open");
        };
        match search::find_in_buffer(&file.buffer, query, reverse) {
            Some(found) => {
                // Cursor at the match start so repeated finds advance by one
                file.buffer.select(found.end, found.start);
                Outcome::info(found.status())
            }
            None => Outcome::warning("No results"),
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut TextBuffer)) -> Outcome {
        match self.editor.active_pane_mut().active_mut() {
            Some(file) => {
                f(&mut file.buffer);
                Outcome::Done
            }
            None => Outcome::Unhandled,
        }
    }
}

/// Write `file` and mark it clean; a failure comes back as the notice to show
fn save<F: Filesystem>(fs: &F, file: &mut OpenFile) -> Result<(), Outcome> {
    match fs.write(file.path(), &file.content()) {
        Ok(()) => {
            file.mark_saved();
            info!(path = %file.path().display(), "file saved");
            Ok(())
        }
        Err(e) => {
            warn!(path = %file.path().display(), error = %e, "save failed");
            Err(Outcome::error(format!("Error saving: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{SplitOrientation, MAIN_PANE_ID};
    use crate::fs::MemoryFilesystem;

    fn workspace(files: &[(&str, &str)]) -> Workspace<MemoryFilesystem> {
        let fs = MemoryFilesystem::new();
        for (path, content) in files {
            fs.insert(Path::new("/proj").join(path), content.as_bytes().to_vec());
        }
        Workspace::with_filesystem("/proj", Config::default(), fs)
    }

    fn open(ws: &mut Workspace<MemoryFilesystem>, name: &str) {
        ws.dispatch(Command::OpenFile(PathBuf::from(name)));
    }

    fn active_name(ws: &Workspace<MemoryFilesystem>) -> Option<String> {
        ws.active_file().map(OpenFile::display_name)
    }

    fn text(ws: &Workspace<MemoryFilesystem>) -> String {
        ws.active_file().map(OpenFile::content).unwrap_or_default()
    }

    #[test]
    fn test_open_file_reports_and_focuses() {
        let mut ws = workspace(&[("a.rs", "fn main() {}"), ("b.py", "x = 1")]);
        let outcome = ws.dispatch(Command::OpenFile(PathBuf::from("a.rs")));
        assert_eq!(outcome, Outcome::Notice(Notification::info("Opened: a.rs")));
        open(&mut ws, "b.py");
        assert_eq!(active_name(&ws).as_deref(), Some("b.py"));
        assert_eq!(ws.active_file().and_then(OpenFile::language), Some("python"));

        // Reopening only refocuses
        assert_eq!(ws.dispatch(Command::OpenFile(PathBuf::from("/proj/a.rs"))), Outcome::Done);
        assert_eq!(ws.editor().active_pane().len(), 2);
        assert_eq!(active_name(&ws).as_deref(), Some("a.rs"));
    }

    #[test]
    fn test_open_binary_and_missing_files() {
        let fs = MemoryFilesystem::new();
        fs.insert("/proj/logo.png", vec![0x89, 0x50, 0xff, 0xfe]);
        let mut ws = Workspace::with_filesystem("/proj", Config::default(), fs);

        let outcome = ws.dispatch(Command::OpenFile(PathBuf::from("logo.png")));
        assert_eq!(outcome, Outcome::Notice(Notification::warning("Cannot open binary file: logo.png")));
        assert!(ws.editor().active_pane().is_empty());

        match ws.dispatch(Command::OpenFile(PathBuf::from("missing.rs"))) {
            Outcome::Notice(n) => assert_eq!(n.severity, Severity::Error),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_save_marks_clean() {
        let mut ws = workspace(&[("a.rs", "one")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::SetCursor(Position::new(0, 3)));
        ws.dispatch(Command::InsertText("!".to_string()));
        assert_eq!(active_name(&ws).as_deref(), Some("* a.rs"));
        assert!(ws.has_unsaved_changes());

        let outcome = ws.dispatch(Command::SaveFile);
        assert_eq!(outcome, Outcome::Notice(Notification::info("Saved: a.rs")));
        assert!(!ws.has_unsaved_changes());
        assert_eq!(ws.filesystem().contents(Path::new("/proj/a.rs")), Some(b"one!".to_vec()));
    }

    #[test]
    fn test_save_failure_keeps_modified() {
        let fs = MemoryFilesystem::read_only();
        fs.insert("/proj/a.rs", b"x".to_vec());
        let mut ws = Workspace::with_filesystem("/proj", Config::default(), fs);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::InsertText("y".to_string()));

        match ws.dispatch(Command::SaveFile) {
            Outcome::Notice(n) => {
                assert_eq!(n.severity, Severity::Error);
                assert!(n.message.starts_with("Error saving: "));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ws.has_unsaved_changes());
    }

    #[test]
    fn test_close_modified_tab_needs_confirmation() {
        let mut ws = workspace(&[("a.rs", ""), ("b.rs", ""), ("c.rs", "")]);
        for name in ["a.rs", "b.rs", "c.rs"] {
            open(&mut ws, name);
        }
        ws.dispatch(Command::GotoTab(2));
        ws.dispatch(Command::InsertText("dirty".to_string()));

        let outcome = ws.dispatch(Command::CloseTab { mode: CloseMode::Ask });
        assert_eq!(outcome, Outcome::ConfirmClose(PathBuf::from("/proj/b.rs")));
        assert_eq!(ws.editor().active_pane().len(), 3);

        assert_eq!(ws.dispatch(Command::CloseTab { mode: CloseMode::Discard }), Outcome::Done);
        assert_eq!(ws.editor().active_pane().len(), 2);
        // The tab that slid into the closed slot takes focus
        assert_eq!(active_name(&ws).as_deref(), Some("c.rs"));
    }

    #[test]
    fn test_close_tab_can_save_first() {
        let mut ws = workspace(&[("a.rs", "x")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::InsertText("y".to_string()));

        assert_eq!(ws.dispatch(Command::CloseTab { mode: CloseMode::Save }), Outcome::Done);
        assert!(ws.active_file().is_none());
        assert_eq!(ws.filesystem().read(Path::new("/proj/a.rs")).unwrap(), "yx");

        let fs = MemoryFilesystem::read_only();
        fs.insert("/proj/a.rs", b"x".to_vec());
        let mut ws = Workspace::with_filesystem("/proj", Config::default(), fs);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::InsertText("y".to_string()));
        assert!(matches!(
            ws.dispatch(Command::CloseTab { mode: CloseMode::Save }),
            Outcome::Notice(Notification { severity: Severity::Error, .. })
        ));
        assert_eq!(text(&ws), "yx");
    }

    #[test]
    fn test_close_split_with_unsaved_work_asks() {
        let mut ws = workspace(&[("a.rs", "fn a() {}"), ("b.rs", "")]);
        open(&mut ws, "b.rs");
        open(&mut ws, "a.rs");
        ws.dispatch(Command::MoveFile(Direction::Right));
        ws.dispatch(Command::InsertText("edit ".to_string()));

        assert_eq!(
            ws.dispatch(Command::CloseSplit { mode: CloseMode::Ask }),
            Outcome::ConfirmClose(PathBuf::from("/proj/a.rs"))
        );
        assert!(ws.editor().is_split());
        assert!(ws.has_unsaved_changes());

        assert_eq!(ws.dispatch(Command::CloseSplit { mode: CloseMode::Save }), Outcome::Done);
        assert!(!ws.editor().is_split());
        assert_eq!(ws.filesystem().read(Path::new("/proj/a.rs")).unwrap(), "edit fn a() {}");
        assert_eq!(active_name(&ws).as_deref(), Some("b.rs"));
    }

    #[test]
    fn test_close_split_discard_drops_edits() {
        let mut ws = workspace(&[("a.rs", "x")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::MoveFile(Direction::Down));
        ws.dispatch(Command::InsertText("y".to_string()));

        assert_eq!(ws.dispatch(Command::CloseSplit { mode: CloseMode::Discard }), Outcome::Done);
        assert!(!ws.has_unsaved_changes());
        assert_eq!(ws.filesystem().read(Path::new("/proj/a.rs")).unwrap(), "x");
    }

    #[test]
    fn test_reopening_file_focuses_its_pane() {
        let mut ws = workspace(&[("a.rs", "orig")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::MoveFile(Direction::Right));
        let second = ws.editor().active_pane_id();
        ws.dispatch(Command::CyclePane);
        assert_eq!(ws.editor().active_pane_id(), MAIN_PANE_ID);

        assert_eq!(ws.dispatch(Command::OpenFile(PathBuf::from("a.rs"))), Outcome::Done);
        assert_eq!(ws.editor().active_pane_id(), second);
        assert!(ws.editor().active_pane().contains(Path::new("/proj/a.rs")));
        assert!(ws.editor().pane(MAIN_PANE_ID).unwrap().is_empty());

        ws.dispatch(Command::InsertText("EDIT ".to_string()));
        ws.dispatch(Command::MoveFile(Direction::Right));
        assert!(ws.has_unsaved_changes());
        assert_eq!(text(&ws), "EDIT orig");
    }

    #[test]
    fn test_closing_last_tab_of_split_closes_it() {
        let mut ws = workspace(&[("a.rs", ""), ("b.rs", "")]);
        open(&mut ws, "a.rs");
        open(&mut ws, "b.rs");
        ws.dispatch(Command::MoveFile(Direction::Right));
        assert!(ws.editor().is_split());
        assert_ne!(ws.editor().active_pane_id(), MAIN_PANE_ID);

        ws.dispatch(Command::CloseTab { mode: CloseMode::Ask });
        assert!(!ws.editor().is_split());
        assert_eq!(ws.editor().active_pane_id(), MAIN_PANE_ID);
        assert_eq!(active_name(&ws).as_deref(), Some("a.rs"));
    }

    #[test]
    fn test_tab_navigation() {
        let mut ws = workspace(&[("a.rs", ""), ("b.rs", ""), ("c.rs", "")]);
        for name in ["a.rs", "b.rs", "c.rs"] {
            open(&mut ws, name);
        }
        ws.dispatch(Command::NextTab);
        assert_eq!(active_name(&ws).as_deref(), Some("a.rs"));
        ws.dispatch(Command::PrevTab);
        assert_eq!(active_name(&ws).as_deref(), Some("c.rs"));
        ws.dispatch(Command::GotoTab(2));
        assert_eq!(active_name(&ws).as_deref(), Some("b.rs"));
        assert_eq!(ws.dispatch(Command::GotoTab(9)), Outcome::Unhandled);
        assert_eq!(ws.dispatch(Command::GotoTab(0)), Outcome::Unhandled);
        ws.dispatch(Command::GotoLastTab);
        assert_eq!(active_name(&ws).as_deref(), Some("c.rs"));
    }

    #[test]
    fn test_split_conflict_is_a_warning() {
        let mut ws = workspace(&[]);
        assert_eq!(ws.dispatch(Command::Split(SplitAxis::Vertical)), Outcome::Done);
        assert_eq!(
            ws.dispatch(Command::Split(SplitAxis::Horizontal)),
            Outcome::Notice(Notification::warning("Already split vertical; cannot split horizontal"))
        );
        assert_eq!(ws.editor().split_orientation(), SplitOrientation::Vertical);
        // Focus stays on the original pane
        assert_eq!(ws.editor().active_pane_id(), MAIN_PANE_ID);
        assert_eq!(ws.dispatch(Command::CloseSplit { mode: CloseMode::Ask }), Outcome::Done);
        assert_ne!(ws.dispatch(Command::CloseSplit { mode: CloseMode::Ask }), Outcome::Done);
    }

    #[test]
    fn test_multi_select_round_trip() {
        let mut ws = workspace(&[("m.py", "foo = 1\naa foo\necho foo")]);
        open(&mut ws, "m.py");

        assert_eq!(
            ws.dispatch(Command::SelectNextMatch),
            Outcome::Notice(Notification::info("Selected 2 matches"))
        );
        assert_eq!(
            ws.dispatch(Command::SelectNextMatch),
            Outcome::Notice(Notification::info("Selected 3 matches"))
        );
        assert_eq!(
            ws.dispatch(Command::SelectNextMatch),
            Outcome::Notice(Notification::info("All occurrences selected"))
        );

        ws.dispatch(Command::InsertText("bar".to_string()));
        assert_eq!(
            ws.dispatch(Command::ApplyMultiSelect),
            Outcome::Notice(Notification::info("Replaced 3 occurrences"))
        );
        assert_eq!(text(&ws), "bar = 1\naa bar\necho bar");
        assert_eq!(ws.dispatch(Command::ApplyMultiSelect), Outcome::Unhandled);
    }

    #[test]
    fn test_cancel_and_tab_switch_drop_highlights() {
        let mut ws = workspace(&[("a.rs", "x x"), ("b.rs", "")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::SelectNextMatch);
        assert_eq!(
            ws.dispatch(Command::CancelMultiSelect),
            Outcome::Notice(Notification::info("Multi-select cancelled"))
        );
        assert_eq!(ws.dispatch(Command::CancelMultiSelect), Outcome::Unhandled);

        ws.dispatch(Command::SelectNextMatch);
        open(&mut ws, "b.rs");
        assert!(!ws.editor().active_pane().multi_cursor.is_active());
    }

    #[test]
    fn test_find_reports_position() {
        let mut ws = workspace(&[("a.rs", "let a = b;\nlet c = a;")]);
        open(&mut ws, "a.rs");
        assert_eq!(
            ws.dispatch(Command::Find { query: "let".to_string(), reverse: false }),
            Outcome::Notice(Notification::info("2/2"))
        );
        assert_eq!(
            ws.dispatch(Command::Find { query: "let".to_string(), reverse: false }),
            Outcome::Notice(Notification::info("1/2"))
        );
        assert_eq!(
            ws.dispatch(Command::Find { query: "zzz".to_string(), reverse: true }),
            Outcome::Notice(Notification::warning("No results"))
        );
    }

    #[test]
    fn test_open_at_line_and_delete_line() {
        let mut ws = workspace(&[("a.rs", "one\ntwo\nthree")]);
        ws.dispatch(Command::OpenAt { path: PathBuf::from("a.rs"), line: 2 });
        assert_eq!(ws.active_file().map(|f| f.buffer.cursor()), Some(Position::new(1, 0)));
        ws.dispatch(Command::DeleteLine);
        assert_eq!(text(&ws), "one\nthree");
    }

    #[test]
    fn test_commands_without_file() {
        let mut ws = workspace(&[]);
        assert_eq!(ws.dispatch(Command::SaveFile), Outcome::Notice(Notification::warning("No file open")));
        assert_eq!(ws.dispatch(Command::Backspace), Outcome::Unhandled);
        assert_eq!(ws.dispatch(Command::CloseTab { mode: CloseMode::Ask }), Outcome::Done);
        assert_eq!(
            ws.dispatch(Command::MoveFile(Direction::Left)),
            Outcome::Notice(Notification::warning("No file open"))
        );
    }

    #[tokio::test]
    async fn test_search_status_for_short_query() {
        let ws = workspace(&[]);
        let report = ws.search_project("x").await;
        assert!(report.matches.is_empty());
        assert_eq!(report.status, "Enter at least 2 characters");
    }

    #[test]
    fn test_indent_uses_tab_size() {
        let mut ws = workspace(&[("a.rs", "x")]);
        open(&mut ws, "a.rs");
        ws.dispatch(Command::Indent);
        assert_eq!(text(&ws), "    x");
    }
}
