//! cli-ide - a terminal-resident IDE
//!
//! Tabbed editor panes that split side by side or stacked, multi-cursor
//! editing, in-file find, project search and an embedded shell, all inside
//! one terminal.
//!
//! # Quick Start
//!
//! ```text
//! cli-ide                    # Open the current directory
//! cli-ide ~/src/app main.rs  # Open a project and a file in it
//! cli-ide --shell /bin/zsh   # Use a specific shell in the terminal panel
//! ```
//!
//! # Keybindings
//!
//! | Key | Action |
//! |-----|--------|
//! | Ctrl+S | Save |
//! | Ctrl+W | Close tab |
//! | Ctrl+O | Open file |
//! | Alt+1..9, Alt+0 | Go to tab, last tab |
//! | Ctrl+PgUp/PgDn | Previous/next tab |
//! | Ctrl+Shift+Arrow | Move file to the pane in that direction |
//! | Alt+\ , Alt+- , Alt+x | Split side by side, stacked, close split |
//! | F6 | Next pane |
//! | Ctrl+F, F3, Shift+F3 | Find, find next, find previous |
//! | Ctrl+G | Search project |
//! | Ctrl+L | Go to line |
//! | Ctrl+I / Ctrl+N | Select next occurrence |
//! | Enter, Esc | Apply / cancel multi-select |
//! | Ctrl+D | Delete line |
//! | Ctrl+T, Ctrl+E | Focus terminal, focus editor |
//! | Ctrl+B | Show or hide the terminal |
//! | Ctrl+Q | Quit |
//!
//! Closing a tab or split with unsaved changes asks first: Ctrl+S saves and
//! closes, the same close key again discards, any other key keeps it open.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli_ide::config::{self, Config};
use cli_ide::core::{PtySession, ReadSettings, ShellCommand};
use cli_ide::search::SearchReport;
use cli_ide::ui::{
    terminal_escape, Action, EditorKeymap, Focus, KeyMapper, ListEvent, Prompt, PromptEvent, PromptKind, Renderer,
    ResultList, ScreenLayout, View,
};
use cli_ide::{CloseMode, Command, Notification, Outcome, Workspace};

/// Input poll interval; also bounds how stale terminal output can look
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A terminal-resident IDE
#[derive(Parser, Debug)]
#[command(name = "cli-ide", version, about)]
struct Args {
    /// Project directory (a file here opens it and uses its directory)
    root: Option<PathBuf>,

    /// Files to open, relative to the project
    files: Vec<PathBuf>,

    /// Shell for the terminal panel
    #[arg(short, long)]
    shell: Option<String>,

    /// Log filter, e.g. `debug` or `cli_ide::core=trace`; overrides CLI_IDE_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Start with the terminal panel hidden
    #[arg(long)]
    no_terminal: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let (root, mut files) = resolve_root(args.root.as_deref())?;
    files.extend(args.files.iter().cloned());

    let mut config = Config::load(&root);
    if let Some(shell) = &args.shell {
        config.terminal.shell = shell.clone();
    }
    info!(root = %root.display(), theme = %config.editor.theme, "cli-ide starting");

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let _guard = runtime.enter();

    let mut host = Host::new(Workspace::open(&root, config), runtime.handle().clone());
    for file in files {
        host.run(Command::OpenFile(file));
    }
    if !args.no_terminal {
        host.terminal_visible = true;
        host.start_terminal();
    }

    host.renderer.init().context("Failed to initialize terminal")?;
    let result = host.run_loop();
    if let Err(e) = host.renderer.cleanup() {
        warn!(error = %e, "terminal cleanup failed");
    }

    if let Some(mut session) = host.terminal.take() {
        runtime.block_on(session.shutdown());
    }
    info!("cli-ide exiting");
    result
}

/// Log to `<config dir>/cli-ide.log`; never to the screen we draw on
fn init_logging(level: Option<&str>) {
    let Some(dir) = config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("cli-ide.log"))
    else {
        return;
    };

    let filter = match level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_env("CLI_IDE_LOG").ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Project root plus any file named in its place
fn resolve_root(arg: Option<&Path>) -> anyhow::Result<(PathBuf, Vec<PathBuf>)> {
    let path = match arg {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Cannot read current directory")?,
    };
    let path = path
        .canonicalize()
        .with_context(|| format!("Cannot open {}", path.display()))?;

    if path.is_file() {
        let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
        Ok((root, vec![path]))
    } else {
        Ok((path, Vec::new()))
    }
}

/// The same close request with another `mode`
fn with_close_mode(request: &Command, mode: CloseMode) -> Command {
    match request {
        Command::CloseSplit { .. } => Command::CloseSplit { mode },
        _ => Command::CloseTab { mode },
    }
}

/// The running program: workspace, terminal and everything on screen
struct Host {
    workspace: Workspace,
    runtime: tokio::runtime::Handle,
    renderer: Renderer,
    terminal: Option<PtySession>,
    terminal_visible: bool,
    focus: Focus,
    notification: Option<Notification>,
    prompt: Option<Prompt>,
    results: Option<ResultList>,
    search: Option<JoinHandle<SearchReport>>,
    last_find: Option<String>,
    /// Close request waiting for save or discard
    pending_close: Option<Command>,
    quit_armed: bool,
    quit: bool,
}

impl Host {
    fn new(workspace: Workspace, runtime: tokio::runtime::Handle) -> Self {
        let renderer = Renderer::new(workspace.config().palette());
        Self {
            workspace,
            runtime,
            renderer,
            terminal: None,
            terminal_visible: false,
            focus: Focus::Editor,
            notification: None,
            prompt: None,
            results: None,
            search: None,
            last_find: None,
            pending_close: None,
            quit_armed: false,
            quit: false,
        }
    }

    fn run_loop(&mut self) -> anyhow::Result<()> {
        let mut stdout = io::BufWriter::with_capacity(65536, io::stdout());
        let mut dirty = true;
        self.fit_terminal()?;

        while !self.quit {
            if let Some(session) = &mut self.terminal {
                if session.process_output() {
                    dirty = true;
                    if !session.is_running() {
                        info!("shell exited");
                        self.notify(Notification::warning("Shell exited; Ctrl+T starts a new one"));
                        if self.focus == Focus::Terminal {
                            self.focus = Focus::Editor;
                        }
                    }
                }
            }
            dirty |= self.poll_search();

            if event::poll(FRAME_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Key(_) => continue,
                    Event::Paste(text) => self.handle_paste(&text),
                    Event::Resize(..) => self.fit_terminal()?,
                    _ => continue,
                }
                dirty = true;
            }

            if dirty {
                self.draw(&mut stdout)?;
                dirty = false;
            }
        }
        Ok(())
    }

    fn draw(&mut self, out: &mut impl io::Write) -> anyhow::Result<()> {
        let size = Renderer::size()?;
        let terminal = self
            .terminal
            .as_ref()
            .filter(|_| self.terminal_visible)
            .map(|session| &session.screen);
        let view = View {
            editor: self.workspace.editor(),
            terminal,
            focus: self.focus,
            notification: self.notification.as_ref(),
            prompt: self.prompt.as_ref(),
            results: self.results.as_ref(),
            root: self.workspace.root(),
            show_line_numbers: self.workspace.config().editor.show_line_numbers,
        };
        self.renderer.draw(out, &view, size)?;
        Ok(())
    }

    /// Size the shell to the panel the current layout gives it
    fn fit_terminal(&mut self) -> anyhow::Result<()> {
        let (cols, rows) = Renderer::size()?;
        let requested = self.workspace.config().terminal.height;
        let layout = ScreenLayout::compute(cols, rows, self.workspace.editor().split_orientation(), Some(requested));
        if let (Some(session), Some((rows, cols))) = (&mut self.terminal, layout.terminal_grid_size()) {
            if session.size() != (rows, cols) {
                session.resize(rows, cols);
            }
        }
        Ok(())
    }

    fn start_terminal(&mut self) {
        let config = &self.workspace.config().terminal;
        let command = ShellCommand::login_shell(config);
        let (rows, cols) = match Renderer::size() {
            Ok((cols, rows)) => ScreenLayout::compute(cols, rows, self.workspace.editor().split_orientation(), Some(config.height))
                .terminal_grid_size()
                .unwrap_or((config.height, 80)),
            Err(_) => (config.height, 80),
        };

        let mut session = PtySession::new(rows, cols, ReadSettings::from(config));
        let _guard = self.runtime.enter();
        match session.start(&command, self.workspace.root()) {
            Ok(()) => self.terminal = Some(session),
            Err(e) => {
                error!(error = %e, program = %command.program, "terminal unavailable");
                self.notify(Notification::error(format!("Terminal unavailable: {}", e)));
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.notification = None;

        if let Some(prompt) = &mut self.prompt {
            match prompt.handle_key(&key) {
                PromptEvent::Submit(input) => {
                    let kind = prompt.kind;
                    self.prompt = None;
                    self.submit_prompt(kind, input);
                }
                PromptEvent::Cancel => self.prompt = None,
                PromptEvent::Edited | PromptEvent::Ignored => {}
            }
            return;
        }

        if let Some(results) = &mut self.results {
            match results.handle_key(&key) {
                ListEvent::Open(path, line) => {
                    self.results = None;
                    self.run(Command::OpenAt { path, line });
                }
                ListEvent::Close => self.results = None,
                ListEvent::Moved | ListEvent::Ignored => {}
            }
            return;
        }

        if self.focus == Focus::Terminal {
            if let Some(action) = terminal_escape(&key) {
                self.perform(action);
            } else if let Some(session) = &self.terminal {
                if let Some(bytes) = KeyMapper::map(&key, &session.screen.modes) {
                    session.send_bytes(&bytes);
                }
            }
            return;
        }

        if let Some(action) = EditorKeymap::map(&key) {
            self.perform(action);
        }
    }

    fn handle_paste(&mut self, text: &str) {
        if self.focus == Focus::Terminal {
            if let Some(session) = &self.terminal {
                session.send_bytes(&KeyMapper::paste(text, &session.screen.modes));
                return;
            }
        }
        self.run(Command::InsertText(text.replace("\r\n", "\n")));
    }

    fn perform(&mut self, action: Action) {
        let pending_close = self.pending_close.take();
        if action != Action::Quit {
            self.quit_armed = false;
        }

        match action {
            Action::Run(Command::SaveFile) if pending_close.is_some() => {
                if let Some(request) = pending_close {
                    self.close(with_close_mode(&request, CloseMode::Save));
                }
            }
            Action::Run(request @ (Command::CloseTab { .. } | Command::CloseSplit { .. })) => {
                if pending_close.as_ref() == Some(&request) {
                    self.close(with_close_mode(&request, CloseMode::Discard));
                } else {
                    self.close(request);
                }
            }
            Action::Run(command) => self.run(command),
            Action::Either { first, fallback } => match self.workspace.dispatch(first) {
                Outcome::Unhandled => self.run(fallback),
                outcome => self.handle_outcome(outcome),
            },
            Action::Prompt(kind) => {
                self.prompt = Some(match (kind, &self.last_find) {
                    (PromptKind::Find, Some(query)) => Prompt::with_text(kind, query),
                    _ => Prompt::new(kind),
                });
            }
            Action::FindAgain { reverse } => match self.last_find.clone() {
                Some(query) => self.run(Command::Find { query, reverse }),
                None => self.prompt = Some(Prompt::new(PromptKind::Find)),
            },
            Action::FocusTerminal => {
                self.terminal_visible = true;
                if !self.terminal.as_ref().map_or(false, PtySession::is_running) {
                    if let Some(mut old) = self.terminal.take() {
                        self.runtime.block_on(old.shutdown());
                    }
                    self.start_terminal();
                }
                if self.terminal.is_some() {
                    self.focus = Focus::Terminal;
                }
            }
            Action::FocusEditor => self.focus = Focus::Editor,
            Action::ToggleTerminal => {
                self.terminal_visible = !self.terminal_visible;
                if !self.terminal_visible {
                    self.focus = Focus::Editor;
                }
            }
            Action::Quit => {
                if self.workspace.has_unsaved_changes() && !self.quit_armed {
                    self.quit_armed = true;
                    self.notify(Notification::warning("Unsaved changes; press Ctrl+Q again to quit"));
                } else {
                    self.quit = true;
                }
            }
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) {
        match kind {
            PromptKind::Find => {
                if input.is_empty() {
                    return;
                }
                self.last_find = Some(input.clone());
                self.run(Command::Find {
                    query: input,
                    reverse: false,
                });
            }
            PromptKind::ProjectSearch => {
                if let Some(previous) = self.search.take() {
                    previous.abort();
                }
                self.search = Some(self.runtime.spawn(self.workspace.search_project(&input)));
                self.notify(Notification::info(format!("Searching for {}...", input)));
            }
            PromptKind::GotoLine => {
                if let Ok(line) = input.parse() {
                    self.run(Command::GotoLine(line));
                }
            }
            PromptKind::OpenFile => {
                if !input.is_empty() {
                    self.run(Command::OpenFile(PathBuf::from(input)));
                }
            }
        }
    }

    /// Pick up a finished project search; returns whether anything changed
    fn poll_search(&mut self) -> bool {
        if !self.search.as_ref().map_or(false, JoinHandle::is_finished) {
            return false;
        }
        let Some(handle) = self.search.take() else {
            return false;
        };
        match self.runtime.block_on(handle) {
            Ok(report) if report.matches.is_empty() => self.notify(Notification::warning(report.status)),
            Ok(report) => self.results = Some(ResultList::new(report)),
            Err(e) => warn!(error = %e, "search task failed"),
        }
        true
    }

    /// Run a close request, remembering it if it needs confirmation
    fn close(&mut self, request: Command) {
        let outcome = self.workspace.dispatch(request.clone());
        let confirm = matches!(outcome, Outcome::ConfirmClose(_));
        self.handle_outcome(outcome);
        if confirm {
            self.pending_close = Some(request);
        }
    }

    fn run(&mut self, command: Command) {
        let outcome = self.workspace.dispatch(command);
        self.handle_outcome(outcome);
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done | Outcome::Unhandled => {}
            Outcome::Notice(notification) => self.notify(notification),
            Outcome::ConfirmClose(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.notify(Notification::warning(format!(
                    "{} has unsaved changes: Ctrl+S save, close again to discard",
                    name
                )));
            }
        }
        // A split may have opened or closed
        if let Err(e) = self.fit_terminal() {
            warn!(error = %e, "cannot read terminal size");
        }
    }
}
