//! Session management
//!
//! A [`PtySession`] owns one shell process, its PTY and the screen the
//! shell draws on. Output is read by a timer-driven tokio task and handed to
//! the UI thread over a channel; only the UI thread touches the screen.

use std::io;
use std::path::Path;
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::pty::{self, PtyDevice, PtyError, ShellCommand};
use super::term::{AnsiDecoder, ScreenBuffer};
use crate::config::TerminalConfig;

/// Session events
#[derive(Debug)]
pub enum SessionEvent {
    /// Raw output from the shell
    Output(Vec<u8>),
    /// The PTY closed; no more output will arrive
    Exited,
}

/// Read loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSettings {
    pub poll_interval: Duration,
    pub chunk_size: usize,
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            chunk_size: 65536,
        }
    }
}

impl From<&TerminalConfig> for ReadSettings {
    fn from(config: &TerminalConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            chunk_size: config.read_chunk_size.max(1),
        }
    }
}

/// A shell behind a pseudo terminal
pub struct PtySession {
    /// Terminal screen
    pub screen: ScreenBuffer,
    decoder: AnsiDecoder,
    device: Option<Arc<PtyDevice>>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    events: Option<UnboundedReceiver<SessionEvent>>,
    running: Arc<AtomicBool>,
    settings: ReadSettings,
}

impl PtySession {
    pub fn new(rows: u16, cols: u16, settings: ReadSettings) -> Self {
        Self {
            screen: ScreenBuffer::new(cols, rows),
            decoder: AnsiDecoder::new(),
            device: None,
            child: None,
            reader: None,
            events: None,
            running: Arc::new(AtomicBool::new(false)),
            settings,
        }
    }

    /// Spawn `command` in `workdir` and start the read loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, command: &ShellCommand, workdir: &Path) -> Result<(), PtyError> {
        if self.device.is_some() || self.child.is_some() {
            return Err(PtyError::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PtyError::NoRuntime)?;

        let (device, child) = pty::spawn(command, workdir, self.screen.rows(), self.screen.cols())?;
        let device = Arc::new(device);
        let (tx, rx) = mpsc::unbounded_channel();

        self.running.store(true, Ordering::SeqCst);
        self.reader = Some(runtime.spawn(read_loop(
            device.clone(),
            tx,
            self.running.clone(),
            self.settings,
        )));
        info!(pid = child.id(), program = %command.program, workdir = %workdir.display(), "shell started");

        self.device = Some(device);
        self.child = Some(child);
        self.events = Some(rx);
        Ok(())
    }

    /// Whether the shell is still producing output
    pub fn is_running(&self) -> bool {
        self.device.is_some() && self.running.load(Ordering::SeqCst)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Current `(rows, cols)`
    pub fn size(&self) -> (u16, u16) {
        (self.screen.rows(), self.screen.cols())
    }

    /// Terminal title set by the shell
    pub fn title(&self) -> &str {
        &self.screen.title
    }

    /// Apply everything the read loop delivered since the last call.
    ///
    /// Returns whether the screen needs a redraw.
    pub fn process_output(&mut self) -> bool {
        let Some(events) = &mut self.events else {
            return false;
        };

        let mut chunks = Vec::new();
        let mut exited = false;
        loop {
            match events.try_recv() {
                Ok(SessionEvent::Output(data)) => chunks.push(data),
                Ok(SessionEvent::Exited) => exited = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    exited = true;
                    break;
                }
            }
        }

        let mut refresh = false;
        for data in chunks {
            refresh |= self.feed(&data);
        }
        if exited && self.events.take().is_some() {
            info!(pid = ?self.pid(), "shell output closed");
            self.running.store(false, Ordering::SeqCst);
            refresh = true;
        }
        refresh
    }

    /// Decode `bytes` onto the screen, answering any terminal queries
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        for cmd in self.decoder.feed(bytes) {
            if let Some(response) = self.screen.apply(cmd) {
                self.send_bytes(&response.to_bytes());
            }
        }
        !bytes.is_empty()
    }

    /// Write input to the shell. Failures are dropped: a failing write
    /// means the session is going away.
    pub fn send_bytes(&self, data: &[u8]) {
        if let Some(device) = &self.device {
            if let Err(e) = device.write(data) {
                debug!(error = %e, "dropping terminal input");
            }
        }
    }

    /// Resize the screen and tell the shell
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.screen.resize(cols, rows);
        if let Some(device) = &self.device {
            let (rows, cols) = self.size();
            if let Err(e) = device.resize(rows, cols) {
                warn!(error = %e, "terminal resize not propagated");
            }
        }
    }

    /// Stop the read loop, close the PTY, then kill and reap the shell.
    ///
    /// Safe to call more than once and after the shell has exited.
    pub async fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(reader) = self.reader.take() {
            reader.abort();
            let _ = reader.await;
        }
        self.events = None;
        self.device = None;

        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            if let Err(e) = child.kill() {
                debug!(pid, error = %e, "kill failed, shell already gone");
            }
            match tokio::task::spawn_blocking(move || child.wait()).await {
                Ok(Ok(status)) => info!(pid, %status, "shell reaped"),
                Ok(Err(e)) => warn!(pid, error = %e, "failed to reap shell"),
                Err(e) => warn!(pid, error = %e, "reaper task failed"),
            }
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.events = None;
        self.device = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

async fn read_loop(
    device: Arc<PtyDevice>,
    tx: UnboundedSender<SessionEvent>,
    running: Arc<AtomicBool>,
    settings: ReadSettings,
) {
    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut buffer = vec![0u8; settings.chunk_size];

    while running.load(Ordering::SeqCst) {
        ticker.tick().await;
        match device.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(SessionEvent::Output(buffer[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {}
            Err(e) => {
                // EIO once the shell and its children have exited
                debug!(error = %e, "pty read ended");
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    let _ = tx.send(SessionEvent::Exited);
}
