//! Pseudo-terminal allocation
//!
//! Opens a PTY pair, spawns the shell on the slave side and hands back the
//! master as a non-blocking [`PtyDevice`].

use std::io;

use thiserror::Error;

use crate::config::TerminalConfig;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to open pseudo terminal: {0}")]
    Open(#[source] io::Error),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to configure pseudo terminal: {0}")]
    Configure(#[source] io::Error),

    #[error("Failed to resize pseudo terminal: {0}")]
    Resize(#[source] io::Error),

    #[error("Failed to write to PTY: {0}")]
    Write(#[source] io::Error),

    #[error("Session is already running")]
    AlreadyRunning,

    #[error("No async runtime to drive the session")]
    NoRuntime,

    #[error("Pseudo terminals are not supported on this platform")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Program run inside the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ShellCommand {
    /// Command with the terminal environment variables set
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: vec![
                ("TERM".to_string(), "xterm-256color".to_string()),
                ("COLORTERM".to_string(), "truecolor".to_string()),
            ],
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Interactive shell: the configured one, else `$SHELL`, else `/bin/sh`
    pub fn login_shell(config: &TerminalConfig) -> Self {
        let program = Some(config.shell.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/sh".to_string());
        Self::new(program).arg("-i")
    }
}

#[cfg(unix)]
pub use unix::{spawn, PtyDevice};

#[cfg(not(unix))]
pub use fallback::{spawn, PtyDevice};

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::fd::{AsRawFd, OwnedFd};
    use std::os::unix::process::CommandExt;
    use std::path::Path;
    use std::process::{Child, Command, Stdio};
    use std::thread;
    use std::time::Duration;

    use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
    use nix::pty::{openpty, Winsize};

    use super::{PtyError, Result, ShellCommand};

    nix::ioctl_write_ptr_bad!(set_window_size, libc::TIOCSWINSZ, libc::winsize);

    /// Master side of a pseudo terminal
    pub struct PtyDevice {
        master: File,
    }

    impl PtyDevice {
        /// Non-blocking read; `WouldBlock` means no output yet
        pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
            (&self.master).read(buffer)
        }

        /// Write all of `data`, waiting briefly whenever the device is full
        pub fn write(&self, mut data: &[u8]) -> Result<()> {
            while !data.is_empty() {
                match (&self.master).write(data) {
                    Ok(0) => {
                        return Err(PtyError::Write(io::ErrorKind::WriteZero.into()));
                    }
                    Ok(n) => data = &data[n..],
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(1));
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(PtyError::Write(e)),
                }
            }
            Ok(())
        }

        /// Set the window size; the child receives SIGWINCH
        pub fn resize(&self, rows: u16, cols: u16) -> Result<()> {
            let size = window_size(rows, cols);
            // SAFETY: the fd is open for the lifetime of `self` and `size`
            // outlives the call
            unsafe { set_window_size(self.master.as_raw_fd(), &size) }
                .map_err(|e| PtyError::Resize(e.into()))?;
            Ok(())
        }
    }

    fn window_size(rows: u16, cols: u16) -> Winsize {
        Winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        }
    }

    fn configure_master(master: &OwnedFd) -> Result<()> {
        let fd = master.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| PtyError::Configure(e.into()))?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| PtyError::Configure(e.into()))?;
        // The shell must not inherit the master
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(|e| PtyError::Configure(e.into()))?;
        Ok(())
    }

    /// Spawn `command` in `workdir` behind a new `rows` x `cols` terminal
    pub fn spawn(command: &ShellCommand, workdir: &Path, rows: u16, cols: u16) -> Result<(PtyDevice, Child)> {
        let size = window_size(rows.max(1), cols.max(1));
        let pty = openpty(Some(&size), None).map_err(|e| PtyError::Open(e.into()))?;
        configure_master(&pty.master)?;

        let stdin = pty.slave.try_clone().map_err(PtyError::Open)?;
        let stdout = pty.slave.try_clone().map_err(PtyError::Open)?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .current_dir(workdir)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(pty.slave));

        // SAFETY: only async-signal-safe calls between fork and exec
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(io::Error::from)?;
                if libc::ioctl(0, libc::TIOCSCTTY as _, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|source| PtyError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        // Release our copies of the slave so reads fail once the shell exits
        drop(cmd);

        Ok((
            PtyDevice {
                master: File::from(pty.master),
            },
            child,
        ))
    }
}

#[cfg(not(unix))]
mod fallback {
    use std::io;
    use std::path::Path;
    use std::process::Child;

    use super::{PtyError, Result, ShellCommand};

    pub struct PtyDevice;

    impl PtyDevice {
        pub fn read(&self, _buffer: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::Unsupported.into())
        }

        pub fn write(&self, _data: &[u8]) -> Result<()> {
            Err(PtyError::Unsupported)
        }

        pub fn resize(&self, _rows: u16, _cols: u16) -> Result<()> {
            Err(PtyError::Unsupported)
        }
    }

    pub fn spawn(_command: &ShellCommand, _workdir: &Path, _rows: u16, _cols: u16) -> Result<(PtyDevice, Child)> {
        Err(PtyError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_sets_terminal_env() {
        let cmd = ShellCommand::new("/bin/sh").arg("-c").arg("true");
        assert_eq!(cmd.args, vec!["-c", "true"]);
        assert!(cmd.env.contains(&("TERM".to_string(), "xterm-256color".to_string())));
        assert!(cmd.env.contains(&("COLORTERM".to_string(), "truecolor".to_string())));
    }

    #[test]
    fn test_login_shell_prefers_config() {
        let config = TerminalConfig {
            shell: "/usr/bin/zsh".to_string(),
            ..TerminalConfig::default()
        };
        let cmd = ShellCommand::login_shell(&config);
        assert_eq!(cmd.program, "/usr/bin/zsh");
        assert_eq!(cmd.args, vec!["-i"]);
    }

    #[test]
    fn test_login_shell_never_empty() {
        let cmd = ShellCommand::login_shell(&TerminalConfig::default());
        assert!(!cmd.program.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_reports_missing_program() {
        let cmd = ShellCommand::new("/definitely/not/a/shell");
        let err = spawn(&cmd, &std::env::temp_dir(), 24, 80).err();
        assert!(matches!(err, Some(PtyError::Spawn { .. })));
    }
}
