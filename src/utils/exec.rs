//! External command execution utilities.
//!
//! Provides a Builder-based API for running commands with stdin piping and a
//! bounded wait. Writer and reader streams run on their own threads so a
//! filter process that emits output while consuming input cannot deadlock
//! the pipe, whatever the payload size.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let output = Cmd::new("esbuild")
//!     .args(["--minify", "--loader=js"])
//!     .stdin(source)
//!     .timeout(Duration::from_secs(30))
//!     .run()?;
//! ```

use anyhow::{Context, Result, bail};
use std::{
    ffi::{OsStr, OsString},
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    thread,
    time::{Duration, Instant},
};

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stdin_data: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["npx", "esbuild", "--minify"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Bound the total wall-clock wait for the process.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command and return output.
    ///
    /// Errors on spawn failure, pipe failure, timeout, or non-zero exit.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();
        let timeout = self.timeout;
        let stdin_data = self.stdin_data;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Writer thread: the child may block on stdout before draining stdin,
        // so the write must not happen on the reading thread.
        let writer = stdin_data.and_then(|data| {
            child.stdin.take().map(|mut stdin| {
                thread::spawn(move || -> std::io::Result<()> {
                    stdin.write_all(&data)?;
                    Ok(())
                })
            })
        });

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)
                .with_context(|| format!("`{name}` timed out"))?,
            None => child
                .wait()
                .with_context(|| format!("Failed to wait for `{name}`"))?,
        };

        if let Some(handle) = writer {
            let result = handle.join().unwrap_or_else(|_| Ok(()));
            // A closed pipe surfaces through the exit status; only a write
            // error against a successful exit is worth failing on.
            if let Err(e) = result
                && status.success()
            {
                bail!("Failed to write stdin to `{name}`: {e}");
            }
        }

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        let output = Output {
            status,
            stdout,
            stderr,
        };

        if !output.status.success() {
            bail!(
                "`{name}` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Wait for the child, killing it once the deadline passes.
fn wait_with_deadline(
    child: &mut std::process::Child,
    limit: Duration,
) -> Result<std::process::ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("process exceeded {}s limit", limit.as_secs());
        }
        thread::sleep(WAIT_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_roundtrip() {
        let output = Cmd::new("cat").stdin("hello pipeline").run().unwrap();
        assert_eq!(output.stdout, b"hello pipeline");
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let result = Cmd::new("false").run();
        assert!(result.is_err());
    }

    #[test]
    fn test_spawn_failure_is_error() {
        let result = Cmd::new("definitely-not-a-real-binary-7f3a").run();
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_kills_process() {
        let result = Cmd::new("sleep")
            .args(["5"])
            .timeout(Duration::from_millis(100))
            .run();
        assert!(result.is_err());
    }

    #[test]
    fn test_large_stdin_does_not_deadlock() {
        // Larger than any OS pipe buffer; fails without the writer thread
        let payload = "x".repeat(2 * 1024 * 1024);
        let output = Cmd::new("cat").stdin(&payload).run().unwrap();
        assert_eq!(output.stdout.len(), payload.len());
    }
}
