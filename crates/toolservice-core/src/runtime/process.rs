//! Running external commands with captured output and an optional deadline
//!
//! Commands are always launched directly from an argument vector, never through
//! a shell, so template names and option values reach the tool verbatim.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Size of each read from a child's stdout/stderr pipe
const READ_CHUNK: usize = 8 * 1024;

/// An external command to run: program, argument vector, working directory and deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments, the current directory and no deadline
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    /// Append a single argument token
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several argument tokens in order
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command in `dir`, which must already exist
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Kill the command if it is still running after `limit` (`None` waits forever)
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Outcome of a command that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Process exit code, `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Failures that prevent a `CommandResult` from being produced
#[derive(Debug, Error)]
pub enum CommandError {
    /// The executable could not be launched at all (missing binary, permission denied)
    #[error("'{program}' failed to start: {source}")]
    Start {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The deadline passed; the process was killed and any partial output is attached
    #[error("'{program}' did not finish within {timeout:?}")]
    Timeout {
        program: String,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    /// Reading the child's pipes or waiting on it failed after a successful start
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    pub fn is_start_failure(&self) -> bool {
        matches!(self, CommandError::Start { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }
}

/// Port for running external commands
///
/// The template service only talks to this trait, so tests can substitute a
/// scripted executor for the real tool.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `spec` and return its exit code and captured output
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError>;
}

#[async_trait]
impl<T> CommandExecutor for std::sync::Arc<T>
where
    T: CommandExecutor + ?Sized,
{
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        (**self).execute(spec).await
    }
}

/// `CommandExecutor` backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, CommandError> {
        let started = Instant::now();
        debug!(
            command = %spec,
            working_dir = ?spec.working_dir(),
            timeout = ?spec.timeout(),
            "spawning command"
        );

        let mut command = Command::new(spec.program());
        command
            .args(spec.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| CommandError::Start {
            program: spec.program().to_string(),
            source,
        })?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Pipes are drained while waiting so a child that fills one cannot stall.
        let outcome = {
            let run = async {
                let (status, (), ()) = tokio::try_join!(
                    child.wait(),
                    drain(stdout_pipe, &mut stdout),
                    drain(stderr_pipe, &mut stderr),
                )?;
                Ok::<_, std::io::Error>(status)
            };
            match spec.timeout() {
                Some(limit) => timeout(limit, run).await.ok(),
                None => Some(run.await),
            }
        };

        let status = match outcome {
            Some(status) => status.map_err(|source| CommandError::Io {
                program: spec.program().to_string(),
                source,
            })?,
            None => {
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "failed to kill timed out command");
                }
                let limit = spec.timeout().unwrap_or_default();
                warn!(command = %spec, timeout = ?limit, "command timed out");
                return Err(CommandError::Timeout {
                    program: spec.program().to_string(),
                    timeout: limit,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                });
            }
        };

        let result = CommandResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        };

        info!(
            command = %spec,
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );

        Ok(result)
    }
}

/// Read a pipe to EOF in fixed chunks; bytes read before cancellation stay in `buf`
async fn drain<R>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder_keeps_argument_order() {
        let spec = CommandSpec::new("dotnet")
            .arg("new")
            .args(["--install", "My.Templates"])
            .current_dir("/tmp/work")
            .with_timeout(Some(Duration::from_secs(5)));

        assert_eq!(spec.program(), "dotnet");
        assert_eq!(spec.arguments(), ["new", "--install", "My.Templates"]);
        assert_eq!(spec.working_dir(), Some(Path::new("/tmp/work")));
        assert_eq!(spec.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(spec.to_string(), "dotnet new --install My.Templates");
    }

    #[tokio::test]
    async fn test_missing_binary_is_start_failure() {
        let spec = CommandSpec::new("no-such-command-toolservice-test");
        let err = ProcessExecutor::new().execute(&spec).await.unwrap_err();

        assert!(err.is_start_failure());
        assert!(err.to_string().contains("'no-such-command-toolservice-test' failed to start"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command_returns_zero() {
        let result = ProcessExecutor::new()
            .execute(&CommandSpec::new("true"))
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(result.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_returns_nonzero() {
        let result = ProcessExecutor::new()
            .execute(&CommandSpec::new("false"))
            .await
            .unwrap();

        assert_ne!(result.exit_code, 0);
        assert!(!result.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_stderr_and_exit_code() {
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo out; echo err >&2; exit 3");
        let result = ProcessExecutor::new().execute(&spec).await.unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_are_not_shell_expanded() {
        let spec = CommandSpec::new("echo").arg("$HOME; ls *");
        let result = ProcessExecutor::new().execute(&spec).await.unwrap();

        assert_eq!(result.stdout, "$HOME; ls *\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sh").args(["-c", "pwd -P"]).current_dir(dir.path());
        let result = ProcessExecutor::new().execute(&spec).await.unwrap();

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(result.stdout.trim(), expected.to_string_lossy());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_output_does_not_stall() {
        let spec = CommandSpec::new("sh").args(["-c", "yes x | head -c 200000"]);
        let result = ProcessExecutor::new().execute(&spec).await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.len(), 200_000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_and_keeps_partial_output() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo partial; sleep 10"])
            .with_timeout(Some(Duration::from_millis(500)));

        let started = Instant::now();
        let err = ProcessExecutor::new().execute(&spec).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.is_timeout());
        match err {
            CommandError::Timeout {
                timeout, stdout, ..
            } => {
                assert_eq!(timeout, Duration::from_millis(500));
                assert_eq!(stdout, "partial\n");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
