//! Deadline-bounded external command execution.
//!
//! Every external tool (ffprobe, ffmpeg, ssh, scp) runs through this
//! runner. Output is captured on reader threads while the child is polled
//! against a deadline; on expiry the child is killed and reaped and the
//! invocation surfaces as a timeout error, eligible for whatever fallback
//! chain the calling stage has.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Poll interval while waiting on a child process.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How many trailing stderr lines to keep for diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to start {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exceeded the {limit_secs}s deadline and was killed")]
    TimedOut { tool: String, limit_secs: u64 },

    #[error("I/O error while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or -1 when the process was terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trailing stderr lines, for error messages.
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

/// Runs external commands with a per-invocation deadline.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is NOT an error here; callers inspect
    /// `CommandOutput::success()` and decide. Spawn failures and deadline
    /// expiry are errors.
    pub fn run(&self, program: &str, args: &[&str]) -> RunnerResult<CommandOutput> {
        tracing::debug!("Running: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                tool: program.to_string(),
                source: e,
            })?;

        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        let status = self.wait_with_deadline(&mut child, program)?;

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        let exit_code = status;
        if exit_code != 0 {
            tracing::debug!("{} exited with code {}", program, exit_code);
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    /// Poll the child until it exits or the deadline passes.
    fn wait_with_deadline(&self, child: &mut Child, tool: &str) -> RunnerResult<i32> {
        let deadline = Instant::now() + self.timeout;

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status.code().unwrap_or(-1)),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(
                            "{} exceeded {}s deadline, killing",
                            tool,
                            self.timeout.as_secs()
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RunnerError::TimedOut {
                            tool: tool.to_string(),
                            limit_secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunnerError::Io {
                        tool: tool.to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}

/// Drain a child pipe on its own thread to avoid blocking the child on a
/// full pipe buffer.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let mut bytes = Vec::new();
            if pipe.read_to_end(&mut bytes).is_ok() {
                buf = String::from_utf8_lossy(&bytes).to_string();
            }
        }
        buf
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> CommandRunner {
        CommandRunner::new(Duration::from_secs(10))
    }

    #[test]
    fn captures_stdout() {
        let output = runner().run("echo", &["hello"]).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_not_an_error() {
        let output = runner().run("sh", &["-c", "exit 3"]).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let result = runner().run("nonexistent_tool_12345", &[]);
        assert!(matches!(result, Err(RunnerError::SpawnFailed { .. })));
    }

    #[test]
    fn hung_process_is_killed_at_deadline() {
        let runner = CommandRunner::new(Duration::from_millis(300));
        let start = Instant::now();
        let result = runner.run("sleep", &["30"]);
        assert!(matches!(result, Err(RunnerError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: (0..40).map(|i| format!("line {}\n", i)).collect(),
            exit_code: 1,
        };
        let tail = output.stderr_tail();
        assert!(tail.contains("line 39"));
        assert!(!tail.contains("line 0\n"));
    }
}
