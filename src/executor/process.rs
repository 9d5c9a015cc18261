use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::timeout;

use super::{ExecutionError, Executor};
use crate::config::ExecutorConfig;

/// Runs submissions in a child interpreter process.
///
/// The source is written to the interpreter's stdin. The child gets an empty
/// environment and a fresh temporary working directory, and is killed when
/// the timeout expires. File and network access are not restricted.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let defaults = ExecutorConfig::default();
        Self {
            program: program.into(),
            args,
            timeout: defaults.timeout,
            max_output_bytes: defaults.max_output_bytes,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout,
            max_output_bytes: config.max_output_bytes,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, source: &str) -> Result<String, ExecutionError> {
        let scratch = tempfile::tempdir().map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(scratch.path()).env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", self.program, e)))?;

        let (Some(mut stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(ExecutionError::Spawn("child pipes unavailable".to_string()));
        };

        let limit = self.max_output_bytes;
        let run = async {
            // The interpreter may exit before reading everything
            match stdin.write_all(source.as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
            drop(stdin);

            let (out, err, status) = tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait()
            );
            Ok::<_, std::io::Error>((out?, err?, status?))
        };

        let (stdout, stderr, status) = match timeout(self.timeout, run).await {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => return Err(ExecutionError::Spawn(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                tracing::warn!(timeout = ?self.timeout, "Submission timed out");
                return Err(ExecutionError::Timeout(self.timeout));
            }
        };

        if stdout.truncated {
            return Err(ExecutionError::OutputLimitExceeded(limit));
        }

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr.bytes);
            return Err(ExecutionError::Failed(error_summary(&stderr, status.code())));
        }

        Ok(String::from_utf8_lossy(&stdout.bytes).into_owned())
    }
}

struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Drain `reader` to EOF, keeping at most `limit` bytes.
///
/// Draining past the limit keeps the child from blocking on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Captured> {
    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(bytes.len());
        if n > room {
            truncated = true;
        }
        bytes.extend_from_slice(&chunk[..n.min(room)]);
    }

    Ok(Captured { bytes, truncated })
}

/// The last non-empty stderr line, which for a traceback is the error itself.
fn error_summary(stderr: &str, code: Option<i32>) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match code {
            Some(code) => format!("process exited with status {}", code),
            None => "process terminated by signal".to_string(),
        })
}
