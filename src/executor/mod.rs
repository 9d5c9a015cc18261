//! Running submitted code.
//!
//! The grader only needs `execute(source) -> stdout`. How the code is isolated
//! is up to the [`Executor`] implementation; [`ProcessExecutor`] runs it in a
//! child interpreter process with a wall-clock timeout.

mod process;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use process::ProcessExecutor;

/// Why a submission could not produce output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The program ran and failed. Carries the interpreter's error text.
    #[error("{0}")]
    Failed(String),

    #[error("execution timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("output exceeded {0} bytes")]
    OutputLimitExceeded(usize),

    /// The interpreter itself could not be started or waited on.
    #[error("could not run interpreter: {0}")]
    Spawn(String),
}

/// Runs source text and captures what it writes to stdout.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, source: &str) -> Result<String, ExecutionError>;
}

/// Plain functions work as executors, which keeps tests free of subprocesses.
#[async_trait]
impl<F> Executor for F
where
    F: Fn(&str) -> Result<String, ExecutionError> + Send + Sync,
{
    async fn execute(&self, source: &str) -> Result<String, ExecutionError> {
        self(source)
    }
}
