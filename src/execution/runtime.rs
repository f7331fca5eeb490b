//! Interpreter seams and result types.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// What a script wrote while it ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The script raised; carries the captured diagnostic text.
    #[error("{0}")]
    Raised(String),
    #[error("Python environment failed to initialize{}", cause_suffix(.cause))]
    NotReady { cause: Option<String> },
    #[error("Another execution is already in progress")]
    Busy,
    #[error("No Python interpreter found (tried {0})")]
    InterpreterNotFound(String),
    #[error("Failed to start interpreter: {0}")]
    Spawn(String),
    #[error("Failed to install output capture: {0}")]
    Shim(String),
}

fn cause_suffix(cause: &Option<String>) -> String {
    cause.as_ref().map(|c| format!(": {}", c)).unwrap_or_default()
}

/// Result shown in the execution panel.
///
/// An error clears the output. `execution_time_ms` covers the interpreter call
/// only and is zero when nothing was executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub output: String,
    pub error: Option<String>,
    pub execution_time_ms: f64,
}

impl ExecutionResult {
    /// Fold an interpreter outcome into a displayable result.
    pub fn from_outcome(outcome: Result<RunOutput, ExecutionError>, elapsed_ms: f64) -> Self {
        match outcome {
            Ok(RunOutput { stdout, stderr }) => {
                let mut output = stdout;
                if !stderr.is_empty() {
                    if !output.is_empty() && !output.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push_str(&stderr);
                }
                Self {
                    output,
                    error: None,
                    execution_time_ms: elapsed_ms,
                }
            }
            Err(e) => Self {
                output: String::new(),
                error: Some(e.to_string()),
                execution_time_ms: elapsed_ms,
            },
        }
    }

    /// Nothing ran.
    pub fn not_run(error: ExecutionError) -> Self {
        Self::from_outcome(Err(error), 0.0)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A loaded interpreter with its output capture installed.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn execute(&self, source: &str) -> Result<RunOutput, ExecutionError>;

    /// Human readable version, e.g. `Python 3.12.1`.
    fn version(&self) -> &str;
}

/// Brings up an interpreter.
#[async_trait]
pub trait RuntimeLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Interpreter>, ExecutionError>;
}
