//! Sandboxed script execution.
//!
//! ```text
//! ExecutionBridge ──start──► RuntimeLoader::load (spawned once)
//!        │                          │
//!        │ run(source)              ▼
//!        └──── wait until ready ──► Interpreter::execute ──► ExecutionResult
//! ```

mod bridge;
mod python;
mod runtime;

pub use bridge::{ExecutionBridge, ReadinessPolicy, RuntimeState, RuntimeStatus};
pub use python::{PythonInterpreter, PythonLoader};
pub use runtime::{ExecutionError, ExecutionResult, Interpreter, RunOutput, RuntimeLoader};
