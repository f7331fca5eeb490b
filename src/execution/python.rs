//! Local CPython runtime driven through a capture shim.

use super::{ExecutionError, Interpreter, RunOutput, RuntimeLoader};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Cap on captured output per stream.
const MAX_OUTPUT_CHARS: usize = 200_000;

/// Exit status the shim uses when the script raised.
const RAISED_EXIT_CODE: i32 = 3;

const SHIM_FILE: &str = "capture.py";

/// Reads the script from stdin, runs it with stdout and stderr redirected into
/// buffers, then replays both. A traceback goes to the captured stderr with
/// the shim's own frame dropped.
const CAPTURE_SHIM: &str = r#"import contextlib
import io
import sys
import traceback

source = sys.stdin.read()
out, err = io.StringIO(), io.StringIO()
raised = False
with contextlib.redirect_stdout(out), contextlib.redirect_stderr(err):
    try:
        exec(compile(source, "<editor>", "exec"), {"__name__": "__main__"})
    except SystemExit as exc:
        if exc.code not in (None, 0):
            raised = True
            print("SystemExit: %s" % exc.code, file=sys.stderr)
    except BaseException:
        raised = True
        etype, value, tb = sys.exc_info()
        traceback.print_exception(etype, value, tb.tb_next)
sys.__stdout__.write(out.getvalue())
sys.__stderr__.write(err.getvalue())
sys.__stdout__.flush()
sys.__stderr__.flush()
sys.exit(3 if raised else 0)
"#;

const VERSION_PROBE: &str = "import sys; print('%d.%d.%d' % sys.version_info[:3])";

/// Truncate output to a maximum character limit, cutting at line boundaries.
fn truncate_output(output: String, max_chars: usize) -> String {
    let total = output.chars().count();
    if total <= max_chars {
        return output;
    }

    let mut truncated: String = output.chars().take(max_chars).collect();
    if let Some(last_newline) = truncated.rfind('\n') {
        truncated.truncate(last_newline);
    }
    truncated.push_str(&format!(
        "\n\n[OUTPUT TRUNCATED: {} chars exceeded {} char limit]",
        total, max_chars
    ));
    truncated
}

/// Finds a `python3` on PATH, checks it, and installs the capture shim.
pub struct PythonLoader {
    candidates: Vec<String>,
    runtime_dir: PathBuf,
}

impl PythonLoader {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec!["python3".to_string(), "python".to_string()],
            runtime_dir: runtime_dir.into(),
        }
    }

    /// Try only `program`.
    pub fn with_interpreter(mut self, program: impl Into<String>) -> Self {
        self.candidates = vec![program.into()];
        self
    }

    fn locate(&self) -> Result<PathBuf, ExecutionError> {
        self.candidates
            .iter()
            .find_map(|candidate| which::which(candidate).ok())
            .ok_or_else(|| ExecutionError::InterpreterNotFound(self.candidates.join(", ")))
    }

    async fn probe_version(program: &Path) -> Result<String, ExecutionError> {
        let output = Command::new(program)
            .arg("-c")
            .arg(VERSION_PROBE)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", program.display(), e)))?;

        if !output.status.success() {
            return Err(ExecutionError::Spawn(format!(
                "{} exited with {}",
                program.display(),
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !version.starts_with("3.") {
            return Err(ExecutionError::Spawn(format!(
                "Python 3 is required, {} reports {}",
                program.display(),
                version
            )));
        }
        Ok(version)
    }

    async fn install_shim(&self) -> Result<PathBuf, ExecutionError> {
        tokio::fs::create_dir_all(&self.runtime_dir)
            .await
            .map_err(|e| ExecutionError::Shim(e.to_string()))?;
        let path = self.runtime_dir.join(SHIM_FILE);
        tokio::fs::write(&path, CAPTURE_SHIM)
            .await
            .map_err(|e| ExecutionError::Shim(e.to_string()))?;
        Ok(path)
    }
}

#[async_trait]
impl RuntimeLoader for PythonLoader {
    async fn load(&self) -> Result<Arc<dyn Interpreter>, ExecutionError> {
        let program = self.locate()?;
        debug!(program = %program.display(), "Found Python interpreter");

        let version = Self::probe_version(&program).await?;
        let shim = self.install_shim().await?;
        info!(%version, shim = %shim.display(), "Python runtime installed");

        Ok(Arc::new(PythonInterpreter {
            program,
            shim,
            version: format!("Python {}", version),
        }))
    }
}

/// One short-lived `python3` process per run.
pub struct PythonInterpreter {
    program: PathBuf,
    shim: PathBuf,
    version: String,
}

#[async_trait]
impl Interpreter for PythonInterpreter {
    async fn execute(&self, source: &str) -> Result<RunOutput, ExecutionError> {
        let mut child = Command::new(&self.program)
            .arg("-u")
            .arg(&self.shim)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .await
                .map_err(|e| ExecutionError::Spawn(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        let stdout = truncate_output(String::from_utf8_lossy(&output.stdout).into_owned(), MAX_OUTPUT_CHARS);
        let stderr = truncate_output(String::from_utf8_lossy(&output.stderr).into_owned(), MAX_OUTPUT_CHARS);

        match output.status.code() {
            Some(0) => Ok(RunOutput { stdout, stderr }),
            Some(RAISED_EXIT_CODE) => {
                let diagnostic = stderr.trim_end();
                if diagnostic.is_empty() {
                    Err(ExecutionError::Raised("Script raised an exception".to_string()))
                } else {
                    Err(ExecutionError::Raised(diagnostic.to_string()))
                }
            }
            _ => Err(ExecutionError::Raised(format!(
                "{}\nInterpreter exited with {}",
                stderr.trim_end(),
                output.status
            ))),
        }
    }

    fn version(&self) -> &str {
        &self.version
    }
}
