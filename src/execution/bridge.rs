//! Interpreter lifecycle and run requests.

use super::{ExecutionError, ExecutionResult, Interpreter, RuntimeLoader};
use crate::messaging::NoticeSender;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lifecycle of the interpreter. Moves forward only, except that a failed
/// bootstrap drops back to `Unloaded` carrying the failure.
pub enum RuntimeState {
    Unloaded { last_error: Option<String> },
    Loading,
    Ready(Arc<dyn Interpreter>),
}

impl RuntimeState {
    pub fn status(&self) -> RuntimeStatus {
        match self {
            Self::Unloaded { .. } => RuntimeStatus::Unloaded,
            Self::Loading => RuntimeStatus::Loading,
            Self::Ready(_) => RuntimeStatus::Ready,
        }
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded { last_error } => f
                .debug_struct("Unloaded")
                .field("last_error", last_error)
                .finish(),
            Self::Loading => f.write_str("Loading"),
            Self::Ready(interpreter) => f.debug_tuple("Ready").field(&interpreter.version()).finish(),
        }
    }
}

/// Payload-free view of [`RuntimeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// How long `run` waits for the interpreter to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 20,
        }
    }
}

fn lock(state: &Mutex<RuntimeState>) -> MutexGuard<'_, RuntimeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the running flag when a run ends.
struct Running<'f>(&'f AtomicBool);

impl<'f> Running<'f> {
    fn acquire(flag: &'f AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the single interpreter of the process.
///
/// Bootstrapping starts as soon as the bridge is built and happens once. A run
/// issued while another is outstanding is refused rather than queued.
pub struct ExecutionBridge {
    state: Arc<Mutex<RuntimeState>>,
    started: AtomicBool,
    running: AtomicBool,
    policy: ReadinessPolicy,
    notices: NoticeSender,
}

impl ExecutionBridge {
    /// Build the bridge and kick off the bootstrap. Must be called inside a
    /// Tokio runtime.
    pub fn start(
        loader: Arc<dyn RuntimeLoader>,
        policy: ReadinessPolicy,
        notices: NoticeSender,
    ) -> Self {
        let bridge = Self {
            state: Arc::new(Mutex::new(RuntimeState::Unloaded { last_error: None })),
            started: AtomicBool::new(false),
            running: AtomicBool::new(false),
            policy,
            notices,
        };
        bridge.begin_loading(loader);
        bridge
    }

    /// Unloaded → Loading, at most once per bridge.
    fn begin_loading(&self, loader: Arc<dyn RuntimeLoader>) {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Interpreter bootstrap already started");
            return;
        }

        *lock(&self.state) = RuntimeState::Loading;
        info!("Loading Python environment");

        let state = Arc::clone(&self.state);
        let notices = self.notices.clone();
        tokio::spawn(async move {
            match loader.load().await {
                Ok(interpreter) => {
                    info!(version = interpreter.version(), "Python environment ready");
                    *lock(&state) = RuntimeState::Ready(interpreter);
                }
                Err(e) => {
                    error!("Python environment failed to load: {}", e);
                    notices.error(format!("Failed to load Python environment: {}", e));
                    *lock(&state) = RuntimeState::Unloaded {
                        last_error: Some(e.to_string()),
                    };
                }
            }
        });
    }

    pub fn status(&self) -> RuntimeStatus {
        lock(&self.state).status()
    }

    pub fn is_loaded(&self) -> bool {
        self.status() == RuntimeStatus::Ready
    }

    pub fn is_loading(&self) -> bool {
        self.status() == RuntimeStatus::Loading
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Version of the loaded interpreter.
    pub fn version(&self) -> Option<String> {
        match &*lock(&self.state) {
            RuntimeState::Ready(interpreter) => Some(interpreter.version().to_string()),
            _ => None,
        }
    }

    /// Interpreter if ready, an error if the bootstrap failed, `None` while loading.
    fn poll_ready(&self) -> Option<Result<Arc<dyn Interpreter>, ExecutionError>> {
        match &*lock(&self.state) {
            RuntimeState::Ready(interpreter) => Some(Ok(Arc::clone(interpreter))),
            RuntimeState::Unloaded {
                last_error: Some(cause),
            } => Some(Err(ExecutionError::NotReady {
                cause: Some(cause.clone()),
            })),
            RuntimeState::Unloaded { last_error: None } | RuntimeState::Loading => None,
        }
    }

    async fn wait_until_ready(&self) -> Result<Arc<dyn Interpreter>, ExecutionError> {
        if let Some(ready) = self.poll_ready() {
            return ready;
        }
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            if let Some(ready) = self.poll_ready() {
                return ready;
            }
            debug!(attempt, "Waiting for Python environment");
        }
        warn!(
            attempts = self.policy.max_attempts,
            "Python environment not ready, giving up"
        );
        Err(ExecutionError::NotReady { cause: None })
    }

    /// Run `source`. Never fails: every problem ends up in
    /// [`ExecutionResult::error`].
    pub async fn run(&self, source: &str) -> ExecutionResult {
        let Some(_running) = Running::acquire(&self.running) else {
            self.notices.warning("Code is already running");
            return ExecutionResult::not_run(ExecutionError::Busy);
        };

        let interpreter = match self.wait_until_ready().await {
            Ok(interpreter) => interpreter,
            Err(e) => {
                self.notices.error(e.to_string());
                return ExecutionResult::not_run(e);
            }
        };

        let started = Instant::now();
        let outcome = interpreter.execute(source).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            Ok(_) => info!(elapsed_ms, "Execution finished"),
            Err(e) => info!(elapsed_ms, "Execution raised: {}", e),
        }
        ExecutionResult::from_outcome(outcome, elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    //! Bridge tests with scripted loaders.

    use super::*;
    use crate::execution::RunOutput;
    use crate::messaging::{NoticeBus, NoticeLevel};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct EchoInterpreter {
        delay_ms: u64,
    }

    #[async_trait]
    impl Interpreter for EchoInterpreter {
        async fn execute(&self, source: &str) -> Result<RunOutput, ExecutionError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if source.contains("raise") {
                return Err(ExecutionError::Raised("RuntimeError: boom".to_string()));
            }
            Ok(RunOutput {
                stdout: format!("ran: {}", source),
                stderr: String::new(),
            })
        }

        fn version(&self) -> &str {
            "Python 3.fake"
        }
    }

    struct ScriptedLoader {
        load_delay_ms: u64,
        run_delay_ms: u64,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedLoader {
        fn ready() -> Arc<Self> {
            Self::build(0, 0, false)
        }

        fn build(load_delay_ms: u64, run_delay_ms: u64, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                load_delay_ms,
                run_delay_ms,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RuntimeLoader for ScriptedLoader {
        async fn load(&self) -> Result<Arc<dyn Interpreter>, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.load_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.load_delay_ms)).await;
            }
            if self.fail {
                return Err(ExecutionError::InterpreterNotFound("python3, python".to_string()));
            }
            Ok(Arc::new(EchoInterpreter {
                delay_ms: self.run_delay_ms,
            }))
        }
    }

    struct NeverLoader;

    #[async_trait]
    impl RuntimeLoader for NeverLoader {
        async fn load(&self) -> Result<Arc<dyn Interpreter>, ExecutionError> {
            std::future::pending().await
        }
    }

    fn fast_policy() -> ReadinessPolicy {
        ReadinessPolicy {
            interval: Duration::from_millis(5),
            max_attempts: 4,
        }
    }

    #[test]
    fn test_default_policy_is_ten_second_ceiling() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.interval * policy.max_attempts, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_starts_loading_immediately() {
        let bridge = ExecutionBridge::start(Arc::new(NeverLoader), fast_policy(), NoticeBus::new().sender());
        assert_eq!(bridge.status(), RuntimeStatus::Loading);
        assert!(bridge.is_loading());
        assert!(!bridge.is_loaded());
    }

    #[tokio::test]
    async fn test_run_waits_for_ready_and_executes() {
        let loader = ScriptedLoader::build(10, 0, false);
        let bridge = ExecutionBridge::start(loader.clone(), fast_policy(), NoticeBus::new().sender());

        let result = bridge.run("print(1)").await;

        assert_eq!(result.output, "ran: print(1)");
        assert!(result.error.is_none());
        assert!(result.execution_time_ms >= 0.0);
        assert_eq!(bridge.status(), RuntimeStatus::Ready);
        assert_eq!(bridge.version().as_deref(), Some("Python 3.fake"));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_happens_once_across_runs() {
        let loader = ScriptedLoader::ready();
        let bridge = ExecutionBridge::start(loader.clone(), fast_policy(), NoticeBus::new().sender());

        bridge.run("a").await;
        bridge.run("b").await;
        bridge.begin_loading(loader.clone());

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.status(), RuntimeStatus::Ready);
    }

    #[tokio::test]
    async fn test_never_ready_returns_init_error_with_zero_time() {
        let bus = NoticeBus::new();
        let mut notices = bus.subscribe();
        let bridge = ExecutionBridge::start(Arc::new(NeverLoader), fast_policy(), bus.sender());

        let result = bridge.run("print(1)").await;

        assert_eq!(result.output, "");
        assert_eq!(result.error.as_deref(), Some("Python environment failed to initialize"));
        assert_eq!(result.execution_time_ms, 0.0);
        assert_eq!(notices.drain()[0].level, NoticeLevel::Error);
        assert!(!bridge.is_running());
    }

    #[tokio::test]
    async fn test_failed_bootstrap_returns_to_unloaded_and_short_circuits() {
        let bus = NoticeBus::new();
        let loader = ScriptedLoader::build(0, 0, true);
        let bridge = ExecutionBridge::start(
            loader,
            ReadinessPolicy {
                interval: Duration::from_millis(5),
                max_attempts: 1000,
            },
            bus.sender(),
        );

        let started = Instant::now();
        let result = bridge.run("print(1)").await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(bridge.status(), RuntimeStatus::Unloaded);
        let error = result.error.unwrap();
        assert!(error.starts_with("Python environment failed to initialize"));
        assert!(error.contains("No Python interpreter found"));
        assert_eq!(result.execution_time_ms, 0.0);
    }

    #[tokio::test]
    async fn test_raised_exception_becomes_error_result() {
        let bridge = ExecutionBridge::start(ScriptedLoader::ready(), fast_policy(), NoticeBus::new().sender());

        let result = bridge.run("raise RuntimeError('boom')").await;

        assert_eq!(result.output, "");
        assert_eq!(result.error.as_deref(), Some("RuntimeError: boom"));
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let bridge = ExecutionBridge::start(
            ScriptedLoader::build(0, 50, false),
            fast_policy(),
            NoticeBus::new().sender(),
        );

        let (first, second) = tokio::join!(bridge.run("slow"), async {
            tokio::time::sleep(Duration::from_millis(15)).await;
            bridge.run("fast").await
        });

        assert_eq!(first.output, "ran: slow");
        assert_eq!(second.error.as_deref(), Some("Another execution is already in progress"));
        assert_eq!(second.execution_time_ms, 0.0);
        assert!(!bridge.is_running());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RuntimeStatus::Unloaded.to_string(), "unloaded");
        assert_eq!(RuntimeStatus::Loading.to_string(), "loading");
        assert_eq!(RuntimeStatus::Ready.to_string(), "ready");
    }
}
