//! Interactive REPL implementation.
//!
//! This module provides the main REPL (Read-Eval-Print Loop). It handles:
//!
//! - User input via reedline (readline alternative)
//! - Command dispatching (slash commands like /help, /run)
//! - Prompt handling (plain input asks the model for code)
//! - Rendering of notices queued by the core components

mod commands;
mod prompt;

pub use commands::{show_help, CommandResult, SAMPLE_PROMPTS};

use crate::auth::CredentialStore;
use crate::cli::completion::{create_reedline, PadCompleter, PadPrompt};
use crate::completion::{CompletionClient, CompletionConfig, HttpTransport, Transport};
use crate::config::{Settings, XdgDirs, DEFAULT_ENDPOINT};
use crate::db::Database;
use crate::editor::EditorBuffer;
use crate::execution::{ExecutionBridge, PythonLoader, ReadinessPolicy, RuntimeLoader};
use crate::messaging::{
    NoticeBus, NoticeReceiver, NoticeSender, Spinner, SpinnerHandle, TerminalRenderer,
};
use crate::session::ChatSession;
use reedline::{FileBackedHistory, Signal};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// REPL state.
pub struct Repl<'a> {
    settings: Settings<'a>,
    credentials: &'a CredentialStore<'a>,
    client: CompletionClient<'a>,
    bridge: ExecutionBridge,
    editor: EditorBuffer,
    chat: ChatSession,
    renderer: TerminalRenderer,
    notices: NoticeSender,
    inbox: NoticeReceiver,
    history_path: Option<PathBuf>,
    show_spinner: bool,
    /// Most recent inputs and outputs, for `/copy`.
    last_prompt: Option<String>,
    last_response: Option<String>,
    last_output: Option<String>,
}

impl<'a> Repl<'a> {
    /// Assemble a REPL from its parts. Starts the interpreter bootstrap, so
    /// this must run inside a Tokio runtime.
    pub fn new(
        db: &'a Database,
        credentials: &'a CredentialStore<'a>,
        bus: &NoticeBus,
        transport: Arc<dyn Transport>,
        loader: Arc<dyn RuntimeLoader>,
    ) -> Self {
        let settings = Settings::new(db);
        let notices = bus.sender();
        let inbox = bus.subscribe();
        let client = CompletionClient::new(
            credentials,
            transport,
            CompletionConfig::from_settings(&settings),
            notices.clone(),
        );
        let bridge = ExecutionBridge::start(loader, ReadinessPolicy::default(), notices.clone());
        let renderer = TerminalRenderer::new(settings.theme());

        Self {
            settings,
            credentials,
            client,
            bridge,
            editor: EditorBuffer::new(),
            chat: ChatSession::new(),
            renderer,
            notices,
            inbox,
            history_path: None,
            show_spinner: std::io::stdout().is_terminal(),
            last_prompt: None,
            last_response: None,
            last_output: None,
        }
    }

    /// REPL wired to the configured endpoint and the local Python runtime.
    pub fn open(
        db: &'a Database,
        credentials: &'a CredentialStore<'a>,
        bus: &NoticeBus,
        dirs: &XdgDirs,
    ) -> anyhow::Result<Self> {
        let endpoint = Settings::new(db).endpoint();
        let (transport, rejected) = match HttpTransport::new(&endpoint) {
            Ok(transport) => (transport, None),
            Err(e) => {
                warn!("Configured endpoint rejected, using default: {}", e);
                (HttpTransport::new(DEFAULT_ENDPOINT)?, Some(e))
            }
        };
        let loader = PythonLoader::new(dirs.runtime_dir());

        // The inbox only sees notices sent after it subscribes.
        let mut repl = Self::new(db, credentials, bus, Arc::new(transport), Arc::new(loader));
        if let Some(e) = rejected {
            repl.notices
                .warning(format!("{}. Falling back to {}", e, DEFAULT_ENDPOINT));
        }
        repl.history_path = Some(dirs.history_file());
        Ok(repl)
    }

    /// Use a model for this session without persisting it.
    pub fn with_model(mut self, model: &str) -> Self {
        self.client.set_model(model);
        self
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn bridge(&self) -> &ExecutionBridge {
        &self.bridge
    }

    /// Print every queued notice to stderr.
    pub fn flush_notices(&mut self) {
        let mut err = std::io::stderr();
        for notice in self.inbox.drain() {
            let _ = self.renderer.render_notice(&mut err, &notice);
        }
    }

    fn start_spinner(&self, message: impl Into<String>) -> Option<SpinnerHandle> {
        self.show_spinner
            .then(|| Spinner::new(message, self.renderer.accent_color()).start())
    }

    async fn stop_spinner(handle: Option<SpinnerHandle>) {
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut line_editor = create_reedline(PadCompleter::new());
        if let Some(history_path) = &self.history_path {
            if let Some(parent) = history_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(h) = FileBackedHistory::with_file(500, history_path.clone()) {
                line_editor = line_editor.with_history(Box::new(h));
            }
        }

        loop {
            self.flush_notices();
            let prompt = PadPrompt::new(&self.client.config().model, self.bridge.is_loaded());

            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match self.handle_input(line).await {
                        Ok(true) => {
                            println!("Bye!");
                            break;
                        }
                        Ok(false) => {}
                        Err(e) => self.notices.error(format!("Error: {}", e)),
                    }
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    self.notices.error(format!("Readline error: {}", err));
                    break;
                }
            }
        }

        self.flush_notices();
        Ok(())
    }

    /// Handle user input (either command or prompt). Returns `true` to exit.
    pub async fn handle_input(&mut self, input: &str) -> anyhow::Result<bool> {
        let result = if input.starts_with('/') {
            matches!(self.handle_command(input).await?, CommandResult::Exit)
        } else {
            debug!(prompt_len = input.len(), "Code generation prompt");
            self.generate(input).await?;
            false
        };
        self.flush_notices();
        Ok(result)
    }
}
