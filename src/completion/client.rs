//! Completion client: one prompt in, full response plus extracted code out.

use super::{ChatRequest, ChatResponse, CompletionError, Transport, WireMessage};
use crate::auth::CredentialStore;
use crate::codeblock::extract_code_with_language;
use crate::config::{Settings, DEFAULT_MODEL};
use crate::messaging::NoticeSender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Instruction sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful coding assistant. Answer the request with a \
short explanation and working code. Put the code between ###CODE_START### and ###CODE_END### \
markers, without markdown fences.";

/// Request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 2000,
        }
    }
}

impl CompletionConfig {
    /// Defaults with the model taken from settings.
    pub fn from_settings(settings: &Settings<'_>) -> Self {
        Self {
            model: settings.model(),
            ..Self::default()
        }
    }
}

/// Outcome of a completion call. `extracted_code` is empty when extraction
/// was not requested or the response held no code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub full_response: String,
    pub extracted_code: String,
    /// Tag of the fenced block the code came from. `None` for delimited code.
    pub code_language: Option<String>,
}

/// Clears the in-flight flag when the request ends, however it ends.
struct InFlight<'f>(&'f AtomicBool);

impl<'f> InFlight<'f> {
    fn acquire(flag: &'f AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client for the hosted completion endpoint.
///
/// One request at a time: a call made while another is in flight fails with
/// [`CompletionError::Busy`] and sends nothing.
pub struct CompletionClient<'a> {
    credentials: &'a CredentialStore<'a>,
    transport: Arc<dyn Transport>,
    config: CompletionConfig,
    notices: NoticeSender,
    in_flight: AtomicBool,
}

impl<'a> CompletionClient<'a> {
    pub fn new(
        credentials: &'a CredentialStore<'a>,
        transport: Arc<dyn Transport>,
        config: CompletionConfig,
        notices: NoticeSender,
    ) -> Self {
        Self {
            credentials,
            transport,
            config,
            notices,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Build the request body for a prompt.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![WireMessage::system(SYSTEM_PROMPT), WireMessage::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Send `prompt` and return the response.
    ///
    /// Returns `Ok(None)` without touching the network when no API key is
    /// stored. With `want_code` the code block is pulled out of the response;
    /// chat callers pass `false` and use the full text.
    pub async fn complete(
        &self,
        prompt: &str,
        want_code: bool,
    ) -> Result<Option<CompletionResult>, CompletionError> {
        let Some(api_key) = self.credentials.api_key() else {
            self.notices.error("Please add your API key first (/key set)");
            return Ok(None);
        };

        let _guard = InFlight::acquire(&self.in_flight).ok_or(CompletionError::Busy)?;

        let request = self.build_request(prompt);
        info!(model = %request.model, endpoint = %self.transport.endpoint(), "Requesting completion");

        let response = self.transport.post(&api_key, &request).await.map_err(|e| {
            error!("Completion request failed: {}", e);
            e
        })?;

        if !response.is_success() {
            let err = CompletionError::from_response(response.status, &response.body);
            error!(status = response.status, "Completion endpoint error: {}", err);
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&response.body)?;
        let full_response = parsed.into_content().ok_or(CompletionError::EmptyResponse)?;
        debug!(chars = full_response.len(), "Completion received");

        let (extracted_code, code_language) = if want_code {
            extract_code_with_language(&full_response)
        } else {
            (String::new(), None)
        };

        Ok(Some(CompletionResult {
            full_response,
            extracted_code,
            code_language,
        }))
    }
}
