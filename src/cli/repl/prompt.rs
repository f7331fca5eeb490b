//! Prompt execution handling for the REPL.
//!
//! Plain input asks the model for code, which lands in the editor. `/chat`
//! and `/run` go through here as well.

use super::Repl;
use crate::codeblock::strip_code_blocks;
use crate::completion::CompletionResult;
use crate::editor::DEFAULT_LANGUAGE;
use crate::execution::ExecutionResult;
use std::io::stdout;
use tracing::{debug, info};

impl Repl<'_> {
    /// Ask the model for code and load it into the editor.
    ///
    /// Returns the response, or `None` when nothing came back (missing key or
    /// failed request, both already reported as notices).
    pub async fn generate(&mut self, prompt: &str) -> anyhow::Result<Option<CompletionResult>> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(None);
        }

        let spinner = self.start_spinner(format!("Generating... [{}]", self.client.config().model));
        let outcome = self.client.complete(prompt, true).await;
        Self::stop_spinner(spinner).await;

        let result = match outcome {
            Ok(Some(result)) => result,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.notices.error(e.user_message());
                return Ok(None);
            }
        };
        self.last_prompt = Some(prompt.to_string());
        self.last_response = Some(result.full_response.clone());

        let mut out = stdout();
        self.renderer
            .render_prose(&mut out, &strip_code_blocks(&result.full_response))?;

        if result.extracted_code.is_empty() {
            self.notices.info("The response did not contain a code block");
            return Ok(Some(result));
        }

        let language = result
            .code_language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        if self.editor.set_text(result.extracted_code.clone()) {
            self.editor.set_language(language);
            self.renderer
                .render_code(&mut out, self.editor.language(), self.editor.text())?;
            info!(lines = self.editor.line_count(), "Generated code loaded into editor");
            self.notices.success("Code generated successfully!");
        } else {
            self.renderer
                .render_code(&mut out, &language, &result.extracted_code)?;
            self.notices
                .warning("Editor is read-only, generated code was not loaded");
        }

        Ok(Some(result))
    }

    /// Ask a coding question and print the answer.
    pub async fn ask(&mut self, question: &str) -> anyhow::Result<()> {
        if question.trim().is_empty() {
            self.notices.info("Usage: /chat <question>");
            return Ok(());
        }

        let spinner = self.start_spinner("Thinking...");
        let reply = self.chat.ask(&self.client, question).await.cloned();
        Self::stop_spinner(spinner).await;

        if let Some(message) = reply {
            self.renderer.render_chat_message(&mut stdout(), &message)?;
        }
        Ok(())
    }

    /// Run the editor contents and print the result.
    pub async fn run_editor(&mut self) -> anyhow::Result<Option<ExecutionResult>> {
        if self.editor.is_empty() {
            self.notices.warning("No code to execute");
            return Ok(None);
        }
        if self.editor.language() != DEFAULT_LANGUAGE {
            self.notices.warning(format!(
                "Editor language is {}, running it as Python",
                self.editor.language()
            ));
        }

        let message = if self.bridge.is_loaded() {
            "Running..."
        } else {
            "Loading Python environment..."
        };
        let spinner = self.start_spinner(message);
        let result = self.bridge.run(self.editor.text()).await;
        Self::stop_spinner(spinner).await;

        debug!(
            elapsed_ms = result.execution_time_ms,
            failed = result.error.is_some(),
            "Execution result"
        );
        self.last_output = Some(match &result.error {
            Some(error) => error.clone(),
            None => result.output.clone(),
        });
        if result.is_success() {
            self.notices.success("Code executed successfully");
        }
        self.renderer.render_execution(&mut stdout(), &result)?;
        Ok(Some(result))
    }
}
