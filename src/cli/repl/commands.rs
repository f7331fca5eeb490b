//! Command handling for the REPL.
//!
//! Every slash command is dispatched from [`Repl::handle_command`].

use super::Repl;
use crate::completion::HttpTransport;
use crate::config::Theme;
use crate::messaging::copy_to_clipboard;
use chrono::Local;
use dialoguer::Password;
use std::io::stdout;
use std::path::Path;
use std::sync::Arc;

/// Prompts offered by `/samples`.
pub const SAMPLE_PROMPTS: &[&str] = &[
    "Generate a function to check if a string is a palindrome",
    "Create a Python script to download files from a URL",
    "Write a recursive function to calculate factorial",
    "Create a simple Flask API with two endpoints",
];

/// Result of handling a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue the REPL loop
    Continue,
    /// Exit the REPL
    Exit,
}

/// Print the command reference.
pub fn show_help() {
    println!(
        "
\x1b[1mCodepad Commands\x1b[0m

  \x1b[1;36m/help, /h\x1b[0m              Show this help message
  \x1b[1;36m/exit, /quit, /q\x1b[0m       Exit codepad
  \x1b[1;36m/status\x1b[0m                Show model, API key and Python runtime status

\x1b[1mCode:\x1b[0m
  \x1b[1;33m<prompt>\x1b[0m               Generate code and load it into the editor
  \x1b[1;33m/samples [n]\x1b[0m           List sample prompts, or generate from sample n
  \x1b[1;33m/code\x1b[0m                  Show the editor contents
  \x1b[1;33m/run\x1b[0m                   Run the editor contents with Python
  \x1b[1;33m/load <file>\x1b[0m           Load a file into the editor
  \x1b[1;33m/save <file>\x1b[0m           Save the editor to a file
  \x1b[1;33m/copy [what]\x1b[0m           Copy code, response, output or prompt
  \x1b[1;33m/readonly\x1b[0m              Toggle editor read-only

\x1b[1mChat:\x1b[0m
  \x1b[1;35m/chat <question>\x1b[0m       Ask a coding question
  \x1b[1;35m/history\x1b[0m               Show the conversation
  \x1b[1;35m/clear\x1b[0m                 Clear the conversation

\x1b[1mConfiguration:\x1b[0m
  \x1b[1;32m/key [set|clear|status]\x1b[0m Manage the API key
  \x1b[1;32m/model [name]\x1b[0m          Show or set the model
  \x1b[1;32m/endpoint [url]\x1b[0m        Show or set the completion endpoint
  \x1b[1;32m/theme [name]\x1b[0m          Cycle or set the theme (light, dark, futuristic)
"
    );
}

impl Repl<'_> {
    /// Handle a slash command.
    ///
    /// Returns `CommandResult::Exit` if the user wants to quit, otherwise `Continue`.
    pub async fn handle_command(&mut self, input: &str) -> anyhow::Result<CommandResult> {
        let parts: Vec<&str> = input[1..].splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match cmd.as_str() {
            "help" | "h" | "?" => show_help(),
            "exit" | "quit" | "q" => return Ok(CommandResult::Exit),
            "status" => self.cmd_status(),
            "chat" => self.ask(args).await?,
            "history" => self.cmd_history()?,
            "clear" => {
                self.chat.clear();
                self.notices.success("Conversation cleared");
            }
            "run" => {
                self.run_editor().await?;
            }
            "code" => self.cmd_code()?,
            "copy" => self.cmd_copy(args),
            "load" => self.cmd_load(args),
            "save" => self.cmd_save(args),
            "readonly" => {
                let readonly = !self.editor.is_readonly();
                self.editor.set_readonly(readonly);
                self.notices
                    .info(format!("Editor is now {}", if readonly { "read-only" } else { "editable" }));
            }
            "key" => self.cmd_key(args)?,
            "model" | "m" => self.cmd_model(args),
            "endpoint" => self.cmd_endpoint(args),
            "theme" => self.cmd_theme(args),
            "samples" => self.cmd_samples(args).await?,
            "" => show_help(),
            _ => self
                .notices
                .warning(format!("Unknown command: /{} (try /help)", cmd)),
        }

        Ok(CommandResult::Continue)
    }

    fn cmd_status(&self) {
        let key = self
            .credentials
            .masked()
            .unwrap_or_else(|| "not set".to_string());
        let runtime = match self.bridge.version() {
            Some(version) => format!("{} ({})", self.bridge.status(), version),
            None => self.bridge.status().to_string(),
        };

        println!();
        println!("  \x1b[1mModel:\x1b[0m     {}", self.client.config().model);
        println!("  \x1b[1mEndpoint:\x1b[0m  {}", self.client.endpoint());
        println!("  \x1b[1mAPI key:\x1b[0m   {}", key);
        println!("  \x1b[1mPython:\x1b[0m    {}", runtime);
        println!("  \x1b[1mTheme:\x1b[0m     {}", self.renderer.theme());
        println!(
            "  \x1b[1mEditor:\x1b[0m    {} lines of {}{}",
            self.editor.line_count(),
            self.editor.language(),
            if self.editor.is_readonly() { " (read-only)" } else { "" }
        );
        println!("  \x1b[1mChat:\x1b[0m      {} messages", self.chat.conversation().len());
        println!();
    }

    fn cmd_history(&self) -> anyhow::Result<()> {
        let messages = self.chat.conversation().messages();
        if messages.is_empty() {
            self.notices.info("No chat messages yet. Ask with /chat <question>");
            return Ok(());
        }

        let mut out = stdout();
        for message in messages {
            print!(
                "\x1b[2m{}\x1b[0m ",
                message.created_at.with_timezone(&Local).format("%H:%M")
            );
            self.renderer.render_chat_message(&mut out, message)?;
        }
        Ok(())
    }

    fn cmd_code(&self) -> anyhow::Result<()> {
        if self.editor.is_empty() {
            self.notices.info("Editor is empty. Type a prompt to generate code.");
            return Ok(());
        }
        self.renderer
            .render_code(&mut stdout(), self.editor.language(), self.editor.text())?;
        Ok(())
    }

    fn cmd_load(&mut self, args: &str) {
        if args.is_empty() {
            self.notices.warning("Usage: /load <file>");
            return;
        }
        match self.editor.load_file(Path::new(args)) {
            Ok(()) => self.notices.success(format!(
                "Loaded {} ({} lines, {})",
                args,
                self.editor.line_count(),
                self.editor.language()
            )),
            Err(e) => self.notices.error(format!("Failed to load {}: {}", args, e)),
        }
    }

    fn cmd_save(&self, args: &str) {
        if args.is_empty() {
            self.notices.warning("Usage: /save <file>");
            return;
        }
        match self.editor.save_file(Path::new(args)) {
            Ok(()) => self.notices.success(format!("Saved editor to {}", args)),
            Err(e) => self.notices.error(format!("Failed to save {}: {}", args, e)),
        }
    }

    /// Text `/copy` would place on the clipboard. Defaults to the editor code.
    fn copy_source(&self, what: &str) -> Result<&str, String> {
        let text = match what {
            "" | "code" => Some(self.editor.text()),
            "response" => self.last_response.as_deref(),
            "output" => self.last_output.as_deref(),
            "prompt" => self.last_prompt.as_deref(),
            other => {
                return Err(format!(
                    "Unknown /copy target: {} (use code, response, output or prompt)",
                    other
                ))
            }
        };
        match text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(format!("Nothing to copy for {}", if what.is_empty() { "code" } else { what })),
        }
    }

    fn cmd_copy(&self, args: &str) {
        let what = args.to_lowercase();
        let text = match self.copy_source(&what) {
            Ok(text) => text,
            Err(message) => {
                self.notices.warning(message);
                return;
            }
        };
        match copy_to_clipboard(&mut stdout(), text) {
            Ok(()) => self.notices.success("Copied to clipboard"),
            Err(e) => self.notices.error(format!("Clipboard write failed: {}", e)),
        }
    }

    fn cmd_key(&self, args: &str) -> anyhow::Result<()> {
        let mut parts = args.splitn(2, ' ');
        let sub = parts.next().unwrap_or("").to_lowercase();
        let value = parts.next().map(str::trim).unwrap_or("");

        match sub.as_str() {
            "" | "status" => match self.credentials.masked() {
                Some(masked) => self.notices.info(format!("API key stored: {}", masked)),
                None => self.notices.info("No API key stored. Add one with /key set"),
            },
            "set" if !value.is_empty() => self.notices.warning(
                "Keys are not accepted on the command line. Run /key set and paste it at the hidden prompt",
            ),
            "set" => {
                let candidate = Password::new()
                    .with_prompt("API key")
                    .allow_empty_password(true)
                    .interact()?;
                self.credentials.save(&candidate)?;
            }
            "clear" => self.credentials.clear()?,
            other => self
                .notices
                .warning(format!("Unknown /key option: {} (use set, clear or status)", other)),
        }
        Ok(())
    }

    fn cmd_model(&mut self, args: &str) {
        if args.is_empty() {
            self.notices
                .info(format!("Current model: {}", self.client.config().model));
            return;
        }
        match self.settings.set_model(args) {
            Ok(()) => {
                self.client.set_model(args);
                self.notices.success(format!("Switched to model: {}", args));
            }
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    fn cmd_endpoint(&mut self, args: &str) {
        if args.is_empty() {
            self.notices
                .info(format!("Current endpoint: {}", self.client.endpoint()));
            return;
        }
        let transport = match HttpTransport::new(args) {
            Ok(transport) => transport,
            Err(e) => {
                self.notices.error(e.to_string());
                return;
            }
        };
        match self.settings.set_endpoint(args) {
            Ok(()) => {
                self.client.set_transport(Arc::new(transport));
                self.notices.success(format!("Using endpoint: {}", args));
            }
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    fn cmd_theme(&mut self, args: &str) {
        let result = if args.is_empty() {
            self.settings.toggle_theme()
        } else {
            match args.parse::<Theme>() {
                Ok(theme) => self.settings.set_theme(theme).map(|_| theme),
                Err(e) => {
                    self.notices.warning(format!("{} (use light, dark or futuristic)", e));
                    return;
                }
            }
        };

        match result {
            Ok(theme) => {
                self.renderer.set_theme(theme);
                self.notices.success(format!("Theme: {}", theme));
            }
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    async fn cmd_samples(&mut self, args: &str) -> anyhow::Result<()> {
        if args.is_empty() {
            println!();
            println!("  \x1b[1mSample prompts:\x1b[0m");
            for (i, sample) in SAMPLE_PROMPTS.iter().enumerate() {
                println!("  \x1b[1;33m{}.\x1b[0m {}", i + 1, sample);
            }
            println!("\n  \x1b[2mUse /samples <n> to generate from one.\x1b[0m\n");
            return Ok(());
        }

        let sample = args
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| SAMPLE_PROMPTS.get(i));
        match sample {
            Some(prompt) => {
                println!("\x1b[2m> {}\x1b[0m", prompt);
                self.generate(prompt).await?;
            }
            None => self.notices.warning(format!(
                "No sample {}. Pick 1 to {}",
                args,
                SAMPLE_PROMPTS.len()
            )),
        }
        Ok(())
    }
}
