//! Reedline completion with Tab-triggered menu.
//!
//! Type "/" then Tab to see commands. Menu filters as you type.

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, Emacs, Highlighter, KeyCode, KeyModifiers, MenuBuilder, Prompt,
    PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, ReedlineEvent,
    ReedlineMenu, Span, StyledText, Suggestion,
};
use std::borrow::Cow;

/// All slash commands with descriptions
pub const COMMANDS: &[(&str, &str)] = &[
    ("/chat", "Ask a coding question"),
    ("/clear", "Clear the conversation"),
    ("/code", "Show the editor contents"),
    ("/copy", "Copy code, response, output or prompt"),
    ("/endpoint", "Show or set the completion endpoint"),
    ("/exit", "Exit"),
    ("/h", "Show help"),
    ("/help", "Show help"),
    ("/history", "Show the conversation"),
    ("/key", "Manage the API key"),
    ("/load", "Load a file into the editor"),
    ("/model", "Show or set the model"),
    ("/q", "Exit"),
    ("/quit", "Exit"),
    ("/readonly", "Toggle editor read-only"),
    ("/run", "Run the editor contents"),
    ("/samples", "List or use sample prompts"),
    ("/save", "Save the editor to a file"),
    ("/status", "Show runtime and key status"),
    ("/theme", "Cycle or set the color theme"),
];

/// `/key` subcommands
pub const KEY_COMMANDS: &[&str] = &["clear", "set", "status"];

/// `/copy` targets
pub const COPY_TARGETS: &[&str] = &["code", "output", "prompt", "response"];

/// Input lines starting with this never reach the history file.
pub const HISTORY_EXCLUDED_PREFIX: &str = "/key";

/// Values accepted by `/theme`
pub const THEME_NAMES: &[&str] = &["dark", "futuristic", "light"];

/// Completer for slash commands and their arguments
#[derive(Clone, Default)]
pub struct PadCompleter;

impl PadCompleter {
    pub fn new() -> Self {
        Self
    }
}

fn word_suggestions(words: &[&str], prefix: &str, start: usize, pos: usize) -> Vec<Suggestion> {
    let prefix = prefix.to_lowercase();
    words
        .iter()
        .filter(|w| prefix.is_empty() || w.starts_with(&prefix))
        .map(|w| Suggestion {
            value: w.to_string(),
            description: None,
            extra: None,
            span: Span::new(start, pos),
            append_whitespace: false,
            style: None,
        })
        .collect()
}

impl Completer for PadCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if pos > line.len() {
            return Vec::new();
        }

        let input = &line[..pos];

        if input.is_empty() || !input.starts_with('/') {
            return Vec::new();
        }

        // Command completion (no space yet)
        if !input.contains(' ') {
            let prefix = input.to_lowercase();
            return COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.to_lowercase().starts_with(&prefix))
                .take(10)
                .map(|(cmd, desc)| Suggestion {
                    value: cmd.to_string(),
                    description: Some(desc.to_string()),
                    extra: None,
                    span: Span::new(0, pos),
                    append_whitespace: true,
                    style: None,
                })
                .collect();
        }

        if let Some(rest) = input.strip_prefix("/key ") {
            if !rest.contains(' ') {
                return word_suggestions(KEY_COMMANDS, rest, 5, pos);
            }
        }

        if let Some(rest) = input.strip_prefix("/copy ") {
            if !rest.contains(' ') {
                return word_suggestions(COPY_TARGETS, rest, 6, pos);
            }
        }

        if let Some(rest) = input.strip_prefix("/theme ") {
            if !rest.contains(' ') {
                return word_suggestions(THEME_NAMES, rest, 7, pos);
            }
        }

        Vec::new()
    }
}

/// Codepad prompt
pub struct PadPrompt {
    pub model_name: String,
    pub runtime_ready: bool,
}

impl PadPrompt {
    pub fn new(model: &str, runtime_ready: bool) -> Self {
        Self {
            model_name: model.to_string(),
            runtime_ready,
        }
    }
}

impl Prompt for PadPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let dot = if self.runtime_ready {
            Color::Green.paint("●")
        } else {
            Color::DarkGray.paint("○")
        };
        Cow::Owned(format!(
            "{} {} {}",
            Color::Yellow.bold().paint("codepad"),
            Style::new().dimmed().paint(format!("[{}]", self.model_name)),
            dot
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" › ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, hs: PromptHistorySearch) -> Cow<'_, str> {
        let prefix = match hs.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}search: {}) ", prefix, hs.term))
    }
}

/// Syntax highlighter for slash commands
#[derive(Clone)]
pub struct PadHighlighter;

impl Highlighter for PadHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.starts_with('/') {
            let cmd_end = line.find(' ').unwrap_or(line.len());
            let cmd = &line[..cmd_end];
            let is_valid = COMMANDS.iter().any(|(c, _)| *c == cmd);

            if is_valid {
                styled.push((Style::new().fg(Color::Cyan).bold(), cmd.to_string()));
            } else {
                styled.push((Style::new().fg(Color::Yellow), cmd.to_string()));
            }

            if cmd_end < line.len() {
                styled.push((Style::default(), line[cmd_end..].to_string()));
            }
        } else {
            styled.push((Style::default(), line.to_string()));
        }

        styled
    }
}

/// Build the line editor with the completion menu and Tab bindings.
pub fn create_reedline(completer: PadCompleter) -> Reedline {
    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("completion_menu")
            .with_columns(1)
            .with_column_padding(2)
            .with_text_style(Style::new().fg(Color::Default))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan))
            .with_description_text_style(Style::new().fg(Color::DarkGray)),
    );

    let mut keybindings = reedline::default_emacs_keybindings();

    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(KeyModifiers::SHIFT, KeyCode::BackTab, ReedlineEvent::MenuPrevious);

    Reedline::create()
        .with_completer(Box::new(completer))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_quick_completions(true)
        .with_partial_completions(true)
        .with_highlighter(Box::new(PadHighlighter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_history_exclusion_prefix(Some(HISTORY_EXCLUDED_PREFIX.to_string()))
}
