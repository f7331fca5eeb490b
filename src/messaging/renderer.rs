//! Terminal renderer for notices, code, execution output and chat.

use super::{Notice, NoticeLevel};
use crate::config::Theme;
use crate::execution::ExecutionResult;
use crate::session::{Message, Role};
use crossterm::{
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    ExecutableCommand,
};
use std::io::Write;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Render style configuration.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub info_color: Color,
    pub success_color: Color,
    pub warning_color: Color,
    pub error_color: Color,
    pub frame_color: Color,
    pub user_color: Color,
    pub assistant_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            info_color: Color::White,
            success_color: Color::Green,
            warning_color: Color::Yellow,
            error_color: Color::Red,
            frame_color: Color::DarkGrey,
            user_color: Color::Cyan,
            assistant_color: Color::Magenta,
        }
    }
}

/// Terminal renderer. Every method writes to the given writer so output can be
/// sent to stdout, stderr or a buffer.
pub struct TerminalRenderer {
    style: RenderStyle,
    theme: Theme,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl TerminalRenderer {
    /// Create a new renderer for the given theme.
    pub fn new(theme: Theme) -> Self {
        Self {
            style: RenderStyle::default(),
            theme,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Switch the highlighting theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Color for transient status such as the spinner.
    pub fn accent_color(&self) -> Color {
        match self.theme {
            Theme::Futuristic => Color::Magenta,
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Cyan,
        }
    }

    /// Render a notice on a single line with a level marker.
    pub fn render_notice<W: Write>(&self, out: &mut W, notice: &Notice) -> std::io::Result<()> {
        let (color, prefix) = match notice.level {
            NoticeLevel::Info => (self.style.info_color, "• "),
            NoticeLevel::Success => (self.style.success_color, "✓ "),
            NoticeLevel::Warning => (self.style.warning_color, "⚠ "),
            NoticeLevel::Error => (self.style.error_color, "✗ "),
        };

        out.execute(SetForegroundColor(color))?
            .execute(Print(prefix))?
            .execute(Print(&notice.text))?
            .execute(ResetColor)?
            .execute(Print("\n"))?;
        Ok(())
    }

    /// Render the prose part of a response.
    pub fn render_prose<W: Write>(&self, out: &mut W, prose: &str) -> std::io::Result<()> {
        if prose.is_empty() {
            return Ok(());
        }
        writeln!(out, "{}", prose)?;
        writeln!(out)
    }

    /// Render a code block with syntax highlighting.
    pub fn render_code<W: Write>(&self, out: &mut W, lang: &str, code: &str) -> std::io::Result<()> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(self.theme.syntax_theme())
            .or_else(|| self.theme_set.themes.values().next());

        out.execute(SetForegroundColor(self.style.frame_color))?
            .execute(Print(format!(
                "┌── {}\n",
                if lang.is_empty() { "code" } else { lang }
            )))?
            .execute(ResetColor)?;

        let mut highlighter = theme.map(|t| HighlightLines::new(syntax, t));
        for line in LinesWithEndings::from(code) {
            out.execute(SetForegroundColor(self.style.frame_color))?
                .execute(Print("│ "))?
                .execute(ResetColor)?;

            let highlighted = highlighter
                .as_mut()
                .and_then(|h| h.highlight_line(line, &self.syntax_set).ok())
                .map(|ranges| as_24_bit_terminal_escaped(&ranges[..], false));
            match highlighted {
                Some(escaped) => write!(out, "{}", escaped)?,
                None => write!(out, "{}", line)?,
            }
        }
        if !code.ends_with('\n') {
            writeln!(out)?;
        }

        out.execute(ResetColor)?
            .execute(SetForegroundColor(self.style.frame_color))?
            .execute(Print("└──\n"))?
            .execute(ResetColor)?;
        Ok(())
    }

    /// Render the result of running the editor code.
    pub fn render_execution<W: Write>(
        &self,
        out: &mut W,
        result: &ExecutionResult,
    ) -> std::io::Result<()> {
        out.execute(SetForegroundColor(self.style.frame_color))?
            .execute(Print(format!(
                "── Execution output ({:.0} ms)\n",
                result.execution_time_ms
            )))?
            .execute(ResetColor)?;

        if let Some(error) = &result.error {
            out.execute(SetForegroundColor(self.style.error_color))?
                .execute(Print(error.trim_end()))?
                .execute(ResetColor)?
                .execute(Print("\n"))?;
        } else if result.output.is_empty() {
            out.execute(SetAttribute(Attribute::Dim))?
                .execute(Print("(no output)\n"))?
                .execute(SetAttribute(Attribute::Reset))?;
        } else {
            writeln!(out, "{}", result.output.trim_end())?;
        }
        Ok(())
    }

    /// Render one chat message.
    pub fn render_chat_message<W: Write>(&self, out: &mut W, message: &Message) -> std::io::Result<()> {
        let (color, label) = match message.role {
            Role::User => (self.style.user_color, "you"),
            Role::Assistant => (self.style.assistant_color, "assistant"),
        };

        out.execute(SetForegroundColor(color))?
            .execute(SetAttribute(Attribute::Bold))?
            .execute(Print(format!("{}: ", label)))?
            .execute(SetAttribute(Attribute::Reset))?
            .execute(ResetColor)?;
        writeln!(out, "{}", message.content)
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}
