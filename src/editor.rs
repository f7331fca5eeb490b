//! The code buffer that generated code lands in and `/run` executes.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LANGUAGE: &str = "python";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Editor is read-only")]
    Readonly,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map a file extension to an editor language id.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let language = match ext.to_ascii_lowercase().as_str() {
        "py" | "pyw" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "rs" => "rust",
        "sh" | "bash" => "bash",
        "json" => "json",
        "md" => "markdown",
        "html" | "htm" => "html",
        "css" => "css",
        "sql" => "sql",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        _ => return None,
    };
    Some(language)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    text: String,
    language: String,
    readonly: bool,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self {
            text: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            readonly: false,
        }
    }
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the contents. Refused (returns `false`) when read-only.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if self.readonly {
            return false;
        }
        self.text = text.into();
        true
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Replace the contents with a file. The language follows the extension
    /// when it is recognized.
    pub fn load_file(&mut self, path: &Path) -> Result<(), EditorError> {
        if self.readonly {
            return Err(EditorError::Readonly);
        }
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded file into editor");
        self.text = text;
        if let Some(language) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(language_for_extension)
        {
            self.language = language.to_string();
        }
        Ok(())
    }

    pub fn save_file(&self, path: &Path) -> Result<(), EditorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.text)?;
        debug!(path = %path.display(), bytes = self.text.len(), "Saved editor contents");
        Ok(())
    }
}
