//! Settings management via SQLite.

use crate::config::Theme;
use crate::db::Database;
use thiserror::Error;

/// Default completion endpoint (OpenAI-compatible chat completions).
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Settings manager backed by SQLite.
pub struct Settings<'a> {
    db: &'a Database,
}

impl<'a> Settings<'a> {
    /// Create a new settings manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a setting value.
    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let result: Result<String, _> = self.db.conn().query_row(
            "SELECT value FROM settings WHERE key = ?",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SettingsError::Database(e)),
        }
    }

    /// Get a setting value or return a default.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).ok().flatten().unwrap_or_else(|| default.to_string())
    }

    /// Set a setting value.
    pub fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.db.conn().execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, unixepoch())
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value],
        )?;
        Ok(())
    }

    /// Delete a setting.
    pub fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.db.conn().execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }

    /// List all settings.
    pub fn list(&self) -> Result<Vec<(String, String)>, SettingsError> {
        let mut stmt = self.db.conn().prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut settings = Vec::new();
        for row in rows {
            settings.push(row?);
        }
        Ok(settings)
    }

    // Convenience accessors for common settings

    /// Get the completion model name.
    pub fn model(&self) -> String {
        self.get_or("model", DEFAULT_MODEL)
    }

    /// Set the completion model name.
    pub fn set_model(&self, model: &str) -> Result<(), SettingsError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(SettingsError::Invalid {
                key: "model".to_string(),
                reason: "model name cannot be empty".to_string(),
            });
        }
        self.set("model", model)
    }

    /// Get the completion endpoint URL.
    pub fn endpoint(&self) -> String {
        self.get_or("endpoint", DEFAULT_ENDPOINT)
    }

    /// Set the completion endpoint URL.
    pub fn set_endpoint(&self, url: &str) -> Result<(), SettingsError> {
        self.set("endpoint", url.trim())
    }

    /// Get the color theme. Unknown stored values fall back to the default.
    pub fn theme(&self) -> Theme {
        self.get_or("theme", "dark").parse().unwrap_or_default()
    }

    /// Set the color theme.
    pub fn set_theme(&self, theme: Theme) -> Result<(), SettingsError> {
        self.set("theme", &theme.to_string())
    }

    /// Advance the theme one step in the cycle and persist it.
    pub fn toggle_theme(&self) -> Result<Theme, SettingsError> {
        let next = self.theme().next();
        self.set_theme(next)?;
        Ok(next)
    }
}
