//! Codepad Library
//!
//! Core of the Codepad terminal coding assistant: ask a hosted model for code,
//! keep it in an editor buffer, run it with a local Python, and chat about it.
//!
//! ## Main Components
//!
//! - [`auth`] - API key storage
//! - [`cli`] - Command-line interface (REPL, commands, runner)
//! - [`codeblock`] - Code extraction from model responses
//! - [`completion`] - Completion endpoint client
//! - [`config`] - Settings, theme and XDG paths
//! - [`db`] - SQLite database for persistence
//! - [`editor`] - The code buffer
//! - [`execution`] - Interpreter lifecycle and script runs
//! - [`messaging`] - Notices, spinner and terminal rendering
//! - [`session`] - Chat conversation state
//!
//! ## Quick Start
//!
//! ```ignore
//! use codepad::{CompletionClient, CompletionConfig, CredentialStore, Database, HttpTransport, NoticeBus};
//! use std::sync::Arc;
//!
//! let db = Database::open()?;
//! db.migrate()?;
//! let bus = NoticeBus::new();
//! let credentials = CredentialStore::open(&db, bus.sender())?;
//! let transport = Arc::new(HttpTransport::new(codepad::config::DEFAULT_ENDPOINT)?);
//! let client = CompletionClient::new(&credentials, transport, CompletionConfig::default(), bus.sender());
//! let result = client.complete("Write a palindrome check", true).await?;
//! ```

pub mod auth;
pub mod cli;
pub mod codeblock;
pub mod completion;
pub mod config;
pub mod db;
pub mod editor;
pub mod execution;
pub mod messaging;
pub mod session;

// Re-export commonly used types
pub use auth::{ApiKeyState, CredentialError, CredentialStore};
pub use codeblock::{extract_code, extract_code_with_language, fence_language, strip_code_blocks};
pub use completion::{
    CompletionClient, CompletionConfig, CompletionError, CompletionResult, HttpTransport,
    Transport,
};
pub use config::{Settings, Theme, XdgDirs};
pub use db::Database;
pub use editor::EditorBuffer;
pub use execution::{ExecutionBridge, ExecutionError, ExecutionResult, PythonLoader, RuntimeStatus};
pub use messaging::{Notice, NoticeBus, NoticeLevel, NoticeSender, TerminalRenderer};
pub use session::{ChatSession, Conversation, Message, Role};
