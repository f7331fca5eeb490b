//! User-facing notices and terminal rendering.
//!
//! Core components never print. They publish [`Notice`]s through a
//! [`NoticeSender`]; the REPL drains a [`NoticeReceiver`] after each command and
//! hands the notices to the [`TerminalRenderer`].
//!
//! ```text
//!   CredentialStore ─┐
//!   CompletionClient ├─ NoticeSender ──▶ NoticeBus ──▶ NoticeReceiver ──▶ TerminalRenderer
//!   ExecutionBridge ─┘
//! ```

mod bus;
mod clipboard;
mod renderer;
mod spinner;
mod types;

pub use bus::{BusError, NoticeBus, NoticeReceiver, NoticeSender};
pub use clipboard::{copy_to_clipboard, CopyToClipboard};
pub use renderer::{RenderStyle, TerminalRenderer};
pub use spinner::{Spinner, SpinnerHandle};
pub use types::{Notice, NoticeLevel};
