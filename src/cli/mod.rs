//! CLI components.

pub mod completion;
pub mod repl;
pub mod runner;

pub use completion::{create_reedline, PadCompleter, PadHighlighter, PadPrompt, COMMANDS};
pub use repl::{CommandResult, Repl, SAMPLE_PROMPTS};
pub use runner::{run_interactive, run_single_prompt};
