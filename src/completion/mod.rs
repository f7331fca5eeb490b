//! Hosted completion endpoint client.

mod client;
mod error;
mod transport;
mod wire;

pub use client::{CompletionClient, CompletionConfig, CompletionResult, SYSTEM_PROMPT};
pub use error::{CompletionError, ProviderErrorKind};
pub use transport::{validate_endpoint, HttpTransport, Transport, TransportResponse};
pub use wire::{ChatRequest, ChatResponse, WireMessage};
