//! Credential handling for the completion service.

mod credentials;

pub use credentials::{ApiKeyState, CredentialError, CredentialStore, CREDENTIAL_NAME};
