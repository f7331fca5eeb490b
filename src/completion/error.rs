//! Completion errors.

use thiserror::Error;

/// Broad class of a provider failure, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 401/403, bad API key or permissions.
    Auth,
    /// 404, usually a bad model name.
    NotFound,
    /// 429.
    RateLimit,
    /// 500/502/503/504.
    ServerError,
    /// Anything else.
    Unknown,
}

impl ProviderErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            500 | 502 | 503 | 504 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed with status {status}{}", detail_suffix(.message))]
    Provider {
        status: u16,
        message: Option<String>,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid completion response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Completion response contained no message")]
    EmptyResponse,
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Another completion request is already in progress")]
    Busy,
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl CompletionError {
    /// Build a provider error from a non-success response, pulling
    /// `error.message` out of the body when it is JSON.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string));
        Self::Provider { status, message }
    }

    pub fn kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider { status, .. } => Some(ProviderErrorKind::from_status(*status)),
            _ => None,
        }
    }

    /// Short text for a notice.
    pub fn user_message(&self) -> String {
        match self.kind() {
            Some(ProviderErrorKind::Auth) => {
                format!("{}. Check your API key with /key.", self)
            }
            Some(ProviderErrorKind::NotFound) => {
                format!("{}. Check the model name with /model.", self)
            }
            Some(ProviderErrorKind::RateLimit) => {
                format!("{}. Wait a moment and try again.", self)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ProviderErrorKind::from_status(401), ProviderErrorKind::Auth);
        assert_eq!(ProviderErrorKind::from_status(403), ProviderErrorKind::Auth);
        assert_eq!(ProviderErrorKind::from_status(404), ProviderErrorKind::NotFound);
        assert_eq!(ProviderErrorKind::from_status(429), ProviderErrorKind::RateLimit);
        assert_eq!(ProviderErrorKind::from_status(503), ProviderErrorKind::ServerError);
        assert_eq!(ProviderErrorKind::from_status(418), ProviderErrorKind::Unknown);
    }

    #[test]
    fn from_response_extracts_provider_message() {
        let err = CompletionError::from_response(401, r#"{"error":{"message":"Invalid API Key"}}"#);
        assert_eq!(err.to_string(), "Completion request failed with status 401: Invalid API Key");
        assert_eq!(err.kind(), Some(ProviderErrorKind::Auth));
        assert!(err.user_message().contains("/key"));
    }

    #[test]
    fn from_response_without_json_body() {
        let err = CompletionError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Completion request failed with status 502");
    }

    #[test]
    fn non_provider_errors_have_no_kind() {
        assert_eq!(CompletionError::Busy.kind(), None);
        assert_eq!(CompletionError::EmptyResponse.user_message(), "Completion response contained no message");
    }
}
