/// Error types for the chat client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Rejected locally before any backend contact
    #[error("{0}")]
    Validation(String),

    /// Non-2xx answer; carries the raw response body
    #[error("{0}")]
    Backend(String),

    /// The request never produced a usable response
    #[error("{0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Build a transport error from an error and its whole source chain.
    ///
    /// hyper's client errors only say "client error (Connect)" at the top
    /// level; the useful part lives in the sources.
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        ChatError::Transport(text)
    }

    /// Errors the user caused locally; these are shown but not logged.
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }

    /// Failures worth a diagnostic log line: the request broke somewhere
    /// between us and the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Transport(_) | ChatError::Serialization(_) | ChatError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
