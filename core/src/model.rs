/// Shared types for the chat client: who sends, who authored a bubble,
/// the message list entries and the per-session transient state
use crate::error::ChatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder sidecar shown under an outgoing message until the reply lands
pub const ENCRYPTING_PLACEHOLDER: &str = "(encrypting...)";

/// Identity the backend encrypts as. Only these two exist server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[default]
    Alice,
    Bob,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Alice => "alice",
            Sender::Bob => "bob",
        }
    }

    /// The other party
    pub fn toggled(self) -> Self {
        match self {
            Sender::Alice => Sender::Bob,
            Sender::Bob => Sender::Alice,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alice" => Ok(Sender::Alice),
            "bob" => Ok(Sender::Bob),
            other => Err(ChatError::Config(format!(
                "sender must be 'alice' or 'bob', got '{}'",
                other
            ))),
        }
    }
}

/// Which side of the conversation a bubble belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Me,
    Them,
}

/// One entry of the message list. Entries are never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub author: Author,
    /// Secondary line: encryption status or the raw bundle
    pub sidecar: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Outgoing bubble rendered before the backend answers
    pub fn optimistic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::Me,
            sidecar: ENCRYPTING_PLACEHOLDER.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Decrypted reply with the bundle it came from
    pub fn reply(text: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::Them,
            sidecar: bundle.into(),
            created_at: Utc::now(),
        }
    }
}

/// Transient client state; lives as long as the UI does
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Most recent bundle from a successful send
    pub last_bundle: Option<String>,
    pub keys_drawer_visible: bool,
}
