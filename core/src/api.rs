/// Wire types for the three backend endpoints
///
/// Endpoints:
///   POST /api/send             body: {"sender":"alice|bob","plaintext":"..."}
///   POST /api/regenerate-keys  no body, answer ignored beyond the status
///   GET  /api/keys             answer: {"alice_pub", "alice_priv", "bob_pub", "bob_priv"}
use crate::model::Sender;
use serde::{Deserialize, Serialize};

pub const SEND_PATH: &str = "/api/send";
pub const REGENERATE_KEYS_PATH: &str = "/api/regenerate-keys";
pub const KEYS_PATH: &str = "/api/keys";

pub const NO_BUNDLE: &str = "(no bundle)";
pub const NO_DECRYPTED_TEXT: &str = "(no decrypted text)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub sender: Sender,
    pub plaintext: String,
}

/// Answer to a send. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub decrypted: Option<String>,
    /// Echo of the sender
    #[serde(default)]
    pub from: Option<String>,
    /// Set instead of the payload when the backend rejects the sender
    #[serde(default)]
    pub error: Option<String>,
}

impl SendResponse {
    /// Bundle text, or the placeholder when absent or empty
    pub fn bundle_text(&self) -> String {
        non_empty(self.bundle.as_deref()).unwrap_or(NO_BUNDLE).to_string()
    }

    /// Decrypted text, or the placeholder when absent or empty
    pub fn decrypted_text(&self) -> String {
        non_empty(self.decrypted.as_deref())
            .unwrap_or(NO_DECRYPTED_TEXT)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysResponse {
    #[serde(default)]
    pub alice_pub: Option<String>,
    #[serde(default)]
    pub alice_priv: Option<String>,
    #[serde(default)]
    pub bob_pub: Option<String>,
    #[serde(default)]
    pub bob_priv: Option<String>,
}

impl KeysResponse {
    /// Four labelled sections separated by blank lines
    pub fn to_display_text(&self) -> String {
        let sections = [
            ("Alice Public Key", &self.alice_pub),
            ("Alice Private Key", &self.alice_priv),
            ("Bob Public Key", &self.bob_pub),
            ("Bob Private Key", &self.bob_priv),
        ];
        sections
            .iter()
            .map(|(label, value)| format!("{}:\n{}", label, value.as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
