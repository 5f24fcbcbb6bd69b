/// Configuration management
use crate::error::{ChatError, Result};
use crate::model::Sender;
use std::path::PathBuf;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the chat backend (no trailing slash)
    pub backend_url: String,

    /// Sender selected at startup
    pub sender: Sender,

    /// Where the terminal UI writes its logs (the screen belongs to the UI)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            sender: Sender::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Create config from command line arguments.
    ///
    /// Recognised flags are consumed; everything else is returned in order
    /// so subcommands can read their own positional arguments.
    pub fn from_args(args: &[String]) -> Result<(Self, Vec<String>)> {
        let mut config = Self::from_env()?;
        let mut rest = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--backend" => {
                    let url = args.get(i + 1).ok_or_else(|| {
                        ChatError::Config("--backend requires a URL argument".to_string())
                    })?;
                    config.backend_url = normalize_backend_url(url)?;
                    i += 2;
                }
                "--sender" => {
                    let s = args.get(i + 1).ok_or_else(|| {
                        ChatError::Config("--sender requires 'alice' or 'bob'".to_string())
                    })?;
                    config.sender = s.parse()?;
                    i += 2;
                }
                "--log-file" => {
                    let path = args.get(i + 1).ok_or_else(|| {
                        ChatError::Config("--log-file requires a path argument".to_string())
                    })?;
                    config.log_file = Some(PathBuf::from(path));
                    i += 2;
                }
                other => {
                    rest.push(other.to_string());
                    i += 1;
                }
            }
        }

        Ok((config, rest))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("CIPHERCHAT_BACKEND") {
            config.backend_url = normalize_backend_url(&url)?;
        }
        if let Some(sender) = lookup("CIPHERCHAT_SENDER") {
            config.sender = sender.parse()?;
        }
        if let Some(path) = lookup("CIPHERCHAT_LOG_FILE") {
            config.log_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }
}

/// Plain HTTP only; the client has no TLS stack.
fn normalize_backend_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("https://") {
        return Err(ChatError::Config(
            "https backends are not supported, use an http:// URL".to_string(),
        ));
    }
    if !url.starts_with("http://") || url.len() == "http://".len() {
        return Err(ChatError::Config(format!("Invalid backend URL: '{}'", url)));
    }
    url.parse::<http::Uri>()
        .map_err(|e| ChatError::Config(format!("Invalid backend URL '{}': {}", url, e)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("cipherchat")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8000");
        assert_eq!(config.sender, Sender::Alice);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn flags_are_consumed_and_positionals_kept() {
        let (config, rest) = Config::from_args(&args(&[
            "send",
            "--backend",
            "http://localhost:9000/",
            "--sender",
            "bob",
            "hi",
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "http://localhost:9000");
        assert_eq!(config.sender, Sender::Bob);
        assert_eq!(rest, vec!["send".to_string(), "hi".to_string()]);
    }

    #[test]
    fn missing_flag_value_is_config_error() {
        let err = Config::from_args(&args(&["--backend"])).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn https_is_rejected() {
        assert!(normalize_backend_url("https://example.com").is_err());
        assert!(normalize_backend_url("ftp://example.com").is_err());
        assert!(normalize_backend_url("http://").is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = Config::from_lookup(|key| match key {
            "CIPHERCHAT_SENDER" => Some("BOB".to_string()),
            "CIPHERCHAT_LOG_FILE" => Some("/tmp/chat.log".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.sender, Sender::Bob);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/chat.log")));
    }
}
