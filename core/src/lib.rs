/// CipherChat - terminal client for an end-to-end encryption demo backend
///
/// The backend does all the cryptography; this crate is the interaction
/// layer: it turns user intents into HTTP calls and keeps the chat screen
/// in step with optimistic, pending and final states.

pub mod error;
pub mod config;
pub mod model;
pub mod api;
pub mod backend;
pub mod clipboard;
pub mod view;
pub mod controller;
pub mod tui;
pub mod cli_app;

pub use error::{ChatError, Result};
pub use config::Config;
pub use backend::{Backend, HttpBackend};
pub use controller::{ChatController, Completion, Request};
pub use view::ChatView;
