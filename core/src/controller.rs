//! Chat controller.
//!
//! Turns user intents into backend requests and reflects the answers in the
//! [`ChatView`]. Each intent is handled in two halves:
//!
//! - an intent method (`submit`, `answer_confirm`, `show_keys`, ...) that
//!   updates the view right away and may return a [`Request`]
//! - [`ChatController::complete`], which applies the [`Completion`] produced
//!   by running that request against a [`Backend`]
//!
//! The caller decides how requests run: the terminal UI spawns them and feeds
//! completions back through a channel, the one-shot CLI awaits them inline via
//! [`ChatController::drive`]. Whatever the backend answers, `complete` always
//! restores the buttons the intent disabled.

use crate::api::{KeysResponse, SendRequest, SendResponse};
use crate::backend::Backend;
use crate::clipboard::Clipboard;
use crate::error::{ChatError, Result};
use crate::model::{Message, Sender, SessionState};
use crate::view::{
    ChatView, Confirm, Notice, COPIED_LABEL, COPY_LABEL, REGENERATE_LABEL, REGENERATING_LABEL,
    SENDING_LABEL, SEND_LABEL,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long the copy button reads "Copied!"
pub const COPY_FEEDBACK: Duration = Duration::from_millis(1500);

pub const EMPTY_MESSAGE: &str = "Type a message to send.";
pub const NO_BUNDLE_TO_COPY: &str = "No bundle to copy";
pub const KEYS_LOADING: &str = "Loading...";
pub const KEYS_REGENERATED: &str = "(keys regenerated)";
pub const KEYS_REGENERATED_NOTICE: &str = "Keys regenerated successfully!";

/// Work the controller wants done against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Send(SendRequest),
    RegenerateKeys,
    /// `ticket` identifies the drawer opening this fetch belongs to
    FetchKeys { ticket: u64 },
}

impl Request {
    /// Execute against a backend. Never fails: errors travel inside the
    /// completion so the controller can restore its state.
    pub async fn run<B: Backend + ?Sized>(self, backend: &B) -> Completion {
        match self {
            Request::Send(request) => Completion::Sent(backend.send(&request).await),
            Request::RegenerateKeys => Completion::KeysRegenerated(backend.regenerate_keys().await),
            Request::FetchKeys { ticket } => Completion::KeysFetched {
                ticket,
                result: backend.keys().await,
            },
        }
    }
}

/// Outcome of a [`Request`]
#[derive(Debug)]
pub enum Completion {
    Sent(Result<SendResponse>),
    KeysRegenerated(Result<()>),
    KeysFetched {
        ticket: u64,
        result: Result<KeysResponse>,
    },
}

pub struct ChatController<C: Clipboard> {
    view: ChatView,
    session: SessionState,
    clipboard: C,
    send_in_flight: bool,
    regenerate_in_flight: bool,
    /// Latest keys fetch; older answers are dropped
    keys_ticket: u64,
    copy_reset_at: Option<Instant>,
}

impl<C: Clipboard> ChatController<C> {
    pub fn new(view: ChatView, clipboard: C) -> Self {
        Self {
            view,
            session: SessionState::default(),
            clipboard,
            send_in_flight: false,
            regenerate_in_flight: false,
            keys_ticket: 0,
            copy_reset_at: None,
        }
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChatView {
        &mut self.view
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn is_sending(&self) -> bool {
        self.send_in_flight
    }

    /// Run a request to completion and apply it. For sequential callers.
    pub async fn drive<B: Backend + ?Sized>(&mut self, request: Option<Request>, backend: &B) {
        if let Some(request) = request {
            let completion = request.run(backend).await;
            self.complete(completion);
        }
    }

    // ─── Intents ────────────────────────────────────────────────────────────

    /// Send button or Ctrl+Enter: send what is in the input as the selected
    /// sender.
    pub fn submit(&mut self) -> Option<Request> {
        let text = self.view.input.value().to_string();
        let sender = self.view.sender_select;
        self.send_message(&text, sender)
    }

    /// Append the optimistic bubble, clear the input and lock the send
    /// button, then hand back the request to run.
    pub fn send_message(&mut self, text: &str, sender: Sender) -> Option<Request> {
        if self.send_in_flight || !self.view.send_button.is_active() {
            debug!("send ignored: a send is already in flight");
            return None;
        }

        let text = text.trim();
        if text.is_empty() {
            self.alert(ChatError::Validation(EMPTY_MESSAGE.to_string()));
            return None;
        }

        self.view.messages.push(Message::optimistic(text));
        self.view.input.clear();
        self.view.send_button.set_pending(SENDING_LABEL);
        self.send_in_flight = true;

        info!("Sending message as {} ({} chars)", sender, text.chars().count());
        Some(Request::Send(SendRequest {
            sender,
            plaintext: text.to_string(),
        }))
    }

    /// Ask for confirmation before regenerating the server's keypairs
    pub fn regenerate_keys(&mut self) {
        if self.regenerate_in_flight || !self.view.regenerate_button.is_active() {
            debug!("regenerate ignored: already regenerating");
            return;
        }
        self.view.confirm = Some(Confirm::RegenerateKeys);
    }

    /// Answer the open yes/no prompt
    pub fn answer_confirm(&mut self, yes: bool) -> Option<Request> {
        let confirm = self.view.confirm.take()?;
        if !yes {
            debug!("{:?} declined", confirm);
            return None;
        }
        match confirm {
            Confirm::RegenerateKeys => {
                if self.regenerate_in_flight {
                    return None;
                }
                self.regenerate_in_flight = true;
                self.view.regenerate_button.set_pending(REGENERATING_LABEL);
                info!("Regenerating keypairs on server");
                Some(Request::RegenerateKeys)
            }
        }
    }

    /// Open the key drawer and fetch the current keys
    pub fn show_keys(&mut self) -> Option<Request> {
        if self.session.keys_drawer_visible {
            return None;
        }
        self.set_drawer(true);
        self.view.keys_view = KEYS_LOADING.to_string();
        self.keys_ticket += 1;
        Some(Request::FetchKeys {
            ticket: self.keys_ticket,
        })
    }

    pub fn hide_keys(&mut self) {
        self.set_drawer(false);
        self.view.keys_view.clear();
    }

    /// Whichever of show/hide is currently offered
    pub fn toggle_keys(&mut self) -> Option<Request> {
        if self.session.keys_drawer_visible {
            self.hide_keys();
            None
        } else {
            self.show_keys()
        }
    }

    pub fn copy_bundle(&mut self, now: Instant) {
        let Some(bundle) = self.session.last_bundle.clone() else {
            self.alert(ChatError::Validation(NO_BUNDLE_TO_COPY.to_string()));
            return;
        };

        match self.clipboard.write_text(&bundle) {
            Ok(()) => {
                self.view.copy_button.label = COPIED_LABEL.to_string();
                self.copy_reset_at = Some(now + COPY_FEEDBACK);
            }
            Err(e) => self.alert(ChatError::Io(e)),
        }
    }

    pub fn clear_input(&mut self) {
        self.view.input.clear();
    }

    pub fn select_sender(&mut self, sender: Sender) {
        self.view.sender_select = sender;
    }

    pub fn toggle_sender(&mut self) {
        self.view.sender_select = self.view.sender_select.toggled();
    }

    pub fn dismiss_notice(&mut self) {
        self.view.dismiss_notice();
    }

    /// Time-driven view updates
    pub fn tick(&mut self, now: Instant) {
        if let Some(reset_at) = self.copy_reset_at {
            if now >= reset_at {
                self.view.copy_button.label = COPY_LABEL.to_string();
                self.copy_reset_at = None;
            }
        }
    }

    // ─── Completions ────────────────────────────────────────────────────────

    pub fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Sent(result) => self.finish_send(result),
            Completion::KeysRegenerated(result) => self.finish_regenerate(result),
            Completion::KeysFetched { ticket, result } => self.finish_keys(ticket, result),
        }
    }

    fn finish_send(&mut self, result: Result<SendResponse>) {
        match result {
            Ok(response) => {
                if let Some(message) = response.error.as_deref().filter(|m| !m.is_empty()) {
                    warn!("Send answered with an error field: {}", message);
                }
                let bundle = response.bundle_text();
                let decrypted = response.decrypted_text();
                debug!("Reply received ({} byte bundle)", bundle.len());

                self.session.last_bundle = Some(bundle.clone());
                self.view.bundle_view = bundle.clone();
                self.view.messages.push(Message::reply(decrypted, bundle));
            }
            Err(e) => self.alert(e),
        }

        self.send_in_flight = false;
        self.view.send_button.restore(SEND_LABEL);
    }

    fn finish_regenerate(&mut self, result: Result<()>) {
        match result {
            Ok(()) => {
                info!("Keypairs regenerated");
                self.view
                    .push_notice(Notice::Info(KEYS_REGENERATED_NOTICE.to_string()));
                self.view.keys_view = KEYS_REGENERATED.to_string();
            }
            Err(e) => self.alert(e),
        }

        self.regenerate_in_flight = false;
        self.view.regenerate_button.restore(REGENERATE_LABEL);
    }

    fn finish_keys(&mut self, ticket: u64, result: Result<KeysResponse>) {
        if !self.session.keys_drawer_visible || ticket != self.keys_ticket {
            debug!("Discarding stale keys response (ticket {})", ticket);
            return;
        }

        self.view.keys_view = match result {
            Ok(keys) => keys.to_display_text(),
            Err(e) => {
                if e.is_transport() {
                    error!("Fetching keys failed: {}", e);
                }
                format!("Error: {}", e)
            }
        };
    }

    fn set_drawer(&mut self, visible: bool) {
        self.session.keys_drawer_visible = visible;
        self.view.key_drawer_visible = visible;
        self.view.show_keys_button.visible = !visible;
        self.view.hide_keys_button.visible = visible;
    }

    /// Surface an error the way the browser's `alert` did
    fn alert(&mut self, err: ChatError) {
        if err.is_transport() {
            error!("Request failed: {}", err);
        } else if !err.is_validation() {
            warn!("Backend rejected request: {}", err);
        }
        self.view.push_notice(Notice::Error(err));
    }
}
