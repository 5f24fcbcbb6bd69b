//! View state of the chat screen.
//!
//! Every interactive element the controller touches is an explicit field of
//! [`ChatView`]. The controller only mutates these fields; frontends read
//! them to draw, and tests read them to check what the user would see.

use crate::error::ChatError;
use crate::model::{Message, Sender};
use std::collections::VecDeque;

pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending...";
pub const REGENERATE_LABEL: &str = "Regenerate keys";
pub const REGENERATING_LABEL: &str = "Regenerating...";
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const SHOW_KEYS_LABEL: &str = "Show keys";
pub const HIDE_KEYS_LABEL: &str = "Hide keys";
pub const CLEAR_LABEL: &str = "Clear";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub enabled: bool,
    pub visible: bool,
}

impl Button {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: true,
            visible: true,
        }
    }

    pub fn hidden(label: &str) -> Self {
        Self {
            visible: false,
            ..Self::new(label)
        }
    }

    /// Whether pressing it does anything
    pub fn is_active(&self) -> bool {
        self.enabled && self.visible
    }

    pub fn set_pending(&mut self, label: &str) {
        self.enabled = false;
        self.label = label.to_string();
    }

    pub fn restore(&mut self, label: &str) {
        self.enabled = true;
        self.label = label.to_string();
    }
}

/// Multi-line message input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Append-only list of bubbles with a scroll position.
///
/// `scroll_back` counts lines above the newest content; 0 means the view
/// follows the tail. Appending always jumps back to the tail.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    items: Vec<Message>,
    scroll_back: usize,
}

impl MessageList {
    pub fn push(&mut self, message: Message) {
        self.items.push(message);
        self.scroll_back = 0;
    }

    pub fn items(&self) -> &[Message] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.items.last()
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }
}

/// A modal message the user has to dismiss (the browser's `alert`)
#[derive(Debug)]
pub enum Notice {
    Info(String),
    Error(ChatError),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::Info(text) => text.clone(),
            Notice::Error(err) if err.is_validation() => err.to_string(),
            Notice::Error(err) => format!("Error: {}", err),
        }
    }

    pub fn error(&self) -> Option<&ChatError> {
        match self {
            Notice::Error(err) => Some(err),
            Notice::Info(_) => None,
        }
    }
}

/// Questions the UI can ask with a yes/no prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    RegenerateKeys,
}

impl Confirm {
    pub fn question(&self) -> &'static str {
        match self {
            Confirm::RegenerateKeys => "Regenerate keypairs on server?",
        }
    }
}

/// The whole chat screen
#[derive(Debug)]
pub struct ChatView {
    pub input: TextInput,
    pub sender_select: Sender,
    pub send_button: Button,
    pub clear_button: Button,
    pub regenerate_button: Button,
    pub copy_button: Button,
    pub show_keys_button: Button,
    pub hide_keys_button: Button,
    pub messages: MessageList,
    /// Raw text of the latest bundle
    pub bundle_view: String,
    pub keys_view: String,
    pub key_drawer_visible: bool,
    /// Pending notices, oldest first; only the front one is shown
    pub notices: VecDeque<Notice>,
    pub confirm: Option<Confirm>,
}

impl ChatView {
    pub fn new(sender: Sender) -> Self {
        Self {
            input: TextInput::default(),
            sender_select: sender,
            send_button: Button::new(SEND_LABEL),
            clear_button: Button::new(CLEAR_LABEL),
            regenerate_button: Button::new(REGENERATE_LABEL),
            copy_button: Button::new(COPY_LABEL),
            show_keys_button: Button::new(SHOW_KEYS_LABEL),
            hide_keys_button: Button::hidden(HIDE_KEYS_LABEL),
            messages: MessageList::default(),
            bundle_view: String::new(),
            keys_view: String::new(),
            key_drawer_visible: false,
            notices: VecDeque::new(),
            confirm: None,
        }
    }

    /// The notice currently on screen
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    /// Close the notice on screen, revealing the next queued one
    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    /// Whether a modal currently swallows input
    pub fn is_modal(&self) -> bool {
        !self.notices.is_empty() || self.confirm.is_some()
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new(Sender::default())
    }
}
