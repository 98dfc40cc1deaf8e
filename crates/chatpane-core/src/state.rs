//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between different UIs
//! and don't depend on any specific UI framework.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::history::QueryHistory;
use crate::prefs::PreferenceStore;
use crate::session::SessionState;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// A local file picked for upload. The path doubles as the preview reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
}

impl Attachment {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn preview_path(&self) -> &Path {
        &self.path
    }
}

/// One entry of the transcript. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub attachment: Option<Attachment>,
    pub display_text: Option<String>,
}

impl Message {
    pub fn user(text: &str, attachment: Option<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            sender: Sender::User,
            timestamp: Local::now(),
            attachment,
            display_text: Some(text.to_string()),
        }
    }

    pub fn assistant(text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            sender: Sender::Assistant,
            timestamp: Local::now(),
            attachment: None,
            display_text: None,
        }
    }

    /// Text to render: the display override when present
    pub fn shown_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.text)
    }

    /// Local hour:minute stamp
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// How the view should bring the newest message into sight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    /// Jump right away (after the user's own message)
    Instant,
    /// Debounced, eased move (after a reply arrives)
    Smooth,
}

/// Append-only message log
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    scroll_request: Option<ScrollRequest>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message, scroll: ScrollRequest) -> &Message {
        self.messages.push(message);
        self.scroll_request = Some(scroll);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the outstanding scroll request, if any
    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.scroll_request.take()
    }
}

/// Everything the send pipeline reads and mutates, passed around explicitly
pub struct ChatState {
    pub prefs: Box<dyn PreferenceStore>,
    pub session: SessionState,
    pub history: QueryHistory,
    pub transcript: Transcript,
}

impl ChatState {
    /// Load session and history once from the store
    pub fn load(prefs: Box<dyn PreferenceStore>) -> Self {
        let session = SessionState::load(prefs.as_ref());
        let history = QueryHistory::load(prefs.as_ref());
        Self {
            prefs,
            session,
            history,
            transcript: Transcript::new(),
        }
    }
}
