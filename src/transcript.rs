//! The chat log: an append-only, chronologically ordered list of messages.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Who a transcript entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    /// Locally generated notices, such as a failed round trip.
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
            Sender::System => write!(f, "system"),
        }
    }
}

/// One transcript entry. Fields are read-only once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
    timestamp_ms: u64,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp_ms: now_ms(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Milliseconds since the Unix epoch at the time of the append.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// Current Unix epoch in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Append-only message log.
///
/// There is deliberately no way to remove, reorder or edit entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of user entries not yet followed by a bot reply or a system
    /// notice. At most one while a request is in flight, zero otherwise.
    pub fn unanswered(&self) -> usize {
        let mut open = 0usize;
        for message in &self.messages {
            match message.sender {
                Sender::User => open += 1,
                Sender::Bot | Sender::System => open = open.saturating_sub(1),
            }
        }
        open
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Tracks how much of a transcript a view has already shown.
///
/// Whenever the transcript grows, [`ScrollAnchor::take_new`] hands back the
/// entries appended since the previous call, which the view then brings into
/// view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollAnchor {
    seen: usize,
}

impl ScrollAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries appended since the last call. Empty when nothing changed.
    pub fn take_new<'t>(&mut self, transcript: &'t Transcript) -> &'t [Message] {
        let start = self.seen.min(transcript.len());
        self.seen = transcript.len();
        &transcript.messages()[start..]
    }

    pub fn has_new(&self, transcript: &Transcript) -> bool {
        transcript.len() > self.seen
    }
}
