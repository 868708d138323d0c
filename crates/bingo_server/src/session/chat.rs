//! Room chat kept on the session.

use crate::session::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Longest accepted chat message, in characters.
pub const MAX_CHAT_LEN: usize = 300;

/// Messages retained per session; older ones are dropped first.
pub const CHAT_HISTORY: usize = 50;

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message ID.
    pub id: String,
    /// Sender.
    pub player_id: PlayerId,
    /// Sender's display name when the message was sent.
    pub player_name: String,
    /// Text as sent.
    pub content: String,
    /// Send time.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Whether `content` is non-empty and at most [`MAX_CHAT_LEN`] characters.
    pub fn is_valid_content(content: &str) -> bool {
        !content.is_empty() && content.chars().count() <= MAX_CHAT_LEN
    }
}

/// The most recent [`CHAT_HISTORY`] messages, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatLog(VecDeque<ChatMessage>);

impl ChatLog {
    /// Appends a message, evicting the oldest past the cap.
    pub fn push(&mut self, message: ChatMessage) {
        if self.0.len() == CHAT_HISTORY {
            self.0.pop_front();
        }
        self.0.push_back(message);
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been said.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Retained messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.0.iter()
    }
}
