//! JSON messages exchanged over the WebSocket.

use crate::engine::{CreateSession, Joined};
use crate::events::{SessionSnapshot, TimerView};
use crate::session::{PlayerId, SessionId, Vote};
use bingo_board::RegionRequest;
use serde::{Deserialize, Serialize};

/// An action sent by a client.
///
/// Play, timer, and vote actions act on the session the connection is
/// bound to by a prior `create`, `join`, or `attach`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a session and become its host.
    Create(CreateSession),
    /// Join by code.
    Join {
        /// Join code.
        code: String,
        /// Display name.
        name: String,
        /// Shared-mode color.
        #[serde(default)]
        color: Option<String>,
    },
    /// Rebind to an existing membership after a reconnect.
    Attach {
        /// Session ID.
        session_id: SessionId,
        /// Player ID.
        player_id: PlayerId,
    },
    /// Toggle a cell, zero-based.
    Mark {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
    /// Replace prompts in a region.
    Reroll {
        /// Card owner in solitary mode.
        #[serde(default)]
        target_player_id: Option<PlayerId>,
        /// Region to replace.
        region: RegionRequest,
    },
    /// Deal a new round.
    NewRound,
    /// Start the countdown.
    StartTimer,
    /// Pause the countdown.
    PauseTimer,
    /// Resume the countdown.
    ResumeTimer,
    /// Reset the countdown.
    ResetTimer,
    /// Ask for the current countdown.
    TimerSync,
    /// Challenge a mark, zero-based.
    ThrowFlag {
        /// Player whose mark is disputed.
        target_player_id: PlayerId,
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
    /// Vote on the open challenge.
    CastVote {
        /// Ballot.
        vote: Vote,
    },
    /// Say something to the room.
    Chat {
        /// Message text.
        content: String,
    },
}

/// A message sent to one connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Reply {
    /// Identity after create or join.
    Welcome(Joined),
    /// Snapshot for a freshly bound connection.
    State(Box<SessionSnapshot>),
    /// The action was refused.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
    /// Answer to `timerSync`.
    TimerSync(TimerView),
}

impl Reply {
    /// A refusal with the given reason.
    pub fn rejected(reason: impl ToString) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
        }
    }
}
