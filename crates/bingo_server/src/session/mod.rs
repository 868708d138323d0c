//! Session aggregate: players, boards, timer, and the open poll.

mod chat;
mod timer;
mod vote;

pub use chat::{CHAT_HISTORY, ChatLog, ChatMessage, MAX_CHAT_LEN};
pub use timer::{MAX_TIMER_SECS, TimerState, TimerStatus};
pub use vote::{Vote, VoteState, VoteTally};

use bingo_board::{BoardSize, Coord, Grid, MarkSet, PromptPool, Rule, RuleSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, EnumIter, EnumString};
use tracing::{info, instrument};

/// Unique identifier for a session.
pub type SessionId = String;

/// Unique identifier for a player.
pub type PlayerId = String;

/// Flags each player may throw per session.
pub const FLAG_ALLOWANCE: u8 = 2;

/// Player cap for a solitary session.
pub const SOLITARY_CAPACITY: usize = 10;

/// Player cap for a shared session.
pub const SHARED_CAPACITY: usize = 4;

/// How cards are dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Every player has a private card.
    #[default]
    Solitary,
    /// Everyone competes on one card for distinct cells.
    Shared,
}

impl Mode {
    /// Maximum players.
    pub fn capacity(self) -> usize {
        match self {
            Self::Solitary => SOLITARY_CAPACITY,
            Self::Shared => SHARED_CAPACITY,
        }
    }
}

/// Lifecycle of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Marks are accepted.
    Active,
    /// A round has finished; waiting for a new round.
    Ended,
}

/// Player role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the session; may reroll, start rounds, and drive the timer.
    Host,
    /// Joined by code.
    Member,
}

/// Exclusive player colors for shared sessions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    /// Red.
    Red,
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Purple.
    Purple,
    /// Orange.
    Orange,
    /// Pink.
    Pink,
    /// Cyan.
    Cyan,
}

/// A participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player's unique ID.
    pub id: PlayerId,
    /// Display name, unique within the session.
    pub name: String,
    /// Host or member.
    pub role: Role,
    /// Color on a shared card.
    pub color: Option<Color>,
    /// Flags left to throw.
    pub flags_left: u8,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

/// Host-chosen switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Whether players may flag marks.
    pub flags_enabled: bool,
    /// Whether the host may reroll.
    pub rerolls_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            flags_enabled: true,
            rerolls_enabled: true,
        }
    }
}

/// Who won a round and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Winning player.
    pub player_id: PlayerId,
    /// Winner's display name.
    pub name: String,
    /// Rule that fired.
    pub rule: Rule,
}

/// Board layout, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionBoard {
    /// One private card per player.
    Solitary {
        /// Cards by owner.
        cards: BTreeMap<PlayerId, Grid>,
    },
    /// One card, with each player's claimed cells.
    Shared {
        /// The common card. Its marks are unused; claims live in `marks`.
        grid: Grid,
        /// Claimed cells by player.
        marks: BTreeMap<PlayerId, MarkSet>,
    },
}

impl SessionBoard {
    /// Mode implied by the layout.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Solitary { .. } => Mode::Solitary,
            Self::Shared { .. } => Mode::Shared,
        }
    }

    /// Removes a player's mark from a cell, whichever layout is in use.
    pub fn clear_mark(&mut self, player_id: &str, coord: Coord) -> bool {
        match self {
            Self::Solitary { cards } => cards
                .get_mut(player_id)
                .is_some_and(|card| card.unmark(coord)),
            Self::Shared { marks, .. } => marks
                .get_mut(player_id)
                .is_some_and(|set| set.remove(coord)),
        }
    }

    /// Cells marked by a player.
    pub fn marked_count(&self, player_id: &str) -> usize {
        match self {
            Self::Solitary { cards } => cards.get(player_id).map_or(0, Grid::marked_count),
            Self::Shared { marks, .. } => marks.get(player_id).map_or(0, MarkSet::len),
        }
    }
}

/// A complete game instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID.
    pub id: SessionId,
    /// Six-character join code.
    pub code: String,
    /// Round status.
    pub status: Status,
    /// Enabled win conditions.
    pub rules: RuleSet,
    /// Host switches.
    pub settings: SessionSettings,
    /// Board edge length.
    pub size: BoardSize,
    /// Prompts dealt from instead of the engine default.
    pub pool: Option<PromptPool>,
    /// Winner of the finished round.
    pub winner: Option<Winner>,
    /// Countdown.
    pub timer: TimerState,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Cards and marks.
    pub board: SessionBoard,
    /// The open poll, if any.
    pub vote: Option<VoteState>,
    /// Recent room chat.
    #[serde(default)]
    pub chat: ChatLog,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Mode of the session.
    pub fn mode(&self) -> Mode {
        self.board.mode()
    }

    /// Player with the given ID.
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Mutable player with the given ID.
    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Whether the player is the host.
    pub fn is_host(&self, player_id: &str) -> bool {
        self.player(player_id).is_some_and(|p| p.role == Role::Host)
    }

    /// Whether a round is in progress.
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Colors already claimed.
    pub fn taken_colors(&self) -> Vec<Color> {
        self.players.iter().filter_map(|p| p.color).collect()
    }

    /// Marked cell counts in join order.
    pub fn marked_counts(&self) -> Vec<(PlayerId, usize)> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), self.board.marked_count(&p.id)))
            .collect()
    }

    /// The pool to deal from.
    pub fn prompt_pool<'a>(&'a self, fallback: &'a PromptPool) -> &'a PromptPool {
        self.pool.as_ref().unwrap_or(fallback)
    }

    /// Ends the round, freezing any running countdown.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn end(&mut self, winner: Option<(PlayerId, Rule)>, now: DateTime<Utc>) {
        self.winner = winner.and_then(|(player_id, rule)| {
            let name = self.player(&player_id)?.name.clone();
            Some(Winner {
                player_id,
                name,
                rule,
            })
        });
        self.status = Status::Ended;
        self.timer.halt(now);
        info!(winner = ?self.winner.as_ref().map(|w| &w.name), "Round ended");
    }
}
