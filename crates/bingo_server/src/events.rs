//! Events fanned out to every member of a session's room.

use crate::session::{
    ChatMessage, Color, Mode, PlayerId, Role, Session, SessionBoard, SessionId, SessionSettings,
    Status, TimerState, TimerStatus, Vote, VoteState, VoteTally, Winner,
};
use bingo_board::{BoardSize, Grid, MarkSet, RuleSet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Timer as clients see it, with the remaining time precomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    /// Whether the session has a timer.
    pub enabled: bool,
    /// Countdown length.
    pub duration_secs: u64,
    /// Current status.
    pub status: TimerStatus,
    /// Seconds left at the time the view was taken.
    pub remaining_secs: u64,
    /// Start timestamp, for client-side recomputation.
    pub started_at: Option<DateTime<Utc>>,
    /// Pause timestamp, for client-side recomputation.
    pub paused_at: Option<DateTime<Utc>>,
    /// Banked pause time.
    pub accumulated_pause_ms: i64,
}

impl TimerView {
    /// Takes a view of the timer at `now`.
    pub fn new(timer: &TimerState, now: DateTime<Utc>) -> Self {
        Self {
            enabled: timer.enabled,
            duration_secs: timer.duration_secs,
            status: timer.status,
            remaining_secs: timer.remaining_secs(now),
            started_at: timer.started_at,
            paused_at: timer.paused_at,
            accumulated_pause_ms: timer.accumulated_pause_ms,
        }
    }
}

/// One player in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player ID.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Host or member.
    pub role: Role,
    /// Shared-mode color.
    pub color: Option<Color>,
    /// Flags left.
    pub flags_left: u8,
    /// Cells marked.
    pub marked: usize,
    /// Private card (solitary mode).
    pub card: Option<Grid>,
    /// Claimed cells (shared mode).
    pub marks: Option<MarkSet>,
}

/// Open poll in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    /// Flag thrower.
    pub flagger_id: PlayerId,
    /// Flag target.
    pub target_player_id: PlayerId,
    /// Disputed row.
    pub row: usize,
    /// Disputed column.
    pub col: usize,
    /// Running count.
    pub tally: VoteTally,
}

/// Full authoritative state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Session ID.
    pub id: SessionId,
    /// Join code.
    pub code: String,
    /// Deal mode.
    pub mode: Mode,
    /// Round status.
    pub status: Status,
    /// Enabled rules.
    pub rules: RuleSet,
    /// Host switches.
    pub settings: SessionSettings,
    /// Board edge length.
    pub board_size: BoardSize,
    /// Winner of the finished round.
    pub winner: Option<Winner>,
    /// Countdown.
    pub timer: TimerView,
    /// Players in join order.
    pub players: Vec<PlayerView>,
    /// The common card (shared mode).
    pub shared_card: Option<Grid>,
    /// Open poll.
    pub vote: Option<VoteView>,
    /// Recent chat, oldest first.
    pub chat: Vec<ChatMessage>,
}

impl SessionSnapshot {
    /// Builds a snapshot of the session at `now`.
    pub fn new(session: &Session, now: DateTime<Utc>) -> Self {
        let players = session
            .players
            .iter()
            .map(|p| {
                let (card, marks) = match &session.board {
                    SessionBoard::Solitary { cards } => (cards.get(&p.id).cloned(), None),
                    SessionBoard::Shared { marks, .. } => (None, marks.get(&p.id).cloned()),
                };
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    role: p.role,
                    color: p.color,
                    flags_left: p.flags_left,
                    marked: session.board.marked_count(&p.id),
                    card,
                    marks,
                }
            })
            .collect();
        let shared_card = match &session.board {
            SessionBoard::Shared { grid, .. } => Some(grid.clone()),
            SessionBoard::Solitary { .. } => None,
        };
        Self {
            id: session.id.clone(),
            code: session.code.clone(),
            mode: session.mode(),
            status: session.status,
            rules: session.rules.clone(),
            settings: session.settings,
            board_size: session.size,
            winner: session.winner.clone(),
            timer: TimerView::new(&session.timer, now),
            players,
            shared_card,
            vote: session.vote.as_ref().map(|v| VoteView {
                flagger_id: v.flagger_id.clone(),
                target_player_id: v.target_id.clone(),
                row: v.coord.row,
                col: v.coord.col,
                tally: v.tally(),
            }),
            chat: session.chat.iter().cloned().collect(),
        }
    }
}

/// Win announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinNotice {
    /// Winner's display name.
    pub player_name: String,
    /// Label of the rule that fired.
    pub rule: String,
}

/// A poll has opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStarted {
    /// Flag thrower.
    pub flagger_id: PlayerId,
    /// Flag thrower's name.
    pub flagger_name: String,
    /// Flag target.
    pub target_player_id: PlayerId,
    /// Flag target's name.
    pub target_player_name: String,
    /// Disputed row.
    pub row: usize,
    /// Disputed column.
    pub col: usize,
}

/// A poll has closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    /// Whether the mark was removed.
    pub success: bool,
    /// Every ballot.
    pub votes: BTreeMap<PlayerId, Option<Vote>>,
    /// Flag thrower.
    pub flagger_id: PlayerId,
    /// Flag target.
    pub target_player_id: PlayerId,
    /// Disputed row.
    pub row: usize,
    /// Disputed column.
    pub col: usize,
}

impl VoteResult {
    /// Final result of a completed poll.
    pub fn new(vote: &VoteState) -> Self {
        Self {
            success: vote.passed(),
            votes: vote.votes.clone(),
            flagger_id: vote.flagger_id.clone(),
            target_player_id: vote.target_id.clone(),
            row: vote.coord.row,
            col: vote.coord.col,
        }
    }
}

/// Event broadcast to a session's room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full state after a mutation.
    State(Box<SessionSnapshot>),
    /// A round was won.
    Win(WinNotice),
    /// Countdown started.
    TimerStarted(TimerView),
    /// Countdown paused.
    TimerPaused(TimerView),
    /// Countdown resumed.
    TimerResumed(TimerView),
    /// Countdown reset.
    TimerReset(TimerView),
    /// Periodic countdown sync.
    TimerUpdate(TimerView),
    /// Countdown reached zero.
    TimerExpired(TimerView),
    /// A flag opened a poll.
    VoteStarted(VoteStarted),
    /// A ballot was cast.
    VoteUpdate(VoteTally),
    /// The poll closed.
    VoteResult(VoteResult),
    /// Someone spoke in the room.
    ChatMessage(ChatMessage),
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Win(_) => "win",
            Self::TimerStarted(_) => "timerStarted",
            Self::TimerPaused(_) => "timerPaused",
            Self::TimerResumed(_) => "timerResumed",
            Self::TimerReset(_) => "timerReset",
            Self::TimerUpdate(_) => "timerUpdate",
            Self::TimerExpired(_) => "timerExpired",
            Self::VoteStarted(_) => "voteStarted",
            Self::VoteUpdate(_) => "voteUpdate",
            Self::VoteResult(_) => "voteResult",
            Self::ChatMessage(_) => "chatMessage",
        }
    }
}
