//! Engine error types.

use crate::store::StoreError;
use bingo_board::BoardError;
use derive_more::{Display, Error};

/// A capacity or conflict refusal, reported to the initiating client only.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum Rejection {
    /// Player name missing or blank.
    #[display("A player name is required")]
    NameRequired,
    /// Session already holds its maximum number of players.
    #[display("Game full ({capacity} players)")]
    SessionFull {
        /// Player cap for the mode.
        capacity: usize,
    },
    /// Another player already uses the name.
    #[display("Name taken")]
    NameTaken,
    /// Shared sessions need a color.
    #[display("Color selection required for shared mode")]
    ColorRequired,
    /// Unknown color token.
    #[display("Invalid color")]
    InvalidColor,
    /// Another player already uses the color.
    #[display("Color already taken")]
    ColorTaken,
    /// Cards could not be dealt.
    #[display("Cannot deal cards: {_0}")]
    Deal(BoardError),
    /// Flags are switched off for this session.
    #[display("Flags are disabled")]
    FlagsDisabled,
    /// A poll is already open.
    #[display("A vote is already in progress")]
    VotePending,
    /// The flagger has used every flag.
    #[display("No flags left")]
    NoFlagsLeft,
    /// Flags need at least two players.
    #[display("At least two players are needed to vote")]
    NotEnoughPlayers,
    /// No poll is open.
    #[display("No vote in progress")]
    NoVotePending,
    /// The voter joined after the flag was thrown.
    #[display("Not eligible to vote")]
    NotEligible,
    /// The voter already cast a ballot.
    #[display("Already voted")]
    AlreadyVoted,
}

/// Error returned by [`crate::SessionEngine`] operations.
#[derive(Debug, Display, Error)]
pub enum EngineError {
    /// Storage failed; the action was aborted and nothing was broadcast.
    #[display("{_0}")]
    Store(StoreError),
    /// The action was refused.
    #[display("Rejected: {_0}")]
    Rejected(Rejection),
    /// No session matches the ID or join code.
    #[display("Unknown session")]
    UnknownSession,
    /// The player is not a member of the session.
    #[display("Unknown player")]
    UnknownPlayer,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<Rejection> for EngineError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<BoardError> for EngineError {
    fn from(err: BoardError) -> Self {
        Self::Rejected(Rejection::Deal(err))
    }
}
