//! Board error types.

use derive_more::{Display, Error};

/// Errors raised while building or dealing cards.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Board size outside the supported range.
    #[display("Board size {size} is outside 3..=10")]
    InvalidSize {
        /// Requested size.
        size: usize,
    },
    /// Wrong number of prompts for the board.
    #[display("Expected {expected} prompts, got {actual}")]
    PromptCount {
        /// N² for the board.
        expected: usize,
        /// Prompts supplied.
        actual: usize,
    },
    /// Pool cannot fill a board without repeating a prompt.
    #[display("Prompt pool has {available} prompts, {needed} needed")]
    PoolTooSmall {
        /// Prompts needed for one card.
        needed: usize,
        /// Distinct prompts in the pool.
        available: usize,
    },
    /// Every generated card collided with an issued card.
    #[display("No distinct card after {attempts} attempts")]
    NoDistinctCard {
        /// Attempts made before giving up.
        attempts: usize,
    },
    /// Prompt catalog JSON could not be parsed.
    #[display("Failed to parse prompt catalog: {message}")]
    Catalog {
        /// Parser message.
        message: String,
    },
}
