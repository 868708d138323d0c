//! Flag challenges and the majority poll that settles them.

use crate::Rejection;
use crate::session::PlayerId;
use bingo_board::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// A ballot on a flagged mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    /// The mark should be removed.
    Yes,
    /// The mark stands.
    No,
}

/// Running count of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    /// Ballots for removing the mark.
    pub votes_for: usize,
    /// Ballots against.
    pub votes_against: usize,
    /// Ballots cast so far.
    pub votes_cast: usize,
    /// Eligible voters.
    pub total_players: usize,
}

/// The single open poll of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteState {
    /// Player who threw the flag.
    pub flagger_id: PlayerId,
    /// Player whose mark is disputed.
    pub target_id: PlayerId,
    /// Disputed cell.
    pub coord: Coord,
    /// Every player present when the flag was thrown, with their ballot.
    pub votes: BTreeMap<PlayerId, Option<Vote>>,
}

impl VoteState {
    /// Opens a poll with a fixed set of eligible voters.
    #[instrument(skip(voters))]
    pub fn open(
        flagger_id: PlayerId,
        target_id: PlayerId,
        coord: Coord,
        voters: impl IntoIterator<Item = PlayerId>,
    ) -> Self {
        Self {
            flagger_id,
            target_id,
            coord,
            votes: voters.into_iter().map(|id| (id, None)).collect(),
        }
    }

    /// Records a ballot.
    ///
    /// # Errors
    ///
    /// [`Rejection::NotEligible`] for players outside the snapshot,
    /// [`Rejection::AlreadyVoted`] for a second ballot.
    #[instrument(skip(self))]
    pub fn cast(&mut self, voter: &str, vote: Vote) -> Result<(), Rejection> {
        match self.votes.get_mut(voter) {
            None => Err(Rejection::NotEligible),
            Some(Some(_)) => Err(Rejection::AlreadyVoted),
            Some(slot) => {
                *slot = Some(vote);
                debug!("Ballot recorded");
                Ok(())
            }
        }
    }

    /// Current count.
    pub fn tally(&self) -> VoteTally {
        let count = |wanted: Vote| self.votes.values().filter(|v| **v == Some(wanted)).count();
        let votes_for = count(Vote::Yes);
        let votes_against = count(Vote::No);
        VoteTally {
            votes_for,
            votes_against,
            votes_cast: votes_for + votes_against,
            total_players: self.votes.len(),
        }
    }

    /// Whether every eligible voter has cast a ballot.
    pub fn is_complete(&self) -> bool {
        self.votes.values().all(Option::is_some)
    }

    /// Strict majority of yes over no.
    pub fn passed(&self) -> bool {
        let tally = self.tally();
        tally.votes_for > tally.votes_against
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll() -> VoteState {
        VoteState::open(
            "a".into(),
            "b".into(),
            Coord::new(1, 1),
            ["a", "b", "c"].map(String::from),
        )
    }

    #[test]
    fn test_yes_yes_no_passes() {
        let mut state = poll();
        state.cast("a", Vote::Yes).unwrap();
        state.cast("b", Vote::No).unwrap();
        assert!(!state.is_complete());
        state.cast("c", Vote::Yes).unwrap();
        assert!(state.is_complete());
        assert!(state.passed());
    }

    #[test]
    fn test_unresolved_until_last_vote() {
        let mut state = poll();
        state.cast("a", Vote::Yes).unwrap();
        state.cast("b", Vote::No).unwrap();
        let tally = state.tally();
        assert_eq!(tally.votes_cast, 2);
        assert_eq!(tally.total_players, 3);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_even_split_fails() {
        let mut state = VoteState::open("a".into(), "b".into(), Coord::new(0, 0), ["a", "b"].map(String::from));
        state.cast("a", Vote::Yes).unwrap();
        state.cast("b", Vote::No).unwrap();
        assert!(!state.passed());
    }

    #[test]
    fn test_cast_rejections() {
        let mut state = poll();
        assert_eq!(state.cast("z", Vote::Yes), Err(Rejection::NotEligible));
        state.cast("a", Vote::No).unwrap();
        assert_eq!(state.cast("a", Vote::Yes), Err(Rejection::AlreadyVoted));
    }
}
