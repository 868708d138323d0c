//! Flags and the polls they open.

use super::{Ignored, Outcome, SessionEngine, lock};
use crate::events::{ServerEvent, VoteResult, VoteStarted};
use crate::rooms::Broadcaster;
use crate::session::{Vote, VoteState};
use crate::store::SessionStore;
use crate::{EngineError, Rejection};
use bingo_board::Coord;
use tracing::{info, instrument, warn};

impl<S: SessionStore, B: Broadcaster> SessionEngine<S, B> {
    /// Challenges a player's mark and opens a poll of everyone present.
    ///
    /// Spends one of the flagger's flags.
    ///
    /// # Errors
    ///
    /// [`Rejection`] when flags are off, a poll is already open, the flagger
    /// has no flags left, or fewer than two players are present.
    #[instrument(skip(self))]
    pub fn throw_flag(
        &self,
        session_id: &str,
        flagger_id: &str,
        target_id: &str,
        row: usize,
        col: usize,
    ) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        let Some(flagger) = session.player(flagger_id) else {
            return self.ignore(Ignored::NotMember);
        };
        let Some(target) = session.player(target_id) else {
            return self.ignore(Ignored::UnknownTarget);
        };
        let coord = Coord::new(row, col);
        if !session.size.contains(coord) {
            return self.ignore(Ignored::OffBoard);
        }

        let rejection = if !session.settings.flags_enabled {
            Some(Rejection::FlagsDisabled)
        } else if session.vote.is_some() {
            Some(Rejection::VotePending)
        } else if flagger.flags_left == 0 {
            Some(Rejection::NoFlagsLeft)
        } else if session.players.len() < 2 {
            Some(Rejection::NotEnoughPlayers)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            warn!(%rejection, "Flag rejected");
            return Err(rejection.into());
        }

        let started = VoteStarted {
            flagger_id: flagger.id.clone(),
            flagger_name: flagger.name.clone(),
            target_player_id: target.id.clone(),
            target_player_name: target.name.clone(),
            row,
            col,
        };
        let voters: Vec<String> = session.players.iter().map(|p| p.id.clone()).collect();
        session.vote = Some(VoteState::open(
            flagger_id.to_string(),
            target_id.to_string(),
            coord,
            voters,
        ));
        if let Some(flagger) = session.player_mut(flagger_id) {
            flagger.flags_left -= 1;
        }
        info!(target_name = %started.target_player_name, %coord, "Flag thrown");
        self.commit(&session, vec![ServerEvent::VoteStarted(started)])
    }

    /// Records a ballot and settles the poll once everyone has voted.
    ///
    /// A passing poll clears the target's mark on the disputed cell. The
    /// poll is discarded either way and the round status is untouched.
    ///
    /// # Errors
    ///
    /// [`Rejection`] when no poll is open, the voter is not eligible, or the
    /// voter already voted.
    #[instrument(skip(self))]
    pub fn cast_vote(&self, session_id: &str, voter_id: &str, vote: Vote) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        let Some(poll) = session.vote.as_mut() else {
            return Err(Rejection::NoVotePending.into());
        };
        poll.cast(voter_id, vote)?;

        let mut events = vec![ServerEvent::VoteUpdate(poll.tally())];
        if poll.is_complete() {
            let result = VoteResult::new(poll);
            if result.success {
                let coord = poll.coord;
                let target = poll.target_id.clone();
                session.board.clear_mark(&target, coord);
            }
            session.vote = None;
            info!(success = result.success, "Vote settled");
            events.push(ServerEvent::VoteResult(result));
        }
        self.commit(&session, events)
    }
}
