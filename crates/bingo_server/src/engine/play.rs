//! Marking, rerolls, and rounds.

use super::{Ignored, Outcome, SessionEngine, lock};
use crate::events::{ServerEvent, WinNotice};
use crate::rooms::Broadcaster;
use crate::session::{PlayerId, SessionBoard, Status};
use crate::store::SessionStore;
use crate::EngineError;
use bingo_board::{
    Coord, Grid, MarkSet, RegionRequest, Rule, SharedMark, evaluate, generate_card,
    generate_distinct, most_marked_winner,
};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

impl<S: SessionStore, B: Broadcaster> SessionEngine<S, B> {
    /// Toggles a player's mark and checks for a win.
    ///
    /// Coordinates are zero-based. Ended rounds, off-board coordinates, and
    /// shared cells held by someone else are silent no-ops.
    #[instrument(skip(self))]
    pub fn mark(
        &self,
        session_id: &str,
        player_id: &str,
        row: usize,
        col: usize,
    ) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        if !session.is_active() {
            return self.ignore(Ignored::Ended);
        }
        if session.player(player_id).is_none() {
            return self.ignore(Ignored::NotMember);
        }
        let size = session.size;
        let coord = Coord::new(row, col);
        if !size.contains(coord) {
            return self.ignore(Ignored::OffBoard);
        }

        let rules = &session.rules;
        let winner: Option<(PlayerId, Rule)> = match &mut session.board {
            SessionBoard::Solitary { cards } => {
                let Some(card) = cards.get_mut(player_id) else {
                    return self.ignore(Ignored::NotMember);
                };
                card.toggle_mark(coord);
                evaluate(&card.marks(), size, rules)
                    .rule
                    .map(|rule| (player_id.to_string(), rule))
            }
            SessionBoard::Shared { marks, .. } => {
                let mut mine = marks.remove(player_id).unwrap_or_default();
                let result = mine.mark_shared(size, coord, marks.values());
                let check = evaluate(&mine.to_matrix(size), size, rules);
                marks.insert(player_id.to_string(), mine);
                if result == SharedMark::Blocked {
                    return self.ignore(Ignored::Blocked);
                }
                if let Some(rule) = check.rule {
                    Some((player_id.to_string(), rule))
                } else if rules.contains(Rule::MostMarked)
                    && size.coords().all(|c| marks.values().any(|m| m.contains(c)))
                {
                    let counts = session
                        .players
                        .iter()
                        .map(|p| (p.id.clone(), marks.get(&p.id).map_or(0, MarkSet::len)));
                    let leader = most_marked_winner(counts);
                    if leader.is_none() {
                        info!("Shared card full with a tie for most cells");
                    }
                    leader.map(|id| (id, Rule::MostMarked))
                } else {
                    None
                }
            }
        };

        let mut events = Vec::new();
        if let Some(winner) = winner {
            session.end(Some(winner), self.now());
            if let Some(won) = &session.winner {
                info!(winner = %won.name, rule = won.rule.label(), "Round won");
                events.push(ServerEvent::Win(WinNotice {
                    player_name: won.name.clone(),
                    rule: won.rule.label().to_string(),
                }));
            }
        }
        self.commit(&session, events)
    }

    /// Replaces prompts in a region. Host only.
    ///
    /// In solitary mode only `target`'s card changes. In shared mode the one
    /// card changes and every player's marks on replaced cells are dropped.
    #[instrument(skip(self, region), fields(kind = %region.kind))]
    pub fn reroll(
        &self,
        session_id: &str,
        requester_id: &str,
        target: Option<&str>,
        region: &RegionRequest,
    ) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        if !session.is_host(requester_id) {
            return self.ignore(Ignored::NotHost);
        }
        if !session.is_active() {
            return self.ignore(Ignored::Ended);
        }
        if !session.settings.rerolls_enabled {
            return self.ignore(Ignored::RerollsDisabled);
        }
        let size = session.size;
        let Some(selector) = region.resolve(size) else {
            return self.ignore(Ignored::BadRegion);
        };

        let mut rng = lock(&self.rng);
        let coords = selector.coords(size, &mut *rng);
        let pool = session.pool.as_ref().unwrap_or(&self.default_pool);
        let replaced = match &mut session.board {
            SessionBoard::Solitary { cards } => {
                let Some(card) = target.and_then(|id| cards.get_mut(id)) else {
                    return self.ignore(Ignored::UnknownTarget);
                };
                bingo_board::reroll(card, &coords, pool, &mut *rng)
            }
            SessionBoard::Shared { grid, marks } => {
                let replaced = bingo_board::reroll(grid, &coords, pool, &mut *rng);
                for set in marks.values_mut() {
                    set.release_all(&replaced);
                }
                replaced
            }
        };
        drop(rng);

        if replaced.is_empty() {
            warn!("No prompts left to reroll with");
            return self.ignore(Ignored::PoolExhausted);
        }
        info!(replaced = replaced.len(), requested = coords.len(), "Rerolled");
        self.commit(&session, Vec::new())
    }

    /// Deals fresh boards after a finished round. Host only.
    ///
    /// Clears marks, the winner, and any open poll, and returns the timer to
    /// not started. Flag budgets carry over.
    #[instrument(skip(self))]
    pub fn new_round(&self, session_id: &str, requester_id: &str) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        if !session.is_host(requester_id) {
            return self.ignore(Ignored::NotHost);
        }
        if session.is_active() {
            return self.ignore(Ignored::NotEnded);
        }

        let size = session.size;
        let pool = session.prompt_pool(&self.default_pool);
        let board = {
            let mut rng = lock(&self.rng);
            match &session.board {
                SessionBoard::Solitary { .. } => {
                    let mut cards: BTreeMap<PlayerId, Grid> = BTreeMap::new();
                    for player in &session.players {
                        let issued: Vec<&Grid> = cards.values().collect();
                        let card = generate_distinct(pool, size, &issued, &mut *rng)?;
                        cards.insert(player.id.clone(), card);
                    }
                    SessionBoard::Solitary { cards }
                }
                SessionBoard::Shared { .. } => SessionBoard::Shared {
                    grid: generate_card(pool, size, &mut *rng)?,
                    marks: session
                        .players
                        .iter()
                        .map(|p| (p.id.clone(), MarkSet::new()))
                        .collect(),
                },
            }
        };

        session.board = board;
        session.status = Status::Active;
        session.winner = None;
        session.vote = None;
        session.timer.clear();
        info!("New round started");
        self.commit(&session, Vec::new())
    }
}
