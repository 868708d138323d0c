//! Host timer controls and the expiry tick.

use super::{Ignored, Outcome, SessionEngine, lock};
use crate::events::{ServerEvent, TimerView, WinNotice};
use crate::rooms::Broadcaster;
use crate::store::SessionStore;
use crate::EngineError;
use bingo_board::{Rule, most_marked_winner};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
enum TimerAction {
    Start,
    Pause,
    Resume,
    Reset,
}

impl<S: SessionStore, B: Broadcaster> SessionEngine<S, B> {
    /// Starts the countdown. Host only; not while the round is over.
    #[instrument(skip(self))]
    pub fn start_timer(&self, session_id: &str, requester_id: &str) -> Result<Outcome, EngineError> {
        self.drive_timer(session_id, requester_id, TimerAction::Start)
    }

    /// Pauses a running countdown. Host only.
    #[instrument(skip(self))]
    pub fn pause_timer(&self, session_id: &str, requester_id: &str) -> Result<Outcome, EngineError> {
        self.drive_timer(session_id, requester_id, TimerAction::Pause)
    }

    /// Resumes a paused countdown. Host only; not while the round is over.
    #[instrument(skip(self))]
    pub fn resume_timer(&self, session_id: &str, requester_id: &str) -> Result<Outcome, EngineError> {
        self.drive_timer(session_id, requester_id, TimerAction::Resume)
    }

    /// Returns the countdown to not started. Host only.
    #[instrument(skip(self))]
    pub fn reset_timer(&self, session_id: &str, requester_id: &str) -> Result<Outcome, EngineError> {
        self.drive_timer(session_id, requester_id, TimerAction::Reset)
    }

    #[instrument(skip(self))]
    fn drive_timer(
        &self,
        session_id: &str,
        requester_id: &str,
        action: TimerAction,
    ) -> Result<Outcome, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let mut session = self.load(session_id)?;
        if !session.is_host(requester_id) {
            return self.ignore(Ignored::NotHost);
        }
        if !session.timer.enabled {
            return self.ignore(Ignored::TimerDisabled);
        }
        let now = self.now();
        let changed = match action {
            TimerAction::Start | TimerAction::Resume if !session.is_active() => {
                return self.ignore(Ignored::Ended);
            }
            TimerAction::Start => session.timer.start(now),
            TimerAction::Pause => session.timer.pause(now),
            TimerAction::Resume => session.timer.resume(now),
            TimerAction::Reset => session.timer.reset(),
        };
        if !changed {
            return self.ignore(Ignored::TimerState);
        }

        let view = TimerView::new(&session.timer, now);
        info!(status = ?view.status, remaining_secs = view.remaining_secs, "Timer changed");
        let event = match action {
            TimerAction::Start => ServerEvent::TimerStarted(view),
            TimerAction::Pause => ServerEvent::TimerPaused(view),
            TimerAction::Resume => ServerEvent::TimerResumed(view),
            TimerAction::Reset => ServerEvent::TimerReset(view),
        };
        self.commit(&session, vec![event])
    }

    /// Current timer for one member. Broadcasts nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownPlayer`] if the requester is not in the session.
    #[instrument(skip(self))]
    pub fn timer_sync(&self, session_id: &str, player_id: &str) -> Result<TimerView, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let session = self.load(session_id)?;
        if session.player(player_id).is_none() {
            return Err(EngineError::UnknownPlayer);
        }
        Ok(TimerView::new(&session.timer, self.now()))
    }

    /// IDs of sessions with a running countdown.
    #[instrument(skip(self))]
    pub fn running_timers(&self) -> Vec<String> {
        lock(&self.timers).keys().cloned().collect()
    }

    /// Checks every running countdown once.
    ///
    /// Returns the number of sessions visited. A failure on one session is
    /// logged and does not stop the others.
    #[instrument(skip(self))]
    pub fn tick(&self) -> usize {
        let now = self.now();
        let ids = self.running_timers();
        for id in &ids {
            if let Err(err) = self.tick_session(id, now) {
                warn!(session_id = %id, error = %err, "Timer tick failed");
            }
        }
        ids.len()
    }

    #[instrument(skip(self))]
    fn tick_session(&self, session_id: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let Some(mut session) = self.store.load(session_id)? else {
            debug!("Timer index entry for a missing session");
            self.forget(session_id);
            return Ok(());
        };
        if !session.is_active() || !session.timer.is_running() {
            debug!(session_id, "Dropping stale timer index entry");
            lock(&self.timers).remove(session_id);
            return Ok(());
        }

        if session.timer.remaining(now) > TimeDelta::zero() {
            let due = {
                let mut timers = lock(&self.timers);
                let last = timers.entry(session.id.clone()).or_insert(now);
                let due = now - *last >= self.sync_interval;
                if due {
                    *last = now;
                }
                due
            };
            if due {
                let view = TimerView::new(&session.timer, now);
                self.broadcaster
                    .broadcast(&session.id, ServerEvent::TimerUpdate(view));
            }
            return Ok(());
        }

        session.timer.expire(now);
        info!(session_id, "Timer expired");
        let mut events = vec![ServerEvent::TimerExpired(TimerView::new(&session.timer, now))];
        if session.rules.contains(Rule::MostMarked) {
            let winner = most_marked_winner(session.marked_counts()).map(|id| (id, Rule::MostMarked));
            session.end(winner, now);
            if let Some(won) = &session.winner {
                events.push(ServerEvent::Win(WinNotice {
                    player_name: won.name.clone(),
                    rule: won.rule.label().to_string(),
                }));
            }
        }
        self.commit(&session, events)?;
        Ok(())
    }
}
