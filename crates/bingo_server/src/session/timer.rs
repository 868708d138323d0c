//! Countdown timer with pause accounting.
//!
//! Remaining time is always derived from persisted wall-clock timestamps,
//! never from a tick counter, so any process can recompute it.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Longest countdown a session may configure: one week.
pub const MAX_TIMER_SECS: u64 = 7 * 24 * 60 * 60;

/// Lifecycle of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Configured but not yet started.
    #[default]
    NotStarted,
    /// Counting down.
    Running,
    /// Frozen until resumed.
    Paused,
    /// Reached zero.
    Expired,
}

/// Timer configuration and timestamps stored on a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    /// Whether the session has a timer at all.
    pub enabled: bool,
    /// Countdown length.
    pub duration_secs: u64,
    /// Current status.
    pub status: TimerStatus,
    /// When the countdown was started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the current pause began.
    pub paused_at: Option<DateTime<Utc>>,
    /// Total time spent paused, in milliseconds.
    pub accumulated_pause_ms: i64,
}

impl TimerState {
    /// A timer of the given length, or a disabled timer for `None` or zero.
    ///
    /// Lengths above [`MAX_TIMER_SECS`] are clamped to it.
    #[instrument]
    pub fn new(duration_secs: Option<u64>) -> Self {
        match duration_secs {
            Some(secs) if secs > 0 => {
                if secs > MAX_TIMER_SECS {
                    warn!(secs, max = MAX_TIMER_SECS, "Clamping timer length");
                }
                Self {
                    enabled: true,
                    duration_secs: secs.min(MAX_TIMER_SECS),
                    ..Self::default()
                }
            }
            _ => Self::default(),
        }
    }

    /// Configured length, clamped for records written before the cap existed.
    fn duration(&self) -> TimeDelta {
        i64::try_from(self.duration_secs.min(MAX_TIMER_SECS))
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::zero())
    }

    /// Whether the countdown is moving.
    pub fn is_running(&self) -> bool {
        self.enabled && self.status == TimerStatus::Running
    }

    /// Time left at `now`, never negative.
    ///
    /// `duration − (now − started_at − accumulated_pause)`, where `now` is
    /// pinned to `paused_at` while paused.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        let duration = self.duration();
        let Some(started_at) = self.started_at else {
            return match self.status {
                TimerStatus::Expired => TimeDelta::zero(),
                _ => duration,
            };
        };
        let effective_now = match (self.status, self.paused_at) {
            (TimerStatus::Paused, Some(paused_at)) => paused_at,
            _ => now,
        };
        let paused = TimeDelta::try_milliseconds(self.accumulated_pause_ms).unwrap_or(TimeDelta::zero());
        let elapsed = effective_now - started_at - paused;
        (duration - elapsed).max(TimeDelta::zero())
    }

    /// Whole seconds left, rounded up so zero means expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let ms = self.remaining(now).num_milliseconds().max(0) as u64;
        ms.div_ceil(1000)
    }

    /// Not started → running.
    #[instrument(skip(self))]
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if !self.enabled || self.status != TimerStatus::NotStarted {
            return false;
        }
        self.status = TimerStatus::Running;
        self.started_at = Some(now);
        self.paused_at = None;
        self.accumulated_pause_ms = 0;
        debug!(duration_secs = self.duration_secs, "Timer started");
        true
    }

    /// Running → paused.
    #[instrument(skip(self))]
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = TimerStatus::Paused;
        self.paused_at = Some(now);
        true
    }

    /// Paused → running, banking the pause length.
    #[instrument(skip(self))]
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if !self.enabled || self.status != TimerStatus::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_pause_ms += (now - paused_at).num_milliseconds().max(0);
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Running, paused, or expired → not started.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> bool {
        if !self.enabled || self.status == TimerStatus::NotStarted {
            return false;
        }
        self.clear();
        true
    }

    /// Running → expired once no time is left.
    #[instrument(skip(self))]
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running() || self.remaining(now) > TimeDelta::zero() {
            return false;
        }
        self.status = TimerStatus::Expired;
        true
    }

    /// Freezes a running countdown when the game ends by another path.
    #[instrument(skip(self))]
    pub fn halt(&mut self, now: DateTime<Utc>) {
        if self.is_running() {
            self.status = TimerStatus::Paused;
            self.paused_at = Some(now);
        }
    }

    /// Returns to not started without needing a prior start, for a new round.
    pub fn clear(&mut self) {
        self.status = TimerStatus::NotStarted;
        self.started_at = None;
        self.paused_at = None;
        self.accumulated_pause_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_pause_resume_accounting() {
        let mut timer = TimerState::new(Some(300));
        assert!(timer.start(at(0)));
        assert!(timer.pause(at(100)));
        assert_eq!(timer.remaining_secs(at(130)), 200);
        assert!(timer.resume(at(150)));
        assert_eq!(timer.remaining_secs(at(200)), 150);
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let mut timer = TimerState::new(Some(10));
        timer.start(at(0));
        assert_eq!(timer.remaining_secs(at(9)), 1);
        assert_eq!(timer.remaining_secs(at(25)), 0);
        assert!(timer.expire(at(25)));
        assert_eq!(timer.status, TimerStatus::Expired);
    }

    #[test]
    fn test_transitions_refused_out_of_order() {
        let mut timer = TimerState::new(Some(60));
        assert!(!timer.pause(at(0)));
        assert!(!timer.resume(at(0)));
        assert!(!timer.reset());
        timer.start(at(0));
        assert!(!timer.start(at(1)));
        assert!(!timer.expire(at(30)));
        assert!(timer.reset());
        assert_eq!(timer, TimerState::new(Some(60)));
    }

    #[test]
    fn test_disabled_timer_never_starts() {
        let mut timer = TimerState::new(None);
        assert!(!timer.start(at(0)));
        assert_eq!(timer.status, TimerStatus::NotStarted);
    }

    #[test]
    fn test_halt_freezes_countdown() {
        let mut timer = TimerState::new(Some(100));
        timer.start(at(0));
        timer.halt(at(40));
        assert_eq!(timer.status, TimerStatus::Paused);
        assert_eq!(timer.remaining_secs(at(90)), 60);
    }

    #[test]
    fn test_oversized_length_is_clamped() {
        let timer = TimerState::new(Some(u64::MAX));
        assert!(timer.enabled);
        assert_eq!(timer.duration_secs, MAX_TIMER_SECS);
        assert_eq!(timer.remaining_secs(at(0)), MAX_TIMER_SECS);
    }

    #[test]
    fn test_stored_oversized_length_does_not_overflow() {
        let mut timer = TimerState {
            enabled: true,
            duration_secs: 10_000_000_000_000_000,
            ..TimerState::default()
        };
        timer.start(at(0));
        assert_eq!(timer.remaining_secs(at(10)), MAX_TIMER_SECS - 10);
    }
}
