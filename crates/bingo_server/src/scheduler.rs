//! The single background task that drives every countdown.

use crate::rooms::Broadcaster;
use crate::store::SessionStore;
use crate::SessionEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Spawns the timer loop, calling [`SessionEngine::tick`] every `every`.
///
/// Ticks run on the blocking pool since the engine and its store are
/// synchronous. A tick that overruns delays the next one instead of bursting.
#[instrument(skip(engine))]
pub fn spawn_timer_loop<S, B>(engine: Arc<SessionEngine<S, B>>, every: Duration) -> JoinHandle<()>
where
    S: SessionStore + 'static,
    B: Broadcaster + 'static,
{
    info!(interval_ms = every.as_millis() as u64, "Starting timer loop");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let engine = Arc::clone(&engine);
            match tokio::task::spawn_blocking(move || engine.tick()).await {
                Ok(0) => {}
                Ok(visited) => debug!(visited, "Timer tick"),
                Err(err) => warn!(error = %err, "Timer tick panicked"),
            }
        }
    })
}
