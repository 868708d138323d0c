//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use bingo_server::{
    Broadcaster, Clock, CreateSession, Joined, MemoryStore, Mode, ServerEvent, Session,
    SessionEngine, SessionId, SessionSnapshot, SessionStore, StoreError,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Arc<Self> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Arc::new(Self(Mutex::new(start)))
    }

    pub fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Broadcaster that keeps every event it is given.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(SessionId, ServerEvent)>>>,
}

impl Recorder {
    /// Drains recorded events.
    pub fn take(&self) -> Vec<ServerEvent> {
        self.events
            .lock()
            .unwrap()
            .drain(..)
            .map(|(_, event)| event)
            .collect()
    }

    /// Drains recorded events, keeping only their wire names.
    pub fn names(&self) -> Vec<&'static str> {
        self.take().iter().map(ServerEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Broadcaster for Recorder {
    fn broadcast(&self, session_id: &str, event: ServerEvent) {
        self.events
            .lock()
            .unwrap()
            .push((session_id.to_string(), event));
    }
}

/// Memory store whose saves can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_saves: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SessionStore for FlakyStore {
    fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        self.inner.load(id)
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::new("disk on fire"));
        }
        self.inner.save(session)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<SessionId>, StoreError> {
        self.inner.find_by_code(code)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn ids(&self) -> Result<Vec<SessionId>, StoreError> {
        self.inner.ids()
    }
}

pub type TestEngine = SessionEngine<FlakyStore, Recorder>;

pub fn engine() -> (TestEngine, Arc<ManualClock>) {
    let clock = ManualClock::new();
    let engine = SessionEngine::new(FlakyStore::default(), Recorder::default())
        .with_clock(clock.clone())
        .with_seed(42);
    (engine, clock)
}

pub fn request(mode: Mode, rules: &[&str], size: usize) -> CreateSession {
    CreateSession {
        host_name: "Host".to_string(),
        mode,
        color: (mode == Mode::Shared).then(|| "RED".to_string()),
        rules: rules.iter().map(|r| r.to_string()).collect(),
        board_size: Some(size),
        ..CreateSession::default()
    }
}

/// Creates a session and clears the creation broadcast.
pub fn create(engine: &TestEngine, request: CreateSession) -> Joined {
    let host = engine.create_session(request).unwrap();
    engine.broadcaster().clear();
    host
}

/// Joins a player and clears the join broadcast.
pub fn join(engine: &TestEngine, host: &Joined, name: &str, color: Option<&str>) -> Joined {
    let joined = engine.join(&host.code, name, color).unwrap();
    engine.broadcaster().clear();
    joined
}

pub fn snapshot(engine: &TestEngine, host: &Joined) -> SessionSnapshot {
    engine.attach(&host.session_id, &host.player_id).unwrap()
}

/// The last `state` event among `events`.
pub fn last_state(events: &[ServerEvent]) -> Option<&SessionSnapshot> {
    events.iter().rev().find_map(|event| match event {
        ServerEvent::State(snapshot) => Some(snapshot.as_ref()),
        _ => None,
    })
}
