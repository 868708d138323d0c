//! Session state machine.
//!
//! Every operation follows the same shape: take the session's lock, load the
//! aggregate, apply the action, save, then broadcast. A failed save returns
//! before anything is broadcast, so the room never sees state the store
//! does not hold.

mod chat;
mod play;
mod timer;
mod vote;

use crate::events::{ServerEvent, SessionSnapshot};
use crate::rooms::Broadcaster;
use crate::session::{
    ChatLog, Color, FLAG_ALLOWANCE, Mode, Player, PlayerId, Role, Session, SessionBoard,
    SessionId, SessionSettings, Status, TimerState,
};
use crate::store::{SessionStore, StoreError};
use crate::{EngineError, Rejection};
use bingo_board::{
    BoardSize, Grid, MarkSet, PromptCatalog, PromptPool, RuleSet, generate_card, generate_distinct,
};
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Characters used in join codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a join code.
const CODE_LEN: usize = 6;

/// Join codes drawn before giving up on finding a free one.
const CODE_ATTEMPTS: usize = 32;

/// Default spacing of `timerUpdate` broadcasts.
const DEFAULT_SYNC_INTERVAL_SECS: i64 = 10;

/// Source of wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why an action was dropped without a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Ignored {
    /// The round has ended.
    #[display("round has ended")]
    Ended,
    /// The round is still running.
    #[display("round is still active")]
    NotEnded,
    /// Coordinates are off the board.
    #[display("coordinate off board")]
    OffBoard,
    /// Another player holds the shared cell.
    #[display("cell held by another player")]
    Blocked,
    /// A host-only action from a member.
    #[display("requester is not the host")]
    NotHost,
    /// The acting player is not in the session.
    #[display("player not in session")]
    NotMember,
    /// The target player is missing or unknown.
    #[display("unknown target player")]
    UnknownTarget,
    /// The region selector did not validate.
    #[display("invalid region selector")]
    BadRegion,
    /// Rerolls are switched off.
    #[display("rerolls disabled")]
    RerollsDisabled,
    /// No replacement prompt was left.
    #[display("prompt pool exhausted")]
    PoolExhausted,
    /// The session has no timer.
    #[display("timer disabled")]
    TimerDisabled,
    /// The timer is not in a state that allows the transition.
    #[display("timer transition not allowed")]
    TimerState,
    /// Chat text was empty or too long.
    #[display("chat message empty or too long")]
    BadMessage,
}

/// Result of an action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed, was saved, and was broadcast.
    Applied,
    /// Silent no-op; nothing was saved or broadcast.
    Ignored(Ignored),
}

/// Options for a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSession {
    /// Host's display name.
    pub host_name: String,
    /// Deal mode.
    pub mode: Mode,
    /// Host color, required for shared mode.
    pub color: Option<String>,
    /// Wire names of enabled rules; unknown names are dropped.
    pub rules: Vec<String>,
    /// Board edge; missing or out-of-range values give 5.
    pub board_size: Option<usize>,
    /// Custom prompts, used instead of any catalog pool.
    pub custom_prompts: Option<Vec<String>>,
    /// Catalog category to deal from.
    pub category: Option<String>,
    /// Catalog game to deal from.
    pub game: Option<String>,
    /// Countdown length; absent or zero means no timer.
    pub timer_secs: Option<u64>,
    /// Whether flags are allowed (default on).
    pub flags_enabled: Option<bool>,
    /// Whether rerolls are allowed (default on).
    pub rerolls_enabled: Option<bool>,
}

/// Identity handed to a player after create or join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    /// Session ID.
    pub session_id: SessionId,
    /// The new player's ID.
    pub player_id: PlayerId,
    /// Join code.
    pub code: String,
}

/// Public lobby information for a join code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    /// Deal mode.
    pub mode: Mode,
    /// Colors already claimed.
    pub taken_colors: Vec<Color>,
    /// Players present.
    pub player_count: usize,
    /// Player cap.
    pub max_players: usize,
    /// Host's color, if any.
    pub host_color: Option<Color>,
}

/// Authoritative owner of every session's game state.
pub struct SessionEngine<S, B> {
    store: S,
    broadcaster: B,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    default_pool: PromptPool,
    catalog: PromptCatalog,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    /// Sessions with a running countdown, with the last sync broadcast time.
    timers: Mutex<HashMap<SessionId, DateTime<Utc>>>,
    sync_interval: TimeDelta,
}

impl<S, B> std::fmt::Debug for SessionEngine<S, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("clock", &self.clock)
            .field("default_pool", &self.default_pool.len())
            .field("sync_interval", &self.sync_interval)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: SessionStore, B: Broadcaster> SessionEngine<S, B> {
    /// Creates an engine over a store and a broadcaster, using the system
    /// clock, an entropy-seeded RNG, and the built-in prompts.
    #[instrument(skip_all)]
    pub fn new(store: S, broadcaster: B) -> Self {
        info!("Creating session engine");
        Self {
            store,
            broadcaster,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            default_pool: PromptPool::builtin(),
            catalog: PromptCatalog::default(),
            locks: Mutex::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            sync_interval: TimeDelta::seconds(DEFAULT_SYNC_INTERVAL_SECS),
        }
    }

    /// Replaces the clock.
    #[instrument(skip(self, clock))]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seeds the RNG for reproducible deals.
    #[instrument(skip(self))]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Replaces the pool used when a session brings none.
    #[instrument(skip(self, pool), fields(prompts = pool.len()))]
    pub fn with_default_pool(mut self, pool: PromptPool) -> Self {
        self.default_pool = pool;
        self
    }

    /// Makes catalog categories and games available to new sessions.
    #[instrument(skip(self, catalog), fields(prompts = catalog.len()))]
    pub fn with_catalog(mut self, catalog: PromptCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets the spacing of periodic `timerUpdate` broadcasts.
    #[instrument(skip(self))]
    pub fn with_sync_interval(mut self, secs: u64) -> Self {
        self.sync_interval = TimeDelta::seconds(secs as i64);
        self
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The broadcaster.
    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// The prompt catalog.
    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Sessions currently holding a lock entry.
    pub fn gated_sessions(&self) -> usize {
        lock(&self.locks).len()
    }

    #[instrument(skip(self))]
    fn gate(&self, session_id: &str) -> Arc<Mutex<()>> {
        lock(&self.locks)
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Drops the lock and timer entries of a session the store does not hold.
    #[instrument(skip(self))]
    fn forget(&self, session_id: &str) {
        lock(&self.locks).remove(session_id);
        lock(&self.timers).remove(session_id);
    }

    /// Loads under the session's gate, pruning the gate for unknown IDs.
    #[instrument(skip(self))]
    fn load(&self, session_id: &str) -> Result<Session, EngineError> {
        match self.store.load(session_id)? {
            Some(session) => Ok(session),
            None => {
                debug!("Unknown session");
                self.forget(session_id);
                Err(EngineError::UnknownSession)
            }
        }
    }

    /// Saves, then broadcasts `events` followed by one full snapshot.
    #[instrument(skip(self, session, events), fields(session_id = %session.id, events = events.len()))]
    fn commit(&self, session: &Session, events: Vec<ServerEvent>) -> Result<Outcome, EngineError> {
        self.store.save(session)?;
        self.sync_timer_index(session);
        for event in events {
            self.broadcaster.broadcast(&session.id, event);
        }
        let snapshot = SessionSnapshot::new(session, self.now());
        self.broadcaster
            .broadcast(&session.id, ServerEvent::State(Box::new(snapshot)));
        Ok(Outcome::Applied)
    }

    /// Keeps the running-timer index in step with the saved session.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    fn sync_timer_index(&self, session: &Session) {
        let mut timers = lock(&self.timers);
        if session.is_active() && session.timer.is_running() {
            timers.entry(session.id.clone()).or_insert_with(|| self.clock.now());
        } else {
            timers.remove(&session.id);
        }
    }

    #[instrument(skip(self))]
    fn ignore(&self, reason: Ignored) -> Result<Outcome, EngineError> {
        debug!(%reason, "Action ignored");
        Ok(Outcome::Ignored(reason))
    }

    /// Re-indexes running timers after a restart.
    ///
    /// The scheduler only visits indexed sessions, so a store that outlives
    /// the process needs this once at startup.
    #[instrument(skip(self))]
    pub fn recover(&self) -> Result<usize, EngineError> {
        let mut recovered = 0;
        for id in self.store.ids()? {
            if let Some(session) = self.store.load(&id)?
                && session.is_active()
                && session.timer.is_running()
            {
                lock(&self.timers).insert(id, self.now());
                recovered += 1;
            }
        }
        info!(recovered, "Recovered running timers");
        Ok(recovered)
    }

    /// Creates a session with its host as the first player.
    ///
    /// # Errors
    ///
    /// [`Rejection`] for a blank host name, a missing or bad shared-mode
    /// color, or a pool too small for the board; [`EngineError::Store`] if
    /// saving fails.
    #[instrument(skip(self, request), fields(host = %request.host_name, mode = ?request.mode))]
    pub fn create_session(&self, request: CreateSession) -> Result<Joined, EngineError> {
        let host_name = request.host_name.trim().to_string();
        if host_name.is_empty() {
            return Err(Rejection::NameRequired.into());
        }
        let color = match request.mode {
            Mode::Shared => Some(parse_color(request.color.as_deref())?),
            Mode::Solitary => None,
        };
        let size = BoardSize::resolve(request.board_size);
        let pool = self.select_pool(&request);
        if let Some(pool) = &pool
            && pool.len() < size.cells()
        {
            warn!(pool = pool.len(), needed = size.cells(), "Custom pool too small");
            return Err(bingo_board::BoardError::PoolTooSmall {
                needed: size.cells(),
                available: pool.len(),
            }
            .into());
        }

        let now = self.now();
        let id = uuid::Uuid::new_v4().to_string();
        let host_id = uuid::Uuid::new_v4().to_string();
        let code = self.fresh_code()?;
        let board = {
            let deal_from = pool.as_ref().unwrap_or(&self.default_pool);
            let mut rng = lock(&self.rng);
            match request.mode {
                Mode::Solitary => SessionBoard::Solitary {
                    cards: BTreeMap::from([(host_id.clone(), generate_card(deal_from, size, &mut *rng)?)]),
                },
                Mode::Shared => SessionBoard::Shared {
                    grid: generate_card(deal_from, size, &mut *rng)?,
                    marks: BTreeMap::from([(host_id.clone(), MarkSet::new())]),
                },
            }
        };
        let defaults = SessionSettings::default();
        let session = Session {
            id: id.clone(),
            code: code.clone(),
            status: Status::Active,
            rules: RuleSet::parse_lenient(&request.rules),
            settings: SessionSettings {
                flags_enabled: request.flags_enabled.unwrap_or(defaults.flags_enabled),
                rerolls_enabled: request.rerolls_enabled.unwrap_or(defaults.rerolls_enabled),
            },
            size,
            pool,
            winner: None,
            timer: TimerState::new(request.timer_secs),
            players: vec![Player {
                id: host_id.clone(),
                name: host_name,
                role: Role::Host,
                color,
                flags_left: FLAG_ALLOWANCE,
                joined_at: now,
            }],
            board,
            vote: None,
            chat: ChatLog::default(),
            created_at: now,
        };

        let gate = self.gate(&id);
        let _guard = lock(&gate);
        self.commit(&session, Vec::new())
            .inspect_err(|_| self.forget(&id))?;
        info!(session_id = %id, code = %code, "Session created");
        Ok(Joined {
            session_id: id,
            player_id: host_id,
            code,
        })
    }

    #[instrument(skip(self, request))]
    fn select_pool(&self, request: &CreateSession) -> Option<PromptPool> {
        if let Some(prompts) = &request.custom_prompts {
            return Some(PromptPool::new(prompts.iter().cloned()));
        }
        if let Some(category) = &request.category {
            return Some(self.catalog.category_pool(category));
        }
        request.game.as_ref().map(|game| self.catalog.game_pool(game))
    }

    #[instrument(skip(self))]
    fn fresh_code(&self) -> Result<String, EngineError> {
        for _ in 0..CODE_ATTEMPTS {
            let code: String = {
                let mut rng = lock(&self.rng);
                (0..CODE_LEN)
                    .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                    .collect()
            };
            if self.store.find_by_code(&code)?.is_none() {
                return Ok(code);
            }
        }
        Err(StoreError::new("No free join code").into())
    }

    /// Adds a player to the session with the given join code.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownSession`] for an unknown code; [`Rejection`]
    /// if the session is full, the name or color is taken, or a shared-mode
    /// color is missing or invalid.
    #[instrument(skip(self, color))]
    pub fn join(&self, code: &str, name: &str, color: Option<&str>) -> Result<Joined, EngineError> {
        let code = code.trim().to_uppercase();
        let session_id = self
            .store
            .find_by_code(&code)?
            .ok_or(EngineError::UnknownSession)?;
        let gate = self.gate(&session_id);
        let _guard = lock(&gate);
        let mut session = self.load(&session_id)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::NameRequired.into());
        }
        let capacity = session.mode().capacity();
        if session.players.len() >= capacity {
            warn!(capacity, "Session full");
            return Err(Rejection::SessionFull { capacity }.into());
        }
        if session.players.iter().any(|p| p.name == name) {
            return Err(Rejection::NameTaken.into());
        }
        let color = match session.mode() {
            Mode::Shared => {
                let color = parse_color(color)?;
                if session.taken_colors().contains(&color) {
                    return Err(Rejection::ColorTaken.into());
                }
                Some(color)
            }
            Mode::Solitary => None,
        };

        let player_id = uuid::Uuid::new_v4().to_string();
        let pool = session.pool.as_ref().unwrap_or(&self.default_pool);
        match &mut session.board {
            SessionBoard::Solitary { cards } => {
                let issued: Vec<&Grid> = cards.values().collect();
                let card = generate_distinct(pool, session.size, &issued, &mut *lock(&self.rng))?;
                cards.insert(player_id.clone(), card);
            }
            SessionBoard::Shared { marks, .. } => {
                marks.insert(player_id.clone(), MarkSet::new());
            }
        }
        session.players.push(Player {
            id: player_id.clone(),
            name: name.to_string(),
            role: Role::Member,
            color,
            flags_left: FLAG_ALLOWANCE,
            joined_at: self.now(),
        });

        self.commit(&session, Vec::new())?;
        info!(session_id = %session_id, player_id = %player_id, "Player joined");
        Ok(Joined {
            session_id,
            player_id,
            code,
        })
    }

    /// Current snapshot for a reconnecting member. Broadcasts nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownPlayer`] if the player is not in the session.
    #[instrument(skip(self))]
    pub fn attach(&self, session_id: &str, player_id: &str) -> Result<SessionSnapshot, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        let session = self.load(session_id)?;
        if session.player(player_id).is_none() {
            return Err(EngineError::UnknownPlayer);
        }
        Ok(SessionSnapshot::new(&session, self.now()))
    }

    /// Current snapshot of a session.
    #[instrument(skip(self))]
    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, EngineError> {
        let gate = self.gate(session_id);
        let _guard = lock(&gate);
        Ok(SessionSnapshot::new(&self.load(session_id)?, self.now()))
    }

    /// Lobby information for a join code.
    #[instrument(skip(self))]
    pub fn game_info(&self, code: &str) -> Result<GameInfo, EngineError> {
        let session_id = self
            .store
            .find_by_code(&code.trim().to_uppercase())?
            .ok_or(EngineError::UnknownSession)?;
        let session = self.load(&session_id)?;
        Ok(GameInfo {
            mode: session.mode(),
            taken_colors: session.taken_colors(),
            player_count: session.players.len(),
            max_players: session.mode().capacity(),
            host_color: session
                .players
                .iter()
                .find(|p| p.role == Role::Host)
                .and_then(|p| p.color),
        })
    }

    /// Destroys a session and everything scoped to it.
    #[instrument(skip(self))]
    pub fn remove_session(&self, session_id: &str) -> Result<(), EngineError> {
        {
            let gate = self.gate(session_id);
            let _guard = lock(&gate);
            self.store.delete(session_id)?;
            lock(&self.timers).remove(session_id);
        }
        lock(&self.locks).remove(session_id);
        self.broadcaster.close(session_id);
        info!("Session removed");
        Ok(())
    }
}

#[instrument]
fn parse_color(raw: Option<&str>) -> Result<Color, Rejection> {
    let raw = raw
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(Rejection::ColorRequired)?;
    raw.to_uppercase()
        .parse::<Color>()
        .map_err(|_| Rejection::InvalidColor)
}
