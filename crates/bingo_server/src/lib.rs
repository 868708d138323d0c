//! Party bingo session engine.
//!
//! The server owns every session's authoritative state and arbitrates wins,
//! the countdown timer, and flag challenges between players.
//!
//! # Architecture
//!
//! - **Engine**: [`SessionEngine`] serializes actions per session and
//!   broadcasts a full snapshot after every successful mutation
//! - **Store**: [`SessionStore`] persistence, in memory or SQLite
//! - **Rooms**: [`Rooms`] fans events out to each session's connections
//! - **Scheduler**: one background task ticks every running countdown
//! - **Transport**: JSON over WebSocket plus a few HTTP lookups
//!
//! # Example
//!
//! ```
//! use bingo_server::{CreateSession, MemoryStore, Mode, Rooms, SessionEngine};
//!
//! # fn example() -> Result<(), bingo_server::EngineError> {
//! let engine = SessionEngine::new(MemoryStore::new(), Rooms::new()).with_seed(7);
//! let host = engine.create_session(CreateSession {
//!     host_name: "Ada".to_string(),
//!     mode: Mode::Solitary,
//!     rules: vec!["row".to_string()],
//!     ..CreateSession::default()
//! })?;
//! let guest = engine.join(&host.code, "Grace", None)?;
//! engine.mark(&guest.session_id, &guest.player_id, 0, 0)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod engine;
mod error;
mod events;
mod rooms;
mod scheduler;
mod session;
mod store;
mod transport;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Engine
pub use engine::{
    Clock, CreateSession, GameInfo, Ignored, Joined, Outcome, SessionEngine, SystemClock,
};
pub use error::{EngineError, Rejection};

// Crate-level exports - Events
pub use events::{
    PlayerView, ServerEvent, SessionSnapshot, TimerView, VoteResult, VoteStarted, VoteView,
    WinNotice,
};

// Crate-level exports - Rooms
pub use rooms::{Broadcaster, Rooms};

// Crate-level exports - Scheduler
pub use scheduler::spawn_timer_loop;

// Crate-level exports - Session aggregate
pub use session::{
    CHAT_HISTORY, ChatLog, ChatMessage, Color, FLAG_ALLOWANCE, MAX_CHAT_LEN, MAX_TIMER_SECS, Mode,
    Player, PlayerId, Role, SHARED_CAPACITY, SOLITARY_CAPACITY, Session, SessionBoard, SessionId,
    SessionSettings, Status, TimerState, TimerStatus, Vote, VoteState, VoteTally, Winner,
};

// Crate-level exports - Storage
pub use store::{MemoryStore, SessionStore, SqliteStore, StoreError};

// Crate-level exports - Transport
pub use transport::{
    AppState, Binding, ClientMessage, Handled, Reply, ServerEngine, handle_message, router,
};
