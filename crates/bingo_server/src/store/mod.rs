//! Persistence collaborator for session aggregates.
//!
//! The engine treats a store as synchronous read-modify-write: it loads a
//! whole [`Session`], mutates it under the session lock, and saves it back
//! before broadcasting.

mod error;
mod memory;
mod schema;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::session::{Session, SessionId};

/// Load/save access to session records.
pub trait SessionStore: Send + Sync {
    /// Loads a session by ID.
    fn load(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Inserts or replaces a session.
    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Resolves a join code to a session ID.
    fn find_by_code(&self, code: &str) -> Result<Option<SessionId>, StoreError>;

    /// Removes a session. Removing a missing session is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// IDs of every stored session.
    fn ids(&self) -> Result<Vec<SessionId>, StoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        (**self).load(id)
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        (**self).save(session)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<SessionId>, StoreError> {
        (**self).find_by_code(code)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn ids(&self) -> Result<Vec<SessionId>, StoreError> {
        (**self).ids()
    }
}
