//! In-process session store.

use super::{SessionStore, StoreError};
use crate::session::{Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

/// Sessions held in a shared map; loads hand out clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self))]
    fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let session = self.sessions().get(id).cloned();
        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }
        Ok(session)
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions().insert(session.id.clone(), session.clone());
        debug!("Session saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn find_by_code(&self, code: &str) -> Result<Option<SessionId>, StoreError> {
        Ok(self
            .sessions()
            .values()
            .find(|s| s.code == code)
            .map(|s| s.id.clone()))
    }

    #[instrument(skip(self))]
    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions().remove(id);
        Ok(())
    }

    #[instrument(skip(self))]
    fn ids(&self) -> Result<Vec<SessionId>, StoreError> {
        Ok(self.sessions().keys().cloned().collect())
    }
}
