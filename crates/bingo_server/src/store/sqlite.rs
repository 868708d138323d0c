//! SQLite-backed session store.
//!
//! Each session is one row: the aggregate is kept as a JSON document beside
//! its ID and join code.

use super::{SessionStore, StoreError, schema};
use crate::session::{Session, SessionId};
use chrono::{NaiveDateTime, Utc};
use derive_new::new;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Insertable, AsChangeset, new)]
#[diesel(table_name = schema::sessions)]
struct SessionRecord<'a> {
    id: &'a str,
    code: &'a str,
    state: String,
    updated_at: NaiveDateTime,
}

/// Session store on a single SQLite connection.
pub struct SqliteStore {
    db_path: String,
    conn: Mutex<SqliteConnection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (or creates) the database at `db_path` and applies migrations.
    ///
    /// Use `":memory:"` for a throwaway database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or a migration fails.
    #[instrument(skip(db_path), fields(db_path = tracing::field::Empty))]
    pub fn open(db_path: impl Into<String>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        tracing::Span::current().record("db_path", db_path.as_str());
        let mut conn = SqliteConnection::establish(&db_path)
            .map_err(|e| StoreError::new(format!("Failed to connect to '{}': {}", db_path, e)))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migrations failed: {}", e)))?;
        info!(path = %db_path, migrations = applied.len(), "Session store ready");
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, SqliteConnection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for SqliteStore {
    #[instrument(skip(self))]
    fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let state = schema::sessions::table
            .filter(schema::sessions::id.eq(id))
            .select(schema::sessions::state)
            .first::<String>(&mut *self.conn())
            .optional()?;
        match state {
            Some(state) => Ok(Some(serde_json::from_str(&state)?)),
            None => {
                debug!(session_id = id, "Session not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let record = SessionRecord::new(
            &session.id,
            &session.code,
            serde_json::to_string(session)?,
            Utc::now().naive_utc(),
        );
        diesel::insert_into(schema::sessions::table)
            .values(&record)
            .on_conflict(schema::sessions::id)
            .do_update()
            .set(&record)
            .execute(&mut *self.conn())?;
        debug!("Session saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn find_by_code(&self, code: &str) -> Result<Option<SessionId>, StoreError> {
        let id = schema::sessions::table
            .filter(schema::sessions::code.eq(code))
            .select(schema::sessions::id)
            .first::<String>(&mut *self.conn())
            .optional()?;
        Ok(id)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: &str) -> Result<(), StoreError> {
        diesel::delete(schema::sessions::table.filter(schema::sessions::id.eq(id)))
            .execute(&mut *self.conn())?;
        debug!("Session deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn ids(&self) -> Result<Vec<SessionId>, StoreError> {
        let ids = schema::sessions::table
            .select(schema::sessions::id)
            .load::<String>(&mut *self.conn())?;
        Ok(ids)
    }
}
