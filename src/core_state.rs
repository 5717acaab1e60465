//! Process-wide state shared by every request handler.
//!
//! Handlers stay stateless: each one opens its own connection through
//! `CoreState::open_db`, and the database is the only shared resource.

use std::path::Path;
use std::time::Instant;

use rusqlite::Connection;

use crate::auth;
use crate::config::{ConfigError, Settings};
use crate::db::{self, DatabaseError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot prepare data directory: {0}")]
    DataDir(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

pub struct CoreState {
    pub settings: Settings,
    started_at: Instant,
}

impl CoreState {
    /// Wrap already-validated settings. Does not touch the database.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            started_at: Instant::now(),
        }
    }

    /// Prepare the data directory and schema, create the bootstrap admin
    /// if the office has no staff yet, and drop stale sessions.
    pub fn initialize(settings: Settings) -> Result<Self, CoreError> {
        if let Some(parent) = settings.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let state = Self::new(settings);
        let conn = state.open_db()?;

        match &state.settings.bootstrap_admin {
            Some(admin) => {
                auth::ensure_bootstrap_admin(&conn, admin, state.settings.password_iterations)?;
            }
            None if auth::count_users(&conn)? == 0 => {
                tracing::warn!(
                    "no staff accounts exist; set CONSULTORIO_ADMIN_USER and \
                     CONSULTORIO_ADMIN_PASSWORD to create one"
                );
            }
            None => {}
        }
        auth::purge_expired_sessions(&conn)?;

        tracing::info!(db = %state.database_path().display(), "core state ready");
        Ok(state)
    }

    /// Open a fresh connection. Migrations are applied on every open and
    /// are no-ops once the schema is current.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.settings.database_path).map_err(CoreError::Database)
    }

    pub fn database_path(&self) -> &Path {
        &self.settings.database_path
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
