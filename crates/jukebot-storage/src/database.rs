// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and
//! schema migration.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use jukebot_core::JukebotError;
use tokio_rusqlite::Connection;

/// Schema applied on open. The store is a single key/value table; the
/// config column holds the tenant's JSON record.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tenants (
    tenant_id  TEXT PRIMARY KEY,
    config     TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// A handle to the SQLite database backing the config store.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path`, applies
    /// PRAGMAs and the schema.
    pub async fn open(path: &str) -> Result<Self, JukebotError> {
        let connection = Connection::open(path).await.map_err(map_tr_err)?;

        connection
            .call(|conn| {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;
                     PRAGMA foreign_keys = ON;",
                )?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        Ok(Self { connection })
    }

    /// The underlying serialized connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Checkpoints the WAL. Called before close and on shutdown.
    pub async fn checkpoint(&self) -> Result<(), JukebotError> {
        self.connection
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> JukebotError {
    JukebotError::Store {
        source: Box::new(err),
    }
}
