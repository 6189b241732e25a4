// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ConfigStore`] trait.

use async_trait::async_trait;
use jukebot_core::{ConfigStore, JukebotError, TenantConfig, TenantId};
use rusqlite::params;
use tracing::debug;

use crate::database::{map_tr_err, Database};

/// SQLite-backed tenant configuration store.
///
/// Records are JSON blobs keyed by tenant id. Unknown fields in stored
/// records survive a get/put cycle only as far as serde keeps them;
/// readers ignore them.
pub struct SqliteConfigStore {
    db: Database,
}

impl SqliteConfigStore {
    /// Opens the store at `path`, creating the schema if needed.
    pub async fn open(path: &str) -> Result<Self, JukebotError> {
        let db = Database::open(path).await?;
        debug!(path, "tenant config store opened");
        Ok(Self { db })
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantConfig>, JukebotError> {
        let tenant_id = tenant.0.clone();
        let raw: Option<String> = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT config FROM tenants WHERE tenant_id = ?1")?;
                let mut rows = stmt.query(params![tenant_id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get(0)?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(map_tr_err)?;

        match raw {
            Some(json) => {
                let config =
                    serde_json::from_str(&json).map_err(|e| JukebotError::Store {
                        source: Box::new(e),
                    })?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, tenant: &TenantId, config: &TenantConfig) -> Result<(), JukebotError> {
        let tenant_id = tenant.0.clone();
        let json = serde_json::to_string(config).map_err(|e| JukebotError::Store {
            source: Box::new(e),
        })?;

        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO tenants (tenant_id, config, updated_at)
                     VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ON CONFLICT(tenant_id) DO UPDATE SET
                         config = excluded.config,
                         updated_at = excluded.updated_at",
                    params![tenant_id, json],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(tenant = %tenant, "tenant config persisted");
        Ok(())
    }

    async fn close(&self) -> Result<(), JukebotError> {
        self.db.checkpoint().await?;
        debug!("config store WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebot_core::ChannelId;

    async fn open_temp_store() -> (tempfile::TempDir, SqliteConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tenants.db");
        let store = SqliteConfigStore::open(path.to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn get_missing_tenant_returns_none() {
        let (_dir, store) = open_temp_store().await;
        let got = store.get(&TenantId("g1".into())).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (_dir, store) = open_temp_store().await;
        let tenant = TenantId("g1".into());
        let config = TenantConfig {
            prefix: "!!".into(),
            listen_channels: vec![ChannelId("c1".into())],
            music_channel: Some(ChannelId("v1".into())),
            loudness: -18.0,
        };

        store.put(&tenant, &config).await.unwrap();
        let got = store.get(&tenant).await.unwrap().unwrap();
        assert_eq!(got, config);
    }

    #[tokio::test]
    async fn put_overwrites_existing_record() {
        let (_dir, store) = open_temp_store().await;
        let tenant = TenantId("g1".into());

        let mut config = TenantConfig::default();
        store.put(&tenant, &config).await.unwrap();

        config.prefix = "$".into();
        store.put(&tenant, &config).await.unwrap();

        let got = store.get(&tenant).await.unwrap().unwrap();
        assert_eq!(got.prefix, "$");
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let (_dir, store) = open_temp_store().await;
        let mut a = TenantConfig::default();
        a.prefix = "a!".into();
        let mut b = TenantConfig::default();
        b.prefix = "b!".into();

        store.put(&TenantId("a".into()), &a).await.unwrap();
        store.put(&TenantId("b".into()), &b).await.unwrap();

        assert_eq!(
            store.get(&TenantId("a".into())).await.unwrap().unwrap().prefix,
            "a!"
        );
        assert_eq!(
            store.get(&TenantId("b".into())).await.unwrap().unwrap().prefix,
            "b!"
        );
    }

    #[tokio::test]
    async fn stored_records_with_unknown_fields_still_load() {
        let (_dir, store) = open_temp_store().await;
        // Simulate a record written by a newer process.
        store
            .db
            .connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO tenants (tenant_id, config, updated_at)
                     VALUES ('g1', '{\"prefix\":\"$\",\"future\":true}', '2026-01-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let got = store.get(&TenantId("g1".into())).await.unwrap().unwrap();
        assert_eq!(got.prefix, "$");
        assert!(got.listen_channels.is_empty());
    }

    #[tokio::test]
    async fn close_checkpoints_without_error() {
        let (_dir, store) = open_temp_store().await;
        store
            .put(&TenantId("g1".into()), &TenantConfig::default())
            .await
            .unwrap();
        store.close().await.unwrap();
    }
}
