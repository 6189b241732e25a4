// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory config store for deterministic testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use jukebot_core::{ConfigStore, JukebotError, TenantConfig, TenantId};

/// In-memory [`ConfigStore`] that records every write.
#[derive(Default)]
pub struct MockStore {
    records: Mutex<HashMap<TenantId, TenantConfig>>,
    writes: Mutex<Vec<(TenantId, TenantConfig)>>,
    closed: Mutex<bool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored record.
    pub async fn seed(&self, tenant: TenantId, config: TenantConfig) {
        self.records.lock().await.insert(tenant, config);
    }

    /// Every `put` call in order.
    pub async fn writes(&self) -> Vec<(TenantId, TenantConfig)> {
        self.writes.lock().await.clone()
    }

    /// The stored record, or defaults when none exists.
    pub async fn get_config(&self, tenant: &TenantId) -> TenantConfig {
        self.records
            .lock()
            .await
            .get(tenant)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }
}

#[async_trait]
impl ConfigStore for MockStore {
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantConfig>, JukebotError> {
        Ok(self.records.lock().await.get(tenant).cloned())
    }

    async fn put(&self, tenant: &TenantId, config: &TenantConfig) -> Result<(), JukebotError> {
        self.records
            .lock()
            .await
            .insert(tenant.clone(), config.clone());
        self.writes
            .lock()
            .await
            .push((tenant.clone(), config.clone()));
        Ok(())
    }

    async fn close(&self) -> Result<(), JukebotError> {
        *self.closed.lock().await = true;
        Ok(())
    }
}
