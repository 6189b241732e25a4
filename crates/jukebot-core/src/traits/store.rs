// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config store trait for per-tenant configuration persistence.

use async_trait::async_trait;

use crate::error::JukebotError;
use crate::types::{TenantConfig, TenantId};

/// Key/value persistence for [`TenantConfig`] records, keyed by tenant.
///
/// Values are JSON on the wire; unknown fields in stored records are
/// ignored on read. A missing record means the tenant uses defaults.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetches the stored record, or `None` when the tenant has never
    /// been persisted.
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantConfig>, JukebotError>;

    /// Upserts the record for a tenant.
    async fn put(&self, tenant: &TenantId, config: &TenantConfig) -> Result<(), JukebotError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), JukebotError>;
}
