// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for per-tenant configuration.
//!
//! The store is a key/value table: tenant id to JSON record. Missing
//! records mean the tenant runs on defaults; unknown JSON fields are
//! ignored on read so mixed-version processes can share a database.

pub mod database;
pub mod store;

pub use store::SqliteConfigStore;
