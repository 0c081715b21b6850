// crates/nexus-router-store-sqlite/src/lib.rs
// ============================================================================
// Module: Nexus Router SQLite Store
// Description: Durable append-only EventStore backed by SQLite.
// Purpose: Persist runs and ordered per-run event streams.
// Dependencies: nexus-router-core, rusqlite, serde, serde_json, thiserror, uuid
// ============================================================================

//! ## Overview
//! This crate implements the [`nexus_router_core::EventStore`] contract on
//! SQLite. Sequence numbers are allocated inside a transaction per run, the
//! schema is versioned through a `store_meta` table, and the special path
//! `":memory:"` denotes an ephemeral in-process database that vanishes on
//! close.

mod store;

pub use store::SqliteEventStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
