//! Record store abstractions.
//!
//! A record store is the engine's only source of truth for "has this
//! migration run". It owns the tracking table, executes the schema
//! statements issued by migration actions and exposes the transaction
//! primitives used when transactional mode is enabled.
//!
//! # Store Providers
//!
//! Stores implement [`RecordStoreProvider`] and are handed to the engine
//! wrapped in a [`RecordStore`]. This crate ships:
//! - **In-Memory Store**: [`memory::InMemoryStore`] for tests and embedders
//!   that keep their schema in process
//!
//! The `strata-sqlite-adapter` crate provides a SQLite-backed store.

pub mod memory;
mod record_store;

pub use record_store::*;
