//! # Document store clients
//!
//! Implementations of [`DatabaseClient`] on top of concrete database backends. Each backend is
//! gated behind its own cargo feature.
//!
//! [`DatabaseClient`]: crate::db::interface::DatabaseClient

#[cfg(feature = "sqlite3")]
pub mod sqlite;
