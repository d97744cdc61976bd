//! # Document storage
//!
//! [`interface`] defines the store API used by the HTTP layer; [`clients`] holds its backends.

pub mod clients;
pub mod interface;
