//! Core types, the relationship state machine, and trait definitions for
//! Amity.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod edge;
pub mod error;
pub mod machine;
pub mod memory;
pub mod query;
pub mod relation;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
