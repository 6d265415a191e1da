//! Core types and trait definitions for the epidemiological dataset store.
//!
//! This crate is deliberately free of HTTP, CSV, and database dependencies.
//! It holds the data model, the [`store::EpiStore`] abstraction, and the pure
//! algorithms that sit between parsing and storage: batch reconciliation,
//! query planning, and derived-series arithmetic.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod derive;
pub mod error;
pub mod kind;
pub mod query;
pub mod reconcile;
pub mod series;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
pub use kind::CaseKind;

/// A record paired with the integer id the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
  pub id:     i64,
  pub record: T,
}
