//! HTTP layer for the epidemiological dataset store.
//!
//! Exposes an axum [`Router`] backed by any [`EpiStore`]: tidy daily reports
//! under `/daily_reports/{dataset}` and wide time series under
//! `/time_series/{dataset}/{kind}`. Methods other than the ones routed below
//! answer 405.

pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get},
};
use epi_core::store::EpiStore;
use epi_csv::TypingOptions;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{daily_reports, time_series};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `EPI_*`
/// environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Uploads larger than this are refused with 413.
  pub max_body_bytes:        usize,
  /// Replace an uploaded `Active` of 0 with confirmed − deaths − recovered.
  pub derive_active_on_zero: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_owned(),
      port:                  8000,
      store_path:            PathBuf::from("epi.sqlite3"),
      max_body_bytes:        8 * 1024 * 1024,
      derive_active_on_zero: true,
    }
  }
}

impl ServerConfig {
  pub fn typing_options(&self) -> TypingOptions {
    TypingOptions { derive_active_on_zero: self.derive_active_on_zero }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: EpiStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the dataset server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: EpiStore + Clone + 'static,
{
  Router::new()
    .route(
      "/daily_reports/{dataset}",
      get(daily_reports::query::<S>)
        .post(daily_reports::upload::<S>)
        .delete(daily_reports::remove::<S>),
    )
    .route(
      "/time_series/{dataset}/{kind}",
      get(time_series::query::<S>).post(time_series::upload::<S>),
    )
    .route("/time_series/{dataset}", delete(time_series::remove::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
