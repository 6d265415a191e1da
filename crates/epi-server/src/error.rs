//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad header, bad row, bad path token, or bad query parameter.
  #[error("malformed request: {0}")]
  Malformed(String),
  #[error("{what} not found: {dataset}")]
  NotFound { what: &'static str, dataset: String },
  #[error("request body exceeds {0} bytes")]
  PayloadTooLarge(usize),
  #[error("render error: {0}")]
  Render(#[source] epi_csv::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

impl From<epi_core::Error> for Error {
  fn from(e: epi_core::Error) -> Self { Error::Malformed(e.to_string()) }
}

impl From<epi_csv::Error> for Error {
  fn from(e: epi_csv::Error) -> Self {
    match e {
      epi_csv::Error::Schema(_) | epi_csv::Error::Row { .. } | epi_csv::Error::Csv(_) => {
        Error::Malformed(e.to_string())
      }
      epi_csv::Error::Io(_) | epi_csv::Error::Json(_) => Error::Render(e),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Malformed(msg) => {
        (StatusCode::BAD_REQUEST, format!("Malformed request: {msg}")).into_response()
      }
      e @ Error::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
      e @ Error::PayloadTooLarge(_) => {
        (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response()
      }
      Error::Render(e) => {
        tracing::error!("render error: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
      }
      Error::Store(e) => {
        tracing::error!("store error: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
      }
    }
  }
}
