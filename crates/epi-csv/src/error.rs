//! Error types for the epi-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Header shape or names wrong; the whole batch is rejected.
  #[error("malformed header: {0}")]
  Schema(String),

  /// A data row failed typing; the whole batch is rejected.
  #[error("malformed row at line {line}: {reason}")]
  Row { line: u64, reason: String },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("csv output error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
