//! Error types for `epi-core`.

use thiserror::Error;

use crate::CaseKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid query parameter: {0}")]
  QueryParam(String),

  #[error("unknown case kind: {0:?}")]
  UnknownCaseKind(String),

  #[error("case kind {0} cannot be uploaded")]
  NotUploadable(CaseKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
