//! Error types for `roster-core`.
//!
//! A denial is not an error: it is a [`Decision`](crate::Decision). The
//! variants here are the outcomes that say nothing about permissions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The caller built a malformed request, e.g. an empty target id.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  /// No usable actor was supplied.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  /// The directory could not answer. Never interpreted as a denial.
  #[error("directory unavailable: {0}")]
  DirectoryUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The caller gave up before a decision was reached.
  #[error("decision cancelled before completion")]
  Cancelled,
}

impl Error {
  pub(crate) fn directory<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::DirectoryUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
