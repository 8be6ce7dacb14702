//! Error type for `roster-store-sqlite`.

use roster_core::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be turned back into a domain value.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("link not found: {0}")]
  LinkNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
