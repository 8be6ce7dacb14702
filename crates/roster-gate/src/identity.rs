//! Identity-header extractor and standalone reader.
//!
//! Authentication happens upstream. The authenticating proxy forwards the
//! verified identity in three headers, which this module turns into an
//! [`Actor`]. Nothing here decides access.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use roster_core::{Actor, Role, TenantId, UserId};

use crate::error::GateError;

/// Verified user id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// One of `ADMIN`, `PROFESSOR`, `NUTRI`, `ALUNO`.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
/// Optional tenant id.
pub const ACTOR_TENANT_HEADER: &str = "x-actor-tenant";

/// The actor behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

/// Read the actor directly from headers — used outside extractor position.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, GateError> {
  let id = header_str(headers, ACTOR_ID_HEADER)
    .ok_or_else(|| GateError::Unauthenticated("missing actor id".into()))?;
  let role = header_str(headers, ACTOR_ROLE_HEADER)
    .ok_or_else(|| GateError::Unauthenticated("missing actor role".into()))?;
  let tenant = header_str(headers, ACTOR_TENANT_HEADER).map(TenantId::from);

  Ok(Actor::new(UserId::from(id), Role::from(role), tenant))
}

impl<S> FromRequestParts<S> for CurrentActor
where
  S: Send + Sync,
{
  type Rejection = GateError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers).map(CurrentActor)
  }
}
