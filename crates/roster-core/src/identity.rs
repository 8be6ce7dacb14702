//! Identity context — who is asking, and about whom.
//!
//! An [`Actor`] is produced per request by an external authentication step
//! and is only ever read here. Identifiers are opaque strings; the engine
//! compares them and never interprets their contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Identifier of a user (student, instructor or admin).
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// `true` for the empty string and for whitespace-only ids.
  pub fn is_blank(&self) -> bool { self.0.trim().is_empty() }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}

/// Identifier of a tenant (an academy). Used purely as a partitioning key.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TenantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TenantId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for TenantId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// The role an actor or user holds.
///
/// The four named variants are the only roles the platform defines. Any other
/// value coming from the authentication layer or the directory is preserved
/// as [`Role::Unrecognized`] so it can be denied explicitly rather than
/// silently mapped onto a real role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
  Admin,
  Professor,
  Nutri,
  Aluno,
  Unrecognized(String),
}

impl Role {
  /// Wire form, e.g. `"PROFESSOR"`.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Admin => "ADMIN",
      Self::Professor => "PROFESSOR",
      Self::Nutri => "NUTRI",
      Self::Aluno => "ALUNO",
      Self::Unrecognized(raw) => raw,
    }
  }

  /// The instructor role this role acts as, if any.
  pub fn instructor_role(&self) -> Option<InstructorRole> {
    match self {
      Self::Professor => Some(InstructorRole::Professor),
      Self::Nutri => Some(InstructorRole::Nutri),
      _ => None,
    }
  }
}

/// Only the exact uppercase wire forms name a role. Anything else, including
/// other spellings of a known role, is kept as [`Role::Unrecognized`].
impl From<&str> for Role {
  fn from(s: &str) -> Self {
    match s {
      "ADMIN" => Self::Admin,
      "PROFESSOR" => Self::Professor,
      "NUTRI" => Self::Nutri,
      "ALUNO" => Self::Aluno,
      _ => Self::Unrecognized(s.to_owned()),
    }
  }
}

impl From<String> for Role {
  fn from(s: String) -> Self { Self::from(s.as_str()) }
}

impl From<Role> for String {
  fn from(role: Role) -> Self {
    match role {
      Role::Unrecognized(raw) => raw,
      known => known.as_str().to_owned(),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The role under which an instructor is linked to a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstructorRole {
  Professor,
  Nutri,
}

impl InstructorRole {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Professor => "PROFESSOR",
      Self::Nutri => "NUTRI",
    }
  }
}

impl From<InstructorRole> for Role {
  fn from(role: InstructorRole) -> Self {
    match role {
      InstructorRole::Professor => Role::Professor,
      InstructorRole::Nutri => Role::Nutri,
    }
  }
}

impl fmt::Display for InstructorRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated identity making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:        UserId,
  pub role:      Role,
  /// Absent only for an administrator operating outside tenant scoping.
  pub tenant_id: Option<TenantId>,
}

impl Actor {
  pub fn new(
    id: impl Into<UserId>,
    role: impl Into<Role>,
    tenant_id: Option<TenantId>,
  ) -> Self {
    Self { id: id.into(), role: role.into(), tenant_id }
  }

  /// Reject actors that could not have come out of a successful
  /// authentication.
  pub fn validate(&self) -> Result<()> {
    if self.id.is_blank() {
      return Err(Error::Unauthenticated("actor id is empty".into()));
    }
    Ok(())
  }
}

/// A single access check, built once by the transport layer from whatever
/// addressing the inbound operation used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
  pub actor:          Actor,
  pub target_user_id: UserId,
}

impl AuthorizationRequest {
  pub fn new(actor: Actor, target_user_id: impl Into<UserId>) -> Self {
    Self { actor, target_user_id: target_user_id.into() }
  }
}
