//! Engine outputs: access decisions and the summaries returned by listings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  directory::User,
  identity::{InstructorRole, TenantId, UserId},
};

// ─── Decision ────────────────────────────────────────────────────────────────

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
  /// A student asked about someone other than themselves.
  SelfOnly,
  /// An instructor has no active link, under their role, to the target.
  NoActiveLink,
  /// The target is missing or lives in another tenant.
  CrossTenant,
  /// The actor's role is not one the platform defines.
  UnknownRole,
  /// A tenant-scoped actor arrived without a tenant.
  MissingTenant,
}

impl DenyReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SelfOnly => "self_only",
      Self::NoActiveLink => "no_active_link",
      Self::CrossTenant => "cross_tenant",
      Self::UnknownRole => "unknown_role",
      Self::MissingTenant => "missing_tenant",
    }
  }
}

impl fmt::Display for DenyReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The outcome of an access check. A denial always carries its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
  Allowed,
  Denied(DenyReason),
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allowed) }

  pub fn denial(&self) -> Option<DenyReason> {
    match self {
      Self::Allowed => None,
      Self::Denied(reason) => Some(*reason),
    }
  }
}

// ─── Summaries ───────────────────────────────────────────────────────────────

/// A student visible to the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
  pub id:        UserId,
  pub name:      String,
  pub email:     Option<String>,
  pub tenant_id: Option<TenantId>,
}

impl From<User> for StudentSummary {
  fn from(user: User) -> Self {
    Self {
      id:        user.id,
      name:      user.name,
      email:     user.email,
      tenant_id: user.tenant_id,
    }
  }
}

/// An instructor visible to an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorSummary {
  pub id:        UserId,
  pub name:      String,
  pub email:     Option<String>,
  pub role:      InstructorRole,
  pub tenant_id: Option<TenantId>,
}

impl InstructorSummary {
  /// Returns `None` when `user` does not hold an instructor role.
  pub fn from_user(user: User) -> Option<Self> {
    let role = user.role.instructor_role()?;
    Some(Self {
      id: user.id,
      name: user.name,
      email: user.email,
      role,
      tenant_id: user.tenant_id,
    })
  }
}
