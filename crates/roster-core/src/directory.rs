//! The `Directory` trait and the records it returns.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The engine depends on this abstraction only, never on a concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{InstructorRole, Role, TenantId, UserId};

// ─── Records ─────────────────────────────────────────────────────────────────

/// A user as stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:        UserId,
  pub tenant_id: Option<TenantId>,
  pub role:      Role,
  pub name:      String,
  pub email:     Option<String>,
  pub active:    bool,
}

/// A role-typed binding from a student to one of their instructors.
///
/// Links are created and deactivated by an external management workflow.
/// An inactive link stays in storage but confers no access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  pub id:              Uuid,
  pub student_id:      UserId,
  pub instructor_id:   UserId,
  pub instructor_role: InstructorRole,
  pub active:          bool,
  pub created_at:      DateTime<Utc>,
}

/// A link together with the student record it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedStudent {
  pub link:    Link,
  pub student: User,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only view over users and instructor links.
///
/// Every method is a pure read. Implementations must answer each call from a
/// single consistent point in time; they need not be linearised with
/// concurrent writes.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a user by id. Returns `None` if not found.
  fn find_subject<'a>(
    &'a self,
    user_id: &'a UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Find any active link for the exact `(student, instructor, role)`
  /// triple. When several exist, which one is returned is unspecified.
  fn find_active_link<'a>(
    &'a self,
    student_id: &'a UserId,
    instructor_id: &'a UserId,
    instructor_role: InstructorRole,
  ) -> impl Future<Output = Result<Option<Link>, Self::Error>> + Send + 'a;

  /// All active users with role `ALUNO` in `tenant_id`.
  fn list_active_students<'a>(
    &'a self,
    tenant_id: &'a TenantId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  /// All active links held by an instructor under `instructor_role`, each
  /// resolved to its student record.
  fn list_active_links_for_instructor<'a>(
    &'a self,
    instructor_id: &'a UserId,
    instructor_role: InstructorRole,
  ) -> impl Future<Output = Result<Vec<LinkedStudent>, Self::Error>> + Send + 'a;

  /// All active users with role `PROFESSOR` or `NUTRI` in `tenant_id`.
  fn list_active_instructors<'a>(
    &'a self,
    tenant_id: &'a TenantId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;
}

impl<T: Directory> Directory for std::sync::Arc<T> {
  type Error = T::Error;

  fn find_subject<'a>(
    &'a self,
    user_id: &'a UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a {
    (**self).find_subject(user_id)
  }

  fn find_active_link<'a>(
    &'a self,
    student_id: &'a UserId,
    instructor_id: &'a UserId,
    instructor_role: InstructorRole,
  ) -> impl Future<Output = Result<Option<Link>, Self::Error>> + Send + 'a {
    (**self).find_active_link(student_id, instructor_id, instructor_role)
  }

  fn list_active_students<'a>(
    &'a self,
    tenant_id: &'a TenantId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a {
    (**self).list_active_students(tenant_id)
  }

  fn list_active_links_for_instructor<'a>(
    &'a self,
    instructor_id: &'a UserId,
    instructor_role: InstructorRole,
  ) -> impl Future<Output = Result<Vec<LinkedStudent>, Self::Error>> + Send + 'a
  {
    (**self).list_active_links_for_instructor(instructor_id, instructor_role)
  }

  fn list_active_instructors<'a>(
    &'a self,
    tenant_id: &'a TenantId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a {
    (**self).list_active_instructors(tenant_id)
  }
}
