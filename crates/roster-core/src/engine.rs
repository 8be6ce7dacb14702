//! [`AuthorizationEngine`] — role dispatch, tenant scoping and link lookup.
//!
//! The engine holds no mutable state. Every operation is a read against the
//! injected [`Directory`] followed by a pure decision, so calls may run
//! concurrently and repeat freely. Directory failures are surfaced as
//! [`Error::DirectoryUnavailable`]; they never turn into a denial or an empty
//! listing.

use std::collections::HashSet;

use crate::{
  Error, Result,
  decision::{Decision, DenyReason, InstructorSummary, StudentSummary},
  directory::Directory,
  identity::{Actor, AuthorizationRequest, Role, TenantId, UserId},
};

/// Decides what an [`Actor`] may see, backed by a [`Directory`].
pub struct AuthorizationEngine<D> {
  directory: D,
}

impl<D: Directory> AuthorizationEngine<D> {
  pub fn new(directory: D) -> Self { Self { directory } }

  pub fn directory(&self) -> &D { &self.directory }

  // ── Single-target checks ──────────────────────────────────────────────────

  /// Same as [`authorize`](Self::authorize), for a request built by the
  /// transport layer.
  pub async fn evaluate(&self, request: &AuthorizationRequest) -> Result<Decision> {
    self.authorize(&request.actor, &request.target_user_id).await
  }

  /// Decide whether `actor` may access the data of `target`.
  ///
  /// Returns `Err` only for malformed input or an unreachable directory; a
  /// refusal is `Ok(Decision::Denied(_))`.
  pub async fn authorize(&self, actor: &Actor, target: &UserId) -> Result<Decision> {
    actor.validate()?;
    if target.is_blank() {
      return Err(Error::InvalidRequest("target user id is empty".into()));
    }

    let decision = match &actor.role {
      Role::Admin => self.authorize_admin(actor, target).await?,
      Role::Aluno => authorize_self(actor, target),
      Role::Professor | Role::Nutri => {
        self.authorize_instructor(actor, target).await?
      }
      Role::Unrecognized(_) => Decision::Denied(DenyReason::UnknownRole),
    };

    tracing::debug!(
      actor = %actor.id,
      role = %actor.role,
      %target,
      ?decision,
      "authorization decided"
    );
    Ok(decision)
  }

  async fn authorize_admin(&self, actor: &Actor, target: &UserId) -> Result<Decision> {
    let Some(tenant) = &actor.tenant_id else {
      return Ok(Decision::Denied(DenyReason::CrossTenant));
    };

    let subject = self
      .directory
      .find_subject(target)
      .await
      .map_err(Error::directory)?;

    Ok(match subject {
      Some(user) if user.tenant_id.as_ref() == Some(tenant) => Decision::Allowed,
      _ => Decision::Denied(DenyReason::CrossTenant),
    })
  }

  async fn authorize_instructor(
    &self,
    actor: &Actor,
    target: &UserId,
  ) -> Result<Decision> {
    let (Some(tenant), Some(role)) = (&actor.tenant_id, actor.role.instructor_role())
    else {
      return Ok(Decision::Denied(DenyReason::MissingTenant));
    };

    let link = self
      .directory
      .find_active_link(target, &actor.id, role)
      .await
      .map_err(Error::directory)?;
    if link.is_none() {
      return Ok(Decision::Denied(DenyReason::NoActiveLink));
    }

    // A link never grants access across tenants.
    let subject = self
      .directory
      .find_subject(target)
      .await
      .map_err(Error::directory)?;

    Ok(match subject {
      None => Decision::Denied(DenyReason::NoActiveLink),
      Some(user) if user.tenant_id.as_ref() != Some(tenant) => {
        Decision::Denied(DenyReason::CrossTenant)
      }
      Some(_) => Decision::Allowed,
    })
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  /// Every student `actor` may see, without duplicates.
  ///
  /// Order follows the directory's order for a fixed snapshot. Students and
  /// unrecognized roles get an empty list, as does any actor without a
  /// tenant.
  pub async fn resolve_accessible_students(
    &self,
    actor: &Actor,
  ) -> Result<Vec<StudentSummary>> {
    actor.validate()?;
    let Some(tenant) = &actor.tenant_id else {
      return Ok(Vec::new());
    };

    let students = match (&actor.role, actor.role.instructor_role()) {
      (Role::Admin, _) => self
        .directory
        .list_active_students(tenant)
        .await
        .map_err(Error::directory)?,
      (_, Some(role)) => self
        .directory
        .list_active_links_for_instructor(&actor.id, role)
        .await
        .map_err(Error::directory)?
        .into_iter()
        .filter(|linked| linked.link.active && linked.link.instructor_role == role)
        .map(|linked| linked.student)
        .collect(),
      _ => return Ok(Vec::new()),
    };

    let mut seen = HashSet::new();
    let summaries: Vec<StudentSummary> = students
      .into_iter()
      .filter(|user| {
        user.active && user.role == Role::Aluno && in_tenant(user.tenant_id.as_ref(), tenant)
      })
      .filter(|user| seen.insert(user.id.clone()))
      .map(StudentSummary::from)
      .collect();

    tracing::debug!(
      actor = %actor.id,
      role = %actor.role,
      count = summaries.len(),
      "resolved accessible students"
    );
    Ok(summaries)
  }

  /// Every instructor in the actor's tenant. Only administrators receive a
  /// non-empty result.
  pub async fn resolve_accessible_instructors(
    &self,
    actor: &Actor,
  ) -> Result<Vec<InstructorSummary>> {
    actor.validate()?;
    let (Role::Admin, Some(tenant)) = (&actor.role, &actor.tenant_id) else {
      return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let summaries: Vec<InstructorSummary> = self
      .directory
      .list_active_instructors(tenant)
      .await
      .map_err(Error::directory)?
      .into_iter()
      .filter(|user| user.active && in_tenant(user.tenant_id.as_ref(), tenant))
      .filter(|user| seen.insert(user.id.clone()))
      .filter_map(InstructorSummary::from_user)
      .collect();

    tracing::debug!(
      actor = %actor.id,
      count = summaries.len(),
      "resolved accessible instructors"
    );
    Ok(summaries)
  }
}

fn authorize_self(actor: &Actor, target: &UserId) -> Decision {
  if actor.tenant_id.is_none() {
    Decision::Denied(DenyReason::MissingTenant)
  } else if *target == actor.id {
    Decision::Allowed
  } else {
    Decision::Denied(DenyReason::SelfOnly)
  }
}

fn in_tenant(candidate: Option<&TenantId>, tenant: &TenantId) -> bool {
  candidate == Some(tenant)
}
