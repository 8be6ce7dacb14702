//! [`AccessGate`] — per-request delegation to the authorization engine.
//!
//! The gate turns a [`Decision`] into a transport outcome and bounds every
//! engine call by a deadline. It holds no rules of its own.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use axum::{
  extract::{Path, Request, State, rejection::PathRejection},
  middleware::{self, Next},
  response::Response,
  Router,
};
use roster_core::{
  Actor, AuthorizationEngine, AuthorizationRequest, Decision, Directory,
  InstructorSummary, StudentSummary, UserId,
};

use crate::{error::GateError, identity::CurrentActor};

/// Path parameter that names the user whose data a guarded route touches.
pub const TARGET_PARAM: &str = "user_id";

/// Wraps an [`AuthorizationEngine`] for use from request handlers.
pub struct AccessGate<D> {
  engine:           Arc<AuthorizationEngine<D>>,
  decision_timeout: Duration,
}

impl<D> Clone for AccessGate<D> {
  fn clone(&self) -> Self {
    Self {
      engine:           Arc::clone(&self.engine),
      decision_timeout: self.decision_timeout,
    }
  }
}

impl<D: Directory> AccessGate<D> {
  pub fn new(engine: Arc<AuthorizationEngine<D>>, decision_timeout: Duration) -> Self {
    Self { engine, decision_timeout }
  }

  /// `Ok(())` when `actor` may access `target`, otherwise the error to
  /// answer with.
  pub async fn check(
    &self,
    actor: &Actor,
    target: impl Into<UserId>,
  ) -> Result<(), GateError> {
    let request = AuthorizationRequest::new(actor.clone(), target);

    match self.bounded(self.engine.evaluate(&request)).await? {
      Decision::Allowed => Ok(()),
      Decision::Denied(reason) => {
        tracing::debug!(
          actor = %actor.id,
          target = %request.target_user_id,
          %reason,
          "access denied"
        );
        Err(GateError::Forbidden(reason))
      }
    }
  }

  pub async fn students(&self, actor: &Actor) -> Result<Vec<StudentSummary>, GateError> {
    self.bounded(self.engine.resolve_accessible_students(actor)).await
  }

  pub async fn instructors(
    &self,
    actor: &Actor,
  ) -> Result<Vec<InstructorSummary>, GateError> {
    self.bounded(self.engine.resolve_accessible_instructors(actor)).await
  }

  /// Run an engine call under the decision deadline. On expiry the call is
  /// dropped together with any outstanding directory query.
  async fn bounded<T>(
    &self,
    call: impl Future<Output = roster_core::Result<T>>,
  ) -> Result<T, GateError> {
    match tokio::time::timeout(self.decision_timeout, call).await {
      Ok(result) => result.map_err(GateError::from),
      Err(_) => {
        tracing::warn!(
          timeout_ms = self.decision_timeout.as_millis() as u64,
          "authorization exceeded its deadline"
        );
        Err(GateError::from(roster_core::Error::Cancelled))
      }
    }
  }
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Let the request through only if the actor may access the user named by
/// the `{user_id}` path segment.
pub async fn require_access<D>(
  State(gate): State<AccessGate<D>>,
  CurrentActor(actor): CurrentActor,
  params: Result<Path<HashMap<String, String>>, PathRejection>,
  request: Request,
  next: Next,
) -> Result<Response, GateError>
where
  D: Directory + 'static,
{
  let target = params
    .ok()
    .and_then(|Path(mut params)| params.remove(TARGET_PARAM))
    .ok_or_else(|| {
      GateError::InvalidRequest(format!("route has no {{{TARGET_PARAM}}} segment"))
    })?;

  gate.check(&actor, target).await?;
  Ok(next.run(request).await)
}

/// Put every route in `routes` behind [`require_access`].
///
/// Each route must capture the target user as `{user_id}`.
pub fn guarded<D>(routes: Router, gate: AccessGate<D>) -> Router
where
  D: Directory + 'static,
{
  routes.route_layer(middleware::from_fn_with_state(gate, require_access::<D>))
}
