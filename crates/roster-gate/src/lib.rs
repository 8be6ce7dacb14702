//! HTTP access gate for Roster.
//!
//! Exposes an axum [`Router`] over the authorization engine, plus the
//! [`guarded`] helper that puts any caller routes behind the same check.
//! Authentication is upstream's job: the gate reads an already-verified
//! identity from request headers (see [`identity`]).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{user_id}/access` | 204 allowed, 403 denied with reason |
//! | `GET`  | `/students` | Students the actor may see |
//! | `GET`  | `/instructors` | Instructors of the tenant; admins only, empty otherwise |

pub mod error;
pub mod gate;
pub mod identity;

pub use error::GateError;
pub use gate::{AccessGate, guarded, require_access};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  routing::get,
};
use roster_core::{AuthorizationEngine, Directory, InstructorSummary, StudentSummary};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use identity::CurrentActor;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Upper bound on a single authorization, directory round-trips included.
  #[serde(default = "default_decision_timeout_ms")]
  pub decision_timeout_ms: u64,
}

fn default_decision_timeout_ms() -> u64 { 2_000 }

impl ServerConfig {
  pub fn decision_timeout(&self) -> Duration {
    Duration::from_millis(self.decision_timeout_ms)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<D> {
  pub gate: AccessGate<D>,
}

impl<D> Clone for AppState<D> {
  fn clone(&self) -> Self {
    Self { gate: self.gate.clone() }
  }
}

impl<D: Directory + 'static> AppState<D> {
  /// Build the engine over `directory` and wrap it in a gate.
  pub fn new(directory: D, config: &ServerConfig) -> Self {
    let engine = Arc::new(AuthorizationEngine::new(directory));
    Self { gate: AccessGate::new(engine, config.decision_timeout()) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the gate's own endpoints.
pub fn router<D>(state: AppState<D>) -> Router
where
  D: Directory + 'static,
{
  Router::new()
    .route("/users/{user_id}/access", get(access_handler::<D>))
    .route("/students",               get(students_handler::<D>))
    .route("/instructors",            get(instructors_handler::<D>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Route handlers ──────────────────────────────────────────────────────────

/// `GET /users/{user_id}/access`
async fn access_handler<D>(
  State(state): State<AppState<D>>,
  CurrentActor(actor): CurrentActor,
  Path(user_id): Path<String>,
) -> Result<StatusCode, GateError>
where
  D: Directory + 'static,
{
  state.gate.check(&actor, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /students`
async fn students_handler<D>(
  State(state): State<AppState<D>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<StudentSummary>>, GateError>
where
  D: Directory + 'static,
{
  Ok(Json(state.gate.students(&actor).await?))
}

/// `GET /instructors`
async fn instructors_handler<D>(
  State(state): State<AppState<D>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<InstructorSummary>>, GateError>
where
  D: Directory + 'static,
{
  Ok(Json(state.gate.instructors(&actor).await?))
}

// ─── Integration tests ────────────────────────────────────────────────────────
