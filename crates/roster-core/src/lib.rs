//! Core types and the authorization engine for the Roster access-control
//! layer.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! engine reads users and instructor links through the [`Directory`] trait;
//! storage backends (e.g. `roster-store-sqlite`) implement it and transport
//! layers (e.g. `roster-gate`) drive the engine.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod decision;
pub mod directory;
pub mod engine;
pub mod error;
pub mod identity;

pub use decision::{Decision, DenyReason, InstructorSummary, StudentSummary};
pub use directory::Directory;
pub use engine::AuthorizationEngine;
pub use error::{Error, Result};
pub use identity::{Actor, AuthorizationRequest, InstructorRole, Role, TenantId, UserId};

#[cfg(test)]
mod tests;
