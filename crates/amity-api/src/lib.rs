//! JSON REST API for Amity.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`RelationshipStore`] and [`UserDirectory`]. TLS and end-user
//! authentication are the gateway's responsibility; see [`auth`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", amity_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod friendships;
pub mod relations;
pub mod requests;
pub mod users;

use std::sync::Arc;

use amity_core::store::{RelationshipStore, UserDirectory};
use axum::{
  Json,
  Router,
  routing::{delete, get, patch, post},
};
use serde_json::{Value, json};

pub use auth::AuthConfig;
pub use error::ApiError;

/// Everything the router needs from a backend.
pub trait Store: RelationshipStore + UserDirectory + 'static {}

impl<T> Store for T where T: RelationshipStore + UserDirectory + 'static {}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      auth:  Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Store>(state: AppState<S>) -> Router<()> {
  Router::new()
    .route("/health", get(health))
    // Users
    .route("/users", post(users::register::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    // Requests
    .route("/requests", get(requests::list::<S>).post(requests::create::<S>))
    .route(
      "/requests/{id}",
      patch(requests::respond::<S>)
        .put(requests::respond::<S>)
        .delete(requests::clear::<S>),
    )
    // Friendships
    .route("/friendships", get(friendships::list::<S>))
    .route("/friendships/{id}", delete(friendships::unfriend::<S>))
    // Relations
    .route("/relations/{username}", get(relations::get_one::<S>))
    .with_state(state)
}

/// `GET /health`, unauthenticated.
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
