//! Server assembly for Amity: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite store
//! and serves [`app`].

use std::{path::PathBuf, sync::Arc};

use amity_api::{AppState, AuthConfig, Store, auth::DEFAULT_ACTOR_HEADER};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix under which the JSON API is mounted.
pub const API_PREFIX: &str = "/api/v1";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AMITY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Basic-auth user name the gateway presents.
  pub auth_username:      String,
  /// argon2 PHC string for the gateway password.
  pub auth_password_hash: String,
  #[serde(default = "default_actor_header")]
  pub actor_header:       String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/amity/amity.db") }

fn default_actor_header() -> String { DEFAULT_ACTOR_HEADER.to_owned() }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig::new(
      self.auth_username.clone(),
      self.auth_password_hash.clone(),
      &self.actor_header,
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: the API nested under [`API_PREFIX`], with
/// request tracing.
pub fn app<S: Store>(store: Arc<S>, config: &ServerConfig) -> Router {
  let state = AppState {
    store,
    auth: Arc::new(config.auth()),
  };
  Router::new()
    .nest(API_PREFIX, amity_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
