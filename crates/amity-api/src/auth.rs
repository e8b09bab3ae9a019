//! Gateway authentication and actor extraction.
//!
//! End users are authenticated upstream. The gateway calls this API with its
//! own HTTP Basic credentials and names the end user in the actor header.

use amity_core::Error;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use uuid::Uuid;

use crate::{AppState, Store, error::ApiError};

/// Header carrying the actor's user id unless configured otherwise.
pub const DEFAULT_ACTOR_HEADER: &str = "x-amity-user";

/// Gateway credentials accepted by this server instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  /// Lowercase name of the header carrying the actor id.
  pub actor_header:  String,
}

impl AuthConfig {
  pub fn new(
    username: impl Into<String>,
    password_hash: impl Into<String>,
    actor_header: &str,
  ) -> Self {
    Self {
      username:      username.into(),
      password_hash: password_hash.into(),
      actor_header:  actor_header.to_ascii_lowercase(),
    }
  }
}

/// Zero-size marker: present in the handler means the gateway authenticated.
pub struct Gateway;

/// The authenticated user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

/// Verify the gateway's Basic credentials.
pub fn verify_gateway(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  if username != config.username {
    return Err(ApiError::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(())
}

/// Parse the actor id out of the configured header.
pub fn actor_id(headers: &HeaderMap, config: &AuthConfig) -> Result<Uuid, Error> {
  let raw = headers
    .get(config.actor_header.as_str())
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthenticated)?;
  Uuid::parse_str(raw.trim()).map_err(|_| Error::Unauthenticated)
}

impl<S: Store> FromRequestParts<AppState<S>> for Gateway {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_gateway(&parts.headers, &state.auth)?;
    Ok(Gateway)
  }
}

impl<S: Store> FromRequestParts<AppState<S>> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_gateway(&parts.headers, &state.auth)?;
    let id = actor_id(&parts.headers, &state.auth)?;

    // An actor the directory has never heard of is not authenticated.
    match state.store.get_user(id).await.map_err(ApiError::backend)? {
      Some(_) => Ok(Actor(id)),
      None => {
        tracing::debug!(%id, "unknown actor");
        Err(Error::Unauthenticated.into())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use amity_core::{memory::MemoryStore, store::UserDirectory};
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::{body::Body, http::Request};
  use rand_core::OsRng;

  use super::*;

  fn make_state(password: &str) -> AppState<MemoryStore> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      store: Arc::new(MemoryStore::new()),
      auth:  Arc::new(AuthConfig::new("gateway", hash, "X-Amity-User")),
    }
  }

  fn unauthenticated(res: Result<Actor, ApiError>) -> bool {
    matches!(res, Err(ApiError::Core(Error::Unauthenticated)))
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn extract_actor(
    req: Request<Body>,
    state: &AppState<MemoryStore>,
  ) -> Result<Actor, ApiError> {
    let (mut parts, _) = req.into_parts();
    Actor::from_request_parts(&mut parts, state).await
  }

  #[test]
  fn header_name_is_normalised() {
    let config = AuthConfig::new("u", "h", "X-Amity-User");
    assert_eq!(config.actor_header, DEFAULT_ACTOR_HEADER);
  }

  #[tokio::test]
  async fn correct_credentials_and_known_actor() {
    let state = make_state("secret");
    let user = state.store.register_user("alice".to_owned()).await.unwrap();
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "secret"))
      .header("x-amity-user", user.user_id.to_string())
      .body(Body::empty())
      .unwrap();
    assert_eq!(extract_actor(req, &state).await.unwrap(), Actor(user.user_id));
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "wrong"))
      .body(Body::empty())
      .unwrap();
    assert!(matches!(verify_gateway(req.headers(), &state.auth), Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(verify_gateway(req.headers(), &state.auth), Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn missing_or_malformed_actor() {
    let state = make_state("secret");

    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "secret"))
      .body(Body::empty())
      .unwrap();
    assert!(unauthenticated(extract_actor(req, &state).await));

    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "secret"))
      .header("x-amity-user", "not-a-uuid")
      .body(Body::empty())
      .unwrap();
    assert!(unauthenticated(extract_actor(req, &state).await));
  }

  #[tokio::test]
  async fn bad_gateway_password_fails_before_actor_lookup() {
    let state = make_state("secret");
    let user = state.store.register_user("alice".to_owned()).await.unwrap();
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "wrong"))
      .header("x-amity-user", user.user_id.to_string())
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract_actor(req, &state).await, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_actor() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("gateway", "secret"))
      .header("x-amity-user", Uuid::new_v4().to_string())
      .body(Body::empty())
      .unwrap();
    assert!(unauthenticated(extract_actor(req, &state).await));
  }
}
