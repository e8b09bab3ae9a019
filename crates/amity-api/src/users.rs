//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: `{"username":"alice"}` |
//! | `GET`  | `/users/{id}` | 404 if not found |

use amity_core::{Error, user::PublicUser};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Store, auth::Gateway, error::ApiError};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
}

/// `POST /users`
pub async fn register<S: Store>(
  _: Gateway,
  State(state): State<AppState<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let user = state
    .store
    .register_user(body.username)
    .await
    .map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<S: Store>(
  _: Gateway,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(Error::UserNotFound(id))?;
  Ok(Json(PublicUser::from(&user)))
}
