//! Handlers for `/requests` endpoints: creating, listing, answering and
//! clearing friendship requests.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/requests` | Body: `{"request_friendship_to_user":"<uuid>"}` |
//! | `GET`   | `/requests` | Pending only; `?incoming`, `?outgoing` |
//! | `PATCH` | `/requests/{id}` | Body: `{"is_accepted":true}`; recipient only |
//! | `DELETE`| `/requests/{id}` | Clears a rejected request; 204 |

use std::collections::HashMap;

use amity_core::{
  edge::Decision,
  query::{self, FriendshipView},
};
use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Store, auth::Actor, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// Only the recipient is read from the body; anything else is ignored and
/// new requests always start out pending.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub request_friendship_to_user: Uuid,
}

/// `POST /requests`
///
/// Answers 201 both for a new pending request and for a reverse request
/// that was accepted in place.
pub async fn create<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let edge = state
    .store
    .create_request(actor, body.request_friendship_to_user)
    .await
    .map_err(ApiError::backend)?
    .into_edge();
  let view = query::view_edge(state.store.as_ref(), edge).await?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// A flag is set when present with no value, or with `true` or `1`.
fn flag(params: &HashMap<String, String>, name: &str) -> bool {
  matches!(params.get(name).map(String::as_str), Some("" | "true" | "1"))
}

/// `GET /requests[?incoming][&outgoing]`
pub async fn list<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<FriendshipView>>, ApiError> {
  let views = query::pending_requests(
    state.store.as_ref(),
    actor,
    flag(&params, "incoming"),
    flag(&params, "outgoing"),
  )
  .await?;
  Ok(Json(views))
}

// ─── Respond ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RespondBody {
  pub is_accepted: bool,
}

/// `PATCH /requests/{id}`
pub async fn respond<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  body: Result<Json<RespondBody>, JsonRejection>,
) -> Result<Json<FriendshipView>, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let edge = state
    .store
    .respond(actor, id, Decision::from(body.is_accepted))
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(query::view_edge(state.store.as_ref(), edge).await?))
}

// ─── Clear ────────────────────────────────────────────────────────────────────

/// `DELETE /requests/{id}`
pub async fn clear<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .clear_rejected(actor, id)
    .await
    .map_err(ApiError::backend)?;
  Ok(StatusCode::NO_CONTENT)
}
