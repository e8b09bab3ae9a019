//! Handlers for `/friendships` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/friendships` | Accepted edges of the actor |
//! | `DELETE` | `/friendships/{id}` | Unfriend; 204, 404 if not a friendship |

use amity_core::query::{self, FriendshipView};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use uuid::Uuid;

use crate::{AppState, Store, auth::Actor, error::ApiError};

/// `GET /friendships`
pub async fn list<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<FriendshipView>>, ApiError> {
  Ok(Json(query::friendships(state.store.as_ref(), actor).await?))
}

/// `DELETE /friendships/{id}`
pub async fn unfriend<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .unfriend(actor, id)
    .await
    .map_err(ApiError::backend)?;
  Ok(StatusCode::NO_CONTENT)
}
