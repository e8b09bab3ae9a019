//! `GET /relations/{username}`: how the actor stands with another user.
//!
//! 200 with the relation and the underlying friendship, 204 when the two
//! users have no edge, 404 when no user has that name.

use amity_core::query;
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};

use crate::{AppState, Store, auth::Actor, error::ApiError};

pub async fn get_one<S: Store>(
  Actor(actor): Actor,
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
) -> Result<Response, ApiError> {
  let relation = query::query_relation(state.store.as_ref(), actor, &username).await?;
  Ok(match relation {
    Some(view) => Json(view).into_response(),
    None => StatusCode::NO_CONTENT.into_response(),
  })
}
