//! API error type and [`axum::response::IntoResponse`] implementation.

use amity_core::ErrorKind;
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Gateway credentials or the actor header are missing or invalid.
  #[error("authentication required")]
  Unauthorized,

  /// The request could not be decoded.
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] amity_core::Error),
}

impl ApiError {
  /// Convert a backend's own error type through the core taxonomy.
  pub fn backend<E: Into<amity_core::Error>>(e: E) -> Self {
    Self::Core(e.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Core(e) => match e.kind() {
        // Wrong-actor failures are reported as plain bad requests.
        ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::Forbidden => {
          StatusCode::BAD_REQUEST
        }
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
      "internal error".to_owned()
    } else {
      self.to_string()
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"amity\""),
      );
    }
    res
  }
}
