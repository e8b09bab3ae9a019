//! Users as seen by the relationship core.
//!
//! Identity and credentials belong to the directory; the core only ever
//! references users by id and renders them as [`PublicUser`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest username the directory accepts, in characters.
pub const MAX_USERNAME_LEN: usize = 150;

/// A registered user. Both `user_id` and `username` are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// The projection of a [`User`] that is safe to show to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
  pub id:       Uuid,
  pub username: String,
}

impl From<&User> for PublicUser {
  fn from(user: &User) -> Self {
    Self { id: user.user_id, username: user.username.clone() }
  }
}

/// Check that `name` is 1 to [`MAX_USERNAME_LEN`] characters of letters,
/// digits and `@ . + - _`.
pub fn validate_username(name: &str) -> Result<()> {
  let len = name.chars().count();
  let valid = (1..=MAX_USERNAME_LEN).contains(&len)
    && name
      .chars()
      .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

  if valid {
    Ok(())
  } else {
    Err(Error::InvalidUsername(name.to_owned()))
  }
}
