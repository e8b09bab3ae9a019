//! Error types for `amity-core`.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of an [`Error`], used by transport layers to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Malformed or illegal input. Never retried.
  Validation,
  /// A state invariant would be violated.
  Conflict,
  /// No authenticated actor.
  Unauthenticated,
  /// An authenticated actor attempted an operation reserved for someone
  /// else.
  Forbidden,
  /// The referenced relationship or user does not exist.
  NotFound,
  /// Transient persistence failure; the only kind a caller may retry.
  Store,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("impossible to make a friendship request to yourself")]
  SelfRequest,

  #[error("no user with id {0} exists")]
  UnknownRecipient(Uuid),

  #[error("invalid username {0:?}")]
  InvalidUsername(String),

  #[error("a user with username {0:?} already exists")]
  UsernameTaken(String),

  #[error("a relationship between these users already exists")]
  DuplicateRequest,

  #[error("request {0} has already been resolved")]
  AlreadyResolved(Uuid),

  #[error("relationship {0} has not been rejected")]
  NotRejected(Uuid),

  #[error("authentication required")]
  Unauthenticated,

  #[error("only the recipient can accept or reject request {0}")]
  NotRecipient(Uuid),

  #[error("actor is not a party to relationship {0}")]
  NotParticipant(Uuid),

  #[error("relationship not found: {0}")]
  EdgeNotFound(Uuid),

  #[error("friendship not found: {0}")]
  FriendshipNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("no user named {0:?}")]
  UsernameNotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::SelfRequest
      | Self::UnknownRecipient(_)
      | Self::InvalidUsername(_) => ErrorKind::Validation,
      Self::UsernameTaken(_)
      | Self::DuplicateRequest
      | Self::AlreadyResolved(_)
      | Self::NotRejected(_) => ErrorKind::Conflict,
      Self::Unauthenticated => ErrorKind::Unauthenticated,
      Self::NotRecipient(_) | Self::NotParticipant(_) => ErrorKind::Forbidden,
      Self::EdgeNotFound(_)
      | Self::FriendshipNotFound(_)
      | Self::UserNotFound(_)
      | Self::UsernameNotFound(_) => ErrorKind::NotFound,
      Self::Store(_) => ErrorKind::Store,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
