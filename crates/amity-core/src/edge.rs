//! Relationship edges, the single persistent entity of the core.
//!
//! An edge is a directed record from the user who asked to the user who was
//! asked. Whatever its direction, at most one edge exists per unordered pair
//! of users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where an edge is in its lifecycle.
///
/// Persisted as a tri-state flag: unset while pending, `true` once accepted,
/// `false` once rejected.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
  #[default]
  Pending,
  Accepted,
  Rejected,
}

impl EdgeStatus {
  pub fn from_flag(accepted: Option<bool>) -> Self {
    match accepted {
      None => Self::Pending,
      Some(true) => Self::Accepted,
      Some(false) => Self::Rejected,
    }
  }

  pub fn as_flag(self) -> Option<bool> {
    match self {
      Self::Pending => None,
      Self::Accepted => Some(true),
      Self::Rejected => Some(false),
    }
  }

  pub fn is_pending(self) -> bool { self == Self::Pending }

  /// Human-readable description shown alongside the status.
  pub fn message(self) -> &'static str {
    match self {
      Self::Pending => "The request is awaiting a response.",
      Self::Accepted => "Friendship is accepted.",
      Self::Rejected => "Friendship is rejected.",
    }
  }
}

/// The recipient's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Accept,
  Reject,
}

impl From<bool> for Decision {
  fn from(accept: bool) -> Self {
    if accept { Self::Accept } else { Self::Reject }
  }
}

impl Decision {
  pub fn status(self) -> EdgeStatus {
    match self {
      Self::Accept => EdgeStatus::Accepted,
      Self::Reject => EdgeStatus::Rejected,
    }
  }
}

// ─── Edge ────────────────────────────────────────────────────────────────────

/// Which end of an edge a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Sender,
  Recipient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub edge_id:    Uuid,
  /// The user who sent the request.
  pub sender:     Uuid,
  /// The user the request was sent to; the only one allowed to answer it.
  pub recipient:  Uuid,
  pub status:     EdgeStatus,
  /// Store-assigned; never changes after insert.
  pub created_at: DateTime<Utc>,
  /// Store-assigned on every write.
  pub updated_at: DateTime<Utc>,
}

impl Edge {
  pub fn role_of(&self, user: Uuid) -> Option<Role> {
    if user == self.sender {
      Some(Role::Sender)
    } else if user == self.recipient {
      Some(Role::Recipient)
    } else {
      None
    }
  }

  pub fn involves(&self, user: Uuid) -> bool { self.role_of(user).is_some() }

  /// The other end of the edge, seen from `user`.
  pub fn other_party(&self, user: Uuid) -> Option<Uuid> {
    self.role_of(user).map(|role| match role {
      Role::Sender => self.recipient,
      Role::Recipient => self.sender,
    })
  }
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Which of a user's edges to return, relative to that user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  /// The user is the recipient.
  Incoming,
  /// The user is the sender.
  Outgoing,
  /// Either end.
  #[default]
  Both,
}

impl Direction {
  /// Build from the `incoming` / `outgoing` list flags. Setting both is the
  /// same as setting neither.
  pub fn from_flags(incoming: bool, outgoing: bool) -> Self {
    match (incoming, outgoing) {
      (true, false) => Self::Incoming,
      (false, true) => Self::Outgoing,
      _ => Self::Both,
    }
  }
}

/// Parameters for listing one user's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFilter {
  pub status:    EdgeStatus,
  pub direction: Direction,
}

impl EdgeFilter {
  pub fn pending(direction: Direction) -> Self {
    Self { status: EdgeStatus::Pending, direction }
  }

  pub fn accepted() -> Self {
    Self { status: EdgeStatus::Accepted, direction: Direction::Both }
  }

  pub fn matches(&self, user: Uuid, edge: &Edge) -> bool {
    let direction = match self.direction {
      Direction::Incoming => edge.recipient == user,
      Direction::Outgoing => edge.sender == user,
      Direction::Both => edge.involves(user),
    };
    direction && edge.status == self.status
  }
}
