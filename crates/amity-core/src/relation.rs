//! The relationship between an actor and one other user, as reported by
//! the relation query.

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, EdgeStatus, Role};

/// How two users stand with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStatus {
  Friends,
  Waiting,
  Rejected,
}

impl From<EdgeStatus> for RelationStatus {
  fn from(status: EdgeStatus) -> Self {
    match status {
      EdgeStatus::Accepted => Self::Friends,
      EdgeStatus::Pending => Self::Waiting,
      EdgeStatus::Rejected => Self::Rejected,
    }
  }
}

/// The edge joining the actor to another user, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
  pub edge:       Edge,
  pub status:     RelationStatus,
  /// Which end of `edge` the actor is on.
  pub actor_role: Role,
}

impl Relation {
  /// Classify `edge` from the point of view of `actor`. Returns `None` if
  /// the actor is not on either end.
  pub fn classify(edge: Edge, actor: uuid::Uuid) -> Option<Self> {
    let actor_role = edge.role_of(actor)?;
    Some(Self { status: edge.status.into(), actor_role, edge })
  }
}
