//! Read-side helpers: directional listing, relation lookup by username, and
//! enrichment of edges with both endpoints' public user data.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  edge::{Direction, Edge, EdgeFilter, EdgeStatus, Role},
  relation::{Relation, RelationStatus},
  store::{RelationshipStore, UserDirectory},
  user::PublicUser,
};

// ─── Views ───────────────────────────────────────────────────────────────────

/// An edge as shown to its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipView {
  pub id:               Uuid,
  pub friend_sender:    PublicUser,
  pub friend_recipient: PublicUser,
  pub status:           EdgeStatus,
  /// Human-readable form of `status`.
  pub message:          String,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// The answer to "how do I stand with this user?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationView {
  pub relation:   RelationStatus,
  pub actor_role: Role,
  pub friendship: FriendshipView,
}

fn lift<E: Into<Error>>(e: E) -> Error { e.into() }

/// Render `edges` with both endpoints resolved through `directory`.
/// Ordering is preserved.
pub async fn view_edges<D>(directory: &D, edges: Vec<Edge>) -> Result<Vec<FriendshipView>>
where
  D: UserDirectory,
{
  let mut ids: Vec<Uuid> = edges.iter().flat_map(|e| [e.sender, e.recipient]).collect();
  ids.sort_unstable();
  ids.dedup();

  let users: HashMap<Uuid, PublicUser> = directory
    .get_users(&ids)
    .await
    .map_err(lift)?
    .iter()
    .map(|u| (u.user_id, PublicUser::from(u)))
    .collect();

  let public = |id: Uuid| users.get(&id).cloned().ok_or(Error::UserNotFound(id));

  edges
    .into_iter()
    .map(|edge| -> Result<FriendshipView> {
      Ok(FriendshipView {
        id:               edge.edge_id,
        friend_sender:    public(edge.sender)?,
        friend_recipient: public(edge.recipient)?,
        status:           edge.status,
        message:          edge.status.message().to_owned(),
        created_at:       edge.created_at,
        updated_at:       edge.updated_at,
      })
    })
    .collect()
}

/// Render a single edge.
pub async fn view_edge<D>(directory: &D, edge: Edge) -> Result<FriendshipView>
where
  D: UserDirectory,
{
  let edge_id = edge.edge_id;
  view_edges(directory, vec![edge])
    .await?
    .pop()
    .ok_or(Error::EdgeNotFound(edge_id))
}

// ─── Lists ───────────────────────────────────────────────────────────────────

/// Pending requests involving `actor`. `incoming` keeps those sent to the
/// actor, `outgoing` those sent by the actor; both or neither keeps all.
pub async fn pending_requests<S>(
  store: &S,
  actor: Uuid,
  incoming: bool,
  outgoing: bool,
) -> Result<Vec<FriendshipView>>
where
  S: RelationshipStore + UserDirectory,
{
  let filter = EdgeFilter::pending(Direction::from_flags(incoming, outgoing));
  let edges = store.list_edges(actor, filter).await.map_err(lift)?;
  view_edges(store, edges).await
}

/// Accepted friendships of `actor`, whichever side sent the request.
pub async fn friendships<S>(store: &S, actor: Uuid) -> Result<Vec<FriendshipView>>
where
  S: RelationshipStore + UserDirectory,
{
  let edges = store
    .list_edges(actor, EdgeFilter::accepted())
    .await
    .map_err(lift)?;
  view_edges(store, edges).await
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// How `actor` stands with the user called `username`.
///
/// An unknown username is [`Error::UsernameNotFound`]; a known user with no
/// edge to the actor is `Ok(None)`.
pub async fn query_relation<S>(
  store: &S,
  actor: Uuid,
  username: &str,
) -> Result<Option<RelationView>>
where
  S: RelationshipStore + UserDirectory,
{
  let other = store
    .find_by_username(username)
    .await
    .map_err(lift)?
    .ok_or_else(|| Error::UsernameNotFound(username.to_owned()))?;

  let Some(Relation { edge, status, actor_role }) = store
    .relation_with(actor, other.user_id)
    .await
    .map_err(lift)?
  else {
    return Ok(None);
  };

  Ok(Some(RelationView {
    relation: status,
    actor_role,
    friendship: view_edge(store, edge).await?,
  }))
}
