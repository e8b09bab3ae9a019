//! The relationship state machine.
//!
//! Each unordered pair of users has at most one edge, which moves from
//! `pending` to `accepted` or `rejected`. Every transition is gated on the
//! actor performing it:
//!
//! | From | Transition | Actor |
//! |------|------------|-------|
//! | —        | request → `pending`                 | sender |
//! | `pending`| reverse request → `accepted`        | recipient (mutual reconciliation) |
//! | `pending`| respond → `accepted` / `rejected`   | recipient |
//! | `accepted` | unfriend → deleted                | either party |
//! | `rejected` | clear → deleted                   | either party |
//!
//! The functions here run against an [`EdgeLedger`], a synchronous view of
//! the edge table scoped to one write transaction. Backends must run each
//! call inside a single transaction so that checking for a reverse request
//! and inserting or flipping are atomic.

use uuid::Uuid;

use crate::{
  Error, Result,
  edge::{Decision, Edge, EdgeFilter, EdgeStatus},
  relation::Relation,
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Transaction-scoped access to stored edges.
pub trait EdgeLedger {
  /// Whether `user` is known to the directory.
  fn user_exists(&mut self, user: Uuid) -> Result<bool>;

  fn get(&mut self, edge_id: Uuid) -> Result<Option<Edge>>;

  /// The pending edge from `sender` to `recipient`, in that direction only.
  fn find_pending(
    &mut self,
    sender: Uuid,
    recipient: Uuid,
  ) -> Result<Option<Edge>>;

  /// The edge joining `a` and `b` in either direction, whatever its status.
  fn find_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<Edge>>;

  /// Insert a new pending edge. Stamps both timestamps.
  ///
  /// Fails with [`Error::SelfRequest`] if `sender == recipient` and with
  /// [`Error::DuplicateRequest`] if the pair already has an edge.
  fn insert(&mut self, sender: Uuid, recipient: Uuid) -> Result<Edge>;

  /// Persist `edge.status` and stamp `edge.updated_at`.
  fn update(&mut self, edge: &mut Edge) -> Result<()>;

  /// Remove an edge. Returns `false` if it did not exist.
  fn delete(&mut self, edge_id: Uuid) -> Result<bool>;

  /// `user`'s edges matching `filter`, oldest first.
  fn list_by_user(&mut self, user: Uuid, filter: EdgeFilter)
  -> Result<Vec<Edge>>;
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// What [`create_request`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
  /// A new pending edge from the actor to the target.
  Created(Edge),
  /// The target had already asked the actor; their edge is now accepted.
  Reconciled(Edge),
}

impl RequestOutcome {
  pub fn edge(&self) -> &Edge {
    match self {
      Self::Created(edge) | Self::Reconciled(edge) => edge,
    }
  }

  pub fn into_edge(self) -> Edge {
    match self {
      Self::Created(edge) | Self::Reconciled(edge) => edge,
    }
  }
}

/// `actor` asks `target` to be friends.
///
/// If `target` already has a pending request to `actor`, that edge is
/// accepted in place and no new edge is created. Otherwise a new pending
/// edge is inserted, unless the pair already has an edge of any status.
pub fn create_request<L>(
  ledger: &mut L,
  actor: Uuid,
  target: Uuid,
) -> Result<RequestOutcome>
where
  L: EdgeLedger + ?Sized,
{
  if actor == target {
    return Err(Error::SelfRequest);
  }
  if !ledger.user_exists(target)? {
    return Err(Error::UnknownRecipient(target));
  }

  if let Some(edge) = reconcile(ledger, actor, target)? {
    return Ok(RequestOutcome::Reconciled(edge));
  }
  if ledger.find_between(actor, target)?.is_some() {
    return Err(Error::DuplicateRequest);
  }

  match ledger.insert(actor, target) {
    Ok(edge) => Ok(RequestOutcome::Created(edge)),
    // Another writer got there first; if it was the reverse request, it is
    // still ours to reconcile.
    Err(Error::DuplicateRequest) => reconcile(ledger, actor, target)?
      .map(RequestOutcome::Reconciled)
      .ok_or(Error::DuplicateRequest),
    Err(e) => Err(e),
  }
}

/// Accept `target`'s pending request to `actor`, if there is one.
fn reconcile<L>(ledger: &mut L, actor: Uuid, target: Uuid) -> Result<Option<Edge>>
where
  L: EdgeLedger + ?Sized,
{
  let Some(mut edge) = ledger.find_pending(target, actor)? else {
    return Ok(None);
  };
  edge.status = EdgeStatus::Accepted;
  ledger.update(&mut edge)?;
  Ok(Some(edge))
}

// ─── Respond ─────────────────────────────────────────────────────────────────

/// The recipient of a pending request accepts or rejects it.
pub fn respond<L>(
  ledger: &mut L,
  actor: Uuid,
  edge_id: Uuid,
  decision: Decision,
) -> Result<Edge>
where
  L: EdgeLedger + ?Sized,
{
  let mut edge = ledger.get(edge_id)?.ok_or(Error::EdgeNotFound(edge_id))?;

  if actor != edge.recipient {
    return Err(Error::NotRecipient(edge_id));
  }
  if !edge.status.is_pending() {
    return Err(Error::AlreadyResolved(edge_id));
  }

  edge.status = decision.status();
  ledger.update(&mut edge)?;
  Ok(edge)
}

// ─── Removal ─────────────────────────────────────────────────────────────────

/// Either party ends an accepted friendship. Returns the deleted edge.
pub fn unfriend<L>(ledger: &mut L, actor: Uuid, edge_id: Uuid) -> Result<Edge>
where
  L: EdgeLedger + ?Sized,
{
  let edge = participant_edge(ledger, actor, edge_id)?;
  if edge.status != EdgeStatus::Accepted {
    return Err(Error::FriendshipNotFound(edge_id));
  }
  remove(ledger, edge)
}

/// Either party deletes a rejected edge, so that a new request between the
/// pair becomes possible. Returns the deleted edge.
pub fn clear_rejected<L>(
  ledger: &mut L,
  actor: Uuid,
  edge_id: Uuid,
) -> Result<Edge>
where
  L: EdgeLedger + ?Sized,
{
  let edge = participant_edge(ledger, actor, edge_id)?;
  if edge.status != EdgeStatus::Rejected {
    return Err(Error::NotRejected(edge_id));
  }
  remove(ledger, edge)
}

fn participant_edge<L>(ledger: &mut L, actor: Uuid, edge_id: Uuid) -> Result<Edge>
where
  L: EdgeLedger + ?Sized,
{
  let edge = ledger.get(edge_id)?.ok_or(Error::EdgeNotFound(edge_id))?;
  if !edge.involves(actor) {
    return Err(Error::NotParticipant(edge_id));
  }
  Ok(edge)
}

fn remove<L>(ledger: &mut L, edge: Edge) -> Result<Edge>
where
  L: EdgeLedger + ?Sized,
{
  if !ledger.delete(edge.edge_id)? {
    return Err(Error::EdgeNotFound(edge.edge_id));
  }
  Ok(edge)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// The classified relation between `actor` and `other`, or `None` if they
/// have no edge.
pub fn relation_between<L>(
  ledger: &mut L,
  actor: Uuid,
  other: Uuid,
) -> Result<Option<Relation>>
where
  L: EdgeLedger + ?Sized,
{
  Ok(
    ledger
      .find_between(actor, other)?
      .and_then(|edge| Relation::classify(edge, actor)),
  )
}
