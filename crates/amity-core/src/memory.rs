//! An in-process backend holding everything in hash maps.
//!
//! Useful for tests and for embedding the core without a database. All
//! operations take one lock, which makes every state-machine call atomic.

use std::{
  collections::{HashMap, HashSet},
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  edge::{Decision, Edge, EdgeFilter, EdgeStatus},
  machine::{self, EdgeLedger, RequestOutcome},
  relation::Relation,
  store::{RelationshipStore, UserDirectory},
  user::{User, validate_username},
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Users and edges, with the same constraints as the SQL schema.
#[derive(Debug, Default)]
pub struct MemoryLedger {
  users: HashMap<Uuid, User>,
  edges: HashMap<Uuid, Edge>,
}

impl MemoryLedger {
  pub fn new() -> Self { Self::default() }

  /// Add a user, enforcing username validity and uniqueness.
  pub fn add_user(&mut self, username: String) -> Result<User> {
    validate_username(&username)?;
    if self.users.values().any(|u| u.username == username) {
      return Err(Error::UsernameTaken(username));
    }
    let user = User { user_id: Uuid::new_v4(), username, created_at: Utc::now() };
    self.users.insert(user.user_id, user.clone());
    Ok(user)
  }

  /// Number of edges joining `a` and `b`, in either direction.
  pub fn edges_between(&self, a: Uuid, b: Uuid) -> usize {
    self
      .edges
      .values()
      .filter(|e| e.involves(a) && e.involves(b))
      .count()
  }

  pub fn edge_count(&self) -> usize { self.edges.len() }
}

impl EdgeLedger for MemoryLedger {
  fn user_exists(&mut self, user: Uuid) -> Result<bool> {
    Ok(self.users.contains_key(&user))
  }

  fn get(&mut self, edge_id: Uuid) -> Result<Option<Edge>> {
    Ok(self.edges.get(&edge_id).cloned())
  }

  fn find_pending(&mut self, sender: Uuid, recipient: Uuid) -> Result<Option<Edge>> {
    Ok(
      self
        .edges
        .values()
        .find(|e| {
          e.sender == sender && e.recipient == recipient && e.status.is_pending()
        })
        .cloned(),
    )
  }

  fn find_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<Edge>> {
    Ok(
      self
        .edges
        .values()
        .find(|e| e.involves(a) && e.involves(b))
        .cloned(),
    )
  }

  fn insert(&mut self, sender: Uuid, recipient: Uuid) -> Result<Edge> {
    if sender == recipient {
      return Err(Error::SelfRequest);
    }
    if self.edges_between(sender, recipient) > 0 {
      return Err(Error::DuplicateRequest);
    }
    let now = Utc::now();
    let edge = Edge {
      edge_id: Uuid::new_v4(),
      sender,
      recipient,
      status: EdgeStatus::Pending,
      created_at: now,
      updated_at: now,
    };
    self.edges.insert(edge.edge_id, edge.clone());
    Ok(edge)
  }

  fn update(&mut self, edge: &mut Edge) -> Result<()> {
    let stored = self
      .edges
      .get_mut(&edge.edge_id)
      .ok_or(Error::EdgeNotFound(edge.edge_id))?;
    edge.updated_at = Utc::now();
    stored.status = edge.status;
    stored.updated_at = edge.updated_at;
    Ok(())
  }

  fn delete(&mut self, edge_id: Uuid) -> Result<bool> {
    Ok(self.edges.remove(&edge_id).is_some())
  }

  fn list_by_user(&mut self, user: Uuid, filter: EdgeFilter) -> Result<Vec<Edge>> {
    let mut edges: Vec<Edge> = self
      .edges
      .values()
      .filter(|e| filter.matches(user, e))
      .cloned()
      .collect();
    edges.sort_by_key(|e| e.created_at);
    Ok(edges)
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A [`MemoryLedger`] behind a mutex, implementing both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<MemoryLedger>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Lock the ledger directly, e.g. to inspect it from a test.
  pub fn ledger(&self) -> MutexGuard<'_, MemoryLedger> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl UserDirectory for MemoryStore {
  type Error = Error;

  async fn register_user(&self, username: String) -> Result<User> {
    self.ledger().add_user(username)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.ledger().users.get(&id).cloned())
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
    Ok(
      self
        .ledger()
        .users
        .values()
        .find(|u| u.username == username)
        .cloned(),
    )
  }

  async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
    let wanted: HashSet<&Uuid> = ids.iter().collect();
    let ledger = self.ledger();
    Ok(
      ledger
        .users
        .values()
        .filter(|u| wanted.contains(&u.user_id))
        .cloned()
        .collect(),
    )
  }
}

impl RelationshipStore for MemoryStore {
  type Error = Error;

  async fn create_request(&self, actor: Uuid, recipient: Uuid) -> Result<RequestOutcome> {
    machine::create_request(&mut *self.ledger(), actor, recipient)
  }

  async fn respond(&self, actor: Uuid, edge_id: Uuid, decision: Decision) -> Result<Edge> {
    machine::respond(&mut *self.ledger(), actor, edge_id, decision)
  }

  async fn unfriend(&self, actor: Uuid, edge_id: Uuid) -> Result<Edge> {
    machine::unfriend(&mut *self.ledger(), actor, edge_id)
  }

  async fn clear_rejected(&self, actor: Uuid, edge_id: Uuid) -> Result<Edge> {
    machine::clear_rejected(&mut *self.ledger(), actor, edge_id)
  }

  async fn get_edge(&self, edge_id: Uuid) -> Result<Option<Edge>> {
    self.ledger().get(edge_id)
  }

  async fn list_edges(&self, user: Uuid, filter: EdgeFilter) -> Result<Vec<Edge>> {
    self.ledger().list_by_user(user, filter)
  }

  async fn relation_with(&self, actor: Uuid, other: Uuid) -> Result<Option<Relation>> {
    machine::relation_between(&mut *self.ledger(), actor, other)
  }
}
