//! [`SqliteStore`]: the SQLite implementation of [`RelationshipStore`] and
//! [`UserDirectory`].

use std::{path::Path, time::Duration};

use amity_core::{
  edge::{Decision, Direction, Edge, EdgeFilter, EdgeStatus},
  machine::{self, EdgeLedger, RequestOutcome},
  relation::Relation,
  store::{RelationshipStore, UserDirectory},
  user::{User, validate_username},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, ffi};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  encode::{EDGE_COLUMNS, RawEdge, RawUser, USER_COLUMNS, encode_dt, encode_uuid, now},
  schema::SCHEMA,
  Error, Result,
};

/// How long a writer waits for another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Amity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All access
/// is serialised on the connection's thread, and every state-machine
/// operation runs in its own `BEGIN IMMEDIATE` transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` inside one immediate (write-locking) transaction, committing
  /// only if it succeeds.
  async fn transact<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteLedger<'_>) -> amity_core::Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = op(&mut SqliteLedger { conn: &tx });
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;
    Ok(outcome?)
  }

  /// Run a read-only `op` outside any explicit transaction.
  async fn read<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteLedger<'_>) -> amity_core::Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| Ok(op(&mut SqliteLedger { conn: &*conn })))
      .await?;
    Ok(outcome?)
  }

  async fn query_users(&self, where_clause: String, params: Vec<String>) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {where_clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// [`EdgeLedger`] over a connection (usually a transaction) on the
/// connection thread.
pub struct SqliteLedger<'c> {
  conn: &'c rusqlite::Connection,
}

impl SqliteLedger<'_> {
  fn query_edge<P: rusqlite::Params>(
    &self,
    where_clause: &str,
    params: P,
  ) -> Result<Option<Edge>> {
    let sql = format!("SELECT {EDGE_COLUMNS} FROM edges WHERE {where_clause}");
    self
      .conn
      .query_row(&sql, params, RawEdge::from_row)
      .optional()?
      .map(RawEdge::into_edge)
      .transpose()
  }

  fn query_edges<P: rusqlite::Params>(
    &self,
    where_clause: &str,
    params: P,
  ) -> Result<Vec<Edge>> {
    let sql = format!("SELECT {EDGE_COLUMNS} FROM edges WHERE {where_clause}");
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params, RawEdge::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawEdge::into_edge).collect()
  }
}

/// Translate a failed edge insert into the domain error it stands for.
fn insert_error(e: rusqlite::Error, recipient: Uuid) -> amity_core::Error {
  match &e {
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      amity_core::Error::DuplicateRequest
    }
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
    {
      amity_core::Error::UnknownRecipient(recipient)
    }
    _ => Error::Sqlite(e).into(),
  }
}

impl EdgeLedger for SqliteLedger<'_> {
  fn user_exists(&mut self, user: Uuid) -> amity_core::Result<bool> {
    let exists = self
      .conn
      .query_row(
        "SELECT 1 FROM users WHERE user_id = ?1",
        rusqlite::params![encode_uuid(user)],
        |_| Ok(true),
      )
      .optional()
      .map_err(Error::from)?
      .unwrap_or(false);
    Ok(exists)
  }

  fn get(&mut self, edge_id: Uuid) -> amity_core::Result<Option<Edge>> {
    Ok(self.query_edge("edge_id = ?1", rusqlite::params![encode_uuid(edge_id)])?)
  }

  fn find_pending(
    &mut self,
    sender: Uuid,
    recipient: Uuid,
  ) -> amity_core::Result<Option<Edge>> {
    Ok(self.query_edge(
      "sender = ?1 AND recipient = ?2 AND accepted IS NULL",
      rusqlite::params![encode_uuid(sender), encode_uuid(recipient)],
    )?)
  }

  fn find_between(&mut self, a: Uuid, b: Uuid) -> amity_core::Result<Option<Edge>> {
    Ok(self.query_edge(
      "(sender = ?1 AND recipient = ?2) OR (sender = ?2 AND recipient = ?1)",
      rusqlite::params![encode_uuid(a), encode_uuid(b)],
    )?)
  }

  fn insert(&mut self, sender: Uuid, recipient: Uuid) -> amity_core::Result<Edge> {
    if sender == recipient {
      return Err(amity_core::Error::SelfRequest);
    }

    let at = now();
    let edge = Edge {
      edge_id: Uuid::new_v4(),
      sender,
      recipient,
      status: EdgeStatus::Pending,
      created_at: at,
      updated_at: at,
    };

    self
      .conn
      .execute(
        "INSERT INTO edges (edge_id, sender, recipient, accepted, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
        rusqlite::params![
          encode_uuid(edge.edge_id),
          encode_uuid(sender),
          encode_uuid(recipient),
          encode_dt(at),
        ],
      )
      .map_err(|e| insert_error(e, recipient))?;

    Ok(edge)
  }

  fn update(&mut self, edge: &mut Edge) -> amity_core::Result<()> {
    let at = now();
    let changed = self
      .conn
      .execute(
        "UPDATE edges SET accepted = ?2, updated_at = ?3 WHERE edge_id = ?1",
        rusqlite::params![encode_uuid(edge.edge_id), edge.status.as_flag(), encode_dt(at)],
      )
      .map_err(Error::from)?;

    if changed == 0 {
      return Err(amity_core::Error::EdgeNotFound(edge.edge_id));
    }
    edge.updated_at = at;
    Ok(())
  }

  fn delete(&mut self, edge_id: Uuid) -> amity_core::Result<bool> {
    let changed = self
      .conn
      .execute(
        "DELETE FROM edges WHERE edge_id = ?1",
        rusqlite::params![encode_uuid(edge_id)],
      )
      .map_err(Error::from)?;
    Ok(changed > 0)
  }

  fn list_by_user(
    &mut self,
    user: Uuid,
    filter: EdgeFilter,
  ) -> amity_core::Result<Vec<Edge>> {
    let side = match filter.direction {
      Direction::Incoming => "recipient = ?1",
      Direction::Outgoing => "sender = ?1",
      Direction::Both => "(sender = ?1 OR recipient = ?1)",
    };
    Ok(self.query_edges(
      &format!("{side} AND accepted IS ?2 ORDER BY created_at, rowid"),
      rusqlite::params![encode_uuid(user), filter.status.as_flag()],
    )?)
  }
}

// ─── UserDirectory impl ──────────────────────────────────────────────────────

impl UserDirectory for SqliteStore {
  type Error = Error;

  async fn register_user(&self, username: String) -> Result<User> {
    validate_username(&username)?;

    let user = User { user_id: Uuid::new_v4(), username, created_at: now() };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.clone();
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO users (user_id, username, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(f, _))
            if f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(amity_core::Error::UsernameTaken(user.username).into());
    }

    info!(user_id = %user.user_id, username = %user.username, "registered user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(
      self
        .query_users("user_id = ?1".to_owned(), vec![encode_uuid(id)])
        .await?
        .pop(),
    )
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
    Ok(
      self
        .query_users("username = ?1".to_owned(), vec![username.to_owned()])
        .await?
        .pop(),
    )
  }

  async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    self
      .query_users(
        format!("user_id IN ({placeholders})"),
        ids.iter().copied().map(encode_uuid).collect(),
      )
      .await
  }
}

// ─── RelationshipStore impl ──────────────────────────────────────────────────

impl RelationshipStore for SqliteStore {
  type Error = Error;

  async fn create_request(&self, actor: Uuid, recipient: Uuid) -> Result<RequestOutcome> {
    let outcome = self
      .transact(move |ledger| machine::create_request(ledger, actor, recipient))
      .await?;

    match &outcome {
      RequestOutcome::Created(edge) => {
        debug!(edge_id = %edge.edge_id, %actor, %recipient, "friendship requested");
      }
      RequestOutcome::Reconciled(edge) => {
        info!(
          edge_id = %edge.edge_id,
          sender = %edge.sender,
          recipient = %edge.recipient,
          "mutual requests reconciled into friendship"
        );
      }
    }
    Ok(outcome)
  }

  async fn respond(&self, actor: Uuid, edge_id: Uuid, decision: Decision) -> Result<Edge> {
    let edge = self
      .transact(move |ledger| machine::respond(ledger, actor, edge_id, decision))
      .await?;
    debug!(%edge_id, status = ?edge.status, "friendship request answered");
    Ok(edge)
  }

  async fn unfriend(&self, actor: Uuid, edge_id: Uuid) -> Result<Edge> {
    let edge = self
      .transact(move |ledger| machine::unfriend(ledger, actor, edge_id))
      .await?;
    debug!(%edge_id, %actor, "friendship removed");
    Ok(edge)
  }

  async fn clear_rejected(&self, actor: Uuid, edge_id: Uuid) -> Result<Edge> {
    let edge = self
      .transact(move |ledger| machine::clear_rejected(ledger, actor, edge_id))
      .await?;
    debug!(%edge_id, %actor, "rejected request cleared");
    Ok(edge)
  }

  async fn get_edge(&self, edge_id: Uuid) -> Result<Option<Edge>> {
    self.read(move |ledger| ledger.get(edge_id)).await
  }

  async fn list_edges(&self, user: Uuid, filter: EdgeFilter) -> Result<Vec<Edge>> {
    self.read(move |ledger| ledger.list_by_user(user, filter)).await
  }

  async fn relation_with(&self, actor: Uuid, other: Uuid) -> Result<Option<Relation>> {
    self
      .read(move |ledger| machine::relation_between(ledger, actor, other))
      .await
  }
}
