//! The `RelationshipStore` and `UserDirectory` traits.
//!
//! Both are implemented by storage backends (e.g. `amity-store-sqlite`).
//! Higher layers (`amity-api`) depend on these abstractions, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  edge::{Decision, Edge, EdgeFilter},
  machine::RequestOutcome,
  relation::Relation,
  user::User,
};

// ─── Directory ───────────────────────────────────────────────────────────────

/// Lookup of user identities. Credentials are not the directory's concern.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Register a new user. Fails if the username is invalid or taken.
  fn register_user(
    &self,
    username: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Fetch several users at once. Unknown ids are skipped.
  fn get_users<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// Persistent relationship edges plus the state-machine operations over
/// them.
///
/// Every mutating method must apply the corresponding
/// [`machine`](crate::machine) function inside one serialisable write
/// transaction.
pub trait RelationshipStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// See [`machine::create_request`](crate::machine::create_request).
  fn create_request(
    &self,
    actor: Uuid,
    recipient: Uuid,
  ) -> impl Future<Output = Result<RequestOutcome, Self::Error>> + Send + '_;

  /// See [`machine::respond`](crate::machine::respond).
  fn respond(
    &self,
    actor: Uuid,
    edge_id: Uuid,
    decision: Decision,
  ) -> impl Future<Output = Result<Edge, Self::Error>> + Send + '_;

  /// See [`machine::unfriend`](crate::machine::unfriend).
  fn unfriend(
    &self,
    actor: Uuid,
    edge_id: Uuid,
  ) -> impl Future<Output = Result<Edge, Self::Error>> + Send + '_;

  /// See [`machine::clear_rejected`](crate::machine::clear_rejected).
  fn clear_rejected(
    &self,
    actor: Uuid,
    edge_id: Uuid,
  ) -> impl Future<Output = Result<Edge, Self::Error>> + Send + '_;

  /// Retrieve an edge by id. Returns `None` if not found.
  fn get_edge(
    &self,
    edge_id: Uuid,
  ) -> impl Future<Output = Result<Option<Edge>, Self::Error>> + Send + '_;

  /// `user`'s edges matching `filter`, oldest first.
  fn list_edges(
    &self,
    user: Uuid,
    filter: EdgeFilter,
  ) -> impl Future<Output = Result<Vec<Edge>, Self::Error>> + Send + '_;

  /// See [`machine::relation_between`](crate::machine::relation_between).
  fn relation_with(
    &self,
    actor: Uuid,
    other: Uuid,
  ) -> impl Future<Output = Result<Option<Relation>, Self::Error>> + Send + '_;
}
