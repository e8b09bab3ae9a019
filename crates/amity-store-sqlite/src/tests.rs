//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use amity_core::{
  edge::{Decision, Direction, EdgeFilter, EdgeStatus, Role},
  machine::RequestOutcome,
  relation::RelationStatus,
  store::{RelationshipStore, UserDirectory},
  user::User,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.register_user(name.to_owned()).await.unwrap()
}

fn core(e: Error) -> amity_core::Error { e.into() }

async fn edge_count(s: &SqliteStore) -> i64 {
  s.conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM edges", [], |r| r.get(0))?)
    })
    .await
    .unwrap()
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_look_up_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let by_id = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(by_id, alice);

  let by_name = s.find_by_username("alice").await.unwrap().unwrap();
  assert_eq!(by_name.user_id, alice.user_id);

  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  user(&s, "alice").await;
  let err = s.register_user("alice".to_owned()).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::UsernameTaken(_)));
}

#[tokio::test]
async fn invalid_username_is_rejected() {
  let s = store().await;
  let err = s.register_user("not valid".to_owned()).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::InvalidUsername(_)));
}

#[tokio::test]
async fn get_users_skips_unknown_ids() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  let found = s
    .get_users(&[a.user_id, Uuid::new_v4(), b.user_id])
    .await
    .unwrap();
  let names: HashSet<String> = found.into_iter().map(|u| u.username).collect();
  assert_eq!(names, HashSet::from(["a".to_owned(), "b".to_owned()]));

  assert!(s.get_users(&[]).await.unwrap().is_empty());
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_request_persists_pending_edge() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);

  let outcome = s.create_request(a.user_id, b.user_id).await.unwrap();
  assert!(matches!(outcome, RequestOutcome::Created(_)));

  let stored = s.get_edge(outcome.edge().edge_id).await.unwrap().unwrap();
  assert_eq!(&stored, outcome.edge());
  assert_eq!(stored.status, EdgeStatus::Pending);
  assert_eq!(stored.created_at, stored.updated_at);
}

#[tokio::test]
async fn mutual_request_reconciles_in_place() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);

  let first = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  let outcome = s.create_request(b.user_id, a.user_id).await.unwrap();

  let RequestOutcome::Reconciled(edge) = outcome else {
    panic!("expected reconciliation, got {outcome:?}");
  };
  assert_eq!(edge.edge_id, first.edge_id);
  assert_eq!(edge.sender, a.user_id);
  assert_eq!(edge.status, EdgeStatus::Accepted);
  assert_eq!(edge_count(&s).await, 1);

  let stored = s.get_edge(first.edge_id).await.unwrap().unwrap();
  assert_eq!(stored.status, EdgeStatus::Accepted);
  assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn duplicate_and_self_requests_fail() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);
  s.create_request(a.user_id, b.user_id).await.unwrap();

  let err = s.create_request(a.user_id, b.user_id).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::DuplicateRequest));

  let err = s.create_request(a.user_id, a.user_id).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::SelfRequest));

  assert_eq!(edge_count(&s).await, 1);
}

#[tokio::test]
async fn request_to_unknown_user_fails() {
  let s = store().await;
  let a = user(&s, "a").await;
  let err = s.create_request(a.user_id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::UnknownRecipient(_)));
}

#[tokio::test]
async fn request_sequences_never_duplicate_a_pair() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await.user_id, user(&s, "b").await.user_id);
  for (from, to) in [(a, b), (b, a), (a, b), (b, a), (b, a)] {
    let _ = s.create_request(from, to).await;
    assert!(edge_count(&s).await <= 1);
  }
  assert_eq!(edge_count(&s).await, 1);
}

#[tokio::test]
async fn reverse_edge_is_blocked_by_the_schema() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);
  s.create_request(a.user_id, b.user_id).await.unwrap();

  let (sender, recipient) = (b.user_id.to_string(), a.user_id.to_string());
  let res = s
    .conn
    .call(move |conn| {
      Ok(conn.execute(
        "INSERT INTO edges (edge_id, sender, recipient, accepted, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        rusqlite::params![Uuid::new_v4().to_string(), sender, recipient],
      ))
    })
    .await
    .unwrap();
  assert!(res.is_err(), "reverse edge must violate the pair index");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_opposite_requests_on_shared_file_become_one_friendship() {
  let path = std::env::temp_dir().join(format!("amity-race-{}.db", Uuid::new_v4()));
  let first = SqliteStore::open(&path).await.unwrap();
  let second = SqliteStore::open(&path).await.unwrap();

  for round in 0..10 {
    let a = user(&first, &format!("left{round}")).await.user_id;
    let b = user(&first, &format!("right{round}")).await.user_id;

    let (s1, s2) = (first.clone(), second.clone());
    let forward = tokio::spawn(async move { s1.create_request(a, b).await });
    let backward = tokio::spawn(async move { s2.create_request(b, a).await });
    let (forward, backward) = (forward.await.unwrap(), backward.await.unwrap());

    let outcomes = [forward.unwrap(), backward.unwrap()];
    assert_eq!(
      outcomes.iter().filter(|o| matches!(o, RequestOutcome::Created(_))).count(),
      1,
      "round {round}: {outcomes:?}"
    );
    assert_eq!(outcomes[0].edge().edge_id, outcomes[1].edge().edge_id);

    let friends = first.list_edges(a, EdgeFilter::accepted()).await.unwrap();
    assert_eq!(friends.len(), 1, "round {round}");
    assert!(friends[0].involves(b));
    let pending = first.list_edges(a, EdgeFilter::pending(Direction::Both)).await.unwrap();
    assert!(pending.is_empty(), "round {round}");
  }

  drop((first, second));
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn recipient_accepts_and_rejects() {
  let s = store().await;
  let (a, b, c) = (user(&s, "a").await, user(&s, "b").await, user(&s, "c").await);
  let e1 = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  let e2 = s.create_request(a.user_id, c.user_id).await.unwrap().into_edge();

  let accepted = s.respond(b.user_id, e1.edge_id, Decision::Accept).await.unwrap();
  assert_eq!(accepted.status, EdgeStatus::Accepted);
  assert_eq!(
    s.get_edge(e1.edge_id).await.unwrap().unwrap().updated_at,
    accepted.updated_at
  );

  s.respond(c.user_id, e2.edge_id, Decision::Reject).await.unwrap();
  let stored = s.get_edge(e2.edge_id).await.unwrap().unwrap();
  assert_eq!(stored.status, EdgeStatus::Rejected);
}

#[tokio::test]
async fn non_recipient_cannot_respond() {
  let s = store().await;
  let (a, b, c) = (user(&s, "a").await, user(&s, "b").await, user(&s, "c").await);
  let edge = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();

  for actor in [a.user_id, c.user_id] {
    let err = s.respond(actor, edge.edge_id, Decision::Accept).await.unwrap_err();
    assert!(matches!(core(err), amity_core::Error::NotRecipient(_)));
  }
  let stored = s.get_edge(edge.edge_id).await.unwrap().unwrap();
  assert_eq!(stored.status, EdgeStatus::Pending);
}

#[tokio::test]
async fn resolved_request_is_a_conflict() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);
  let edge = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  s.respond(b.user_id, edge.edge_id, Decision::Reject).await.unwrap();

  let err = s.respond(b.user_id, edge.edge_id, Decision::Accept).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::AlreadyResolved(_)));
}

#[tokio::test]
async fn respond_to_missing_edge_is_not_found() {
  let s = store().await;
  let a = user(&s, "a").await;
  let err = s.respond(a.user_id, Uuid::new_v4(), Decision::Accept).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::EdgeNotFound(_)));
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_pending_by_direction() {
  let s = store().await;
  let x = user(&s, "x").await.user_id;
  let mut senders = HashSet::new();
  let mut recipients = HashSet::new();
  for name in ["u1", "u2"] {
    let u = user(&s, name).await.user_id;
    s.create_request(u, x).await.unwrap();
    senders.insert(u);
  }
  for name in ["u3", "u4"] {
    let u = user(&s, name).await.user_id;
    s.create_request(x, u).await.unwrap();
    recipients.insert(u);
  }

  let incoming = s.list_edges(x, EdgeFilter::pending(Direction::Incoming)).await.unwrap();
  assert_eq!(incoming.iter().map(|e| e.sender).collect::<HashSet<_>>(), senders);

  let outgoing = s.list_edges(x, EdgeFilter::pending(Direction::Outgoing)).await.unwrap();
  assert_eq!(outgoing.iter().map(|e| e.recipient).collect::<HashSet<_>>(), recipients);

  let all = s.list_edges(x, EdgeFilter::pending(Direction::Both)).await.unwrap();
  assert_eq!(all.len(), 4);
  assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn list_accepted_excludes_other_statuses() {
  let s = store().await;
  let x = user(&s, "x").await.user_id;
  let (f, r, p) = (
    user(&s, "friend").await.user_id,
    user(&s, "rejecter").await.user_id,
    user(&s, "pending").await.user_id,
  );

  let e = s.create_request(f, x).await.unwrap().into_edge();
  s.respond(x, e.edge_id, Decision::Accept).await.unwrap();
  let e = s.create_request(x, r).await.unwrap().into_edge();
  s.respond(r, e.edge_id, Decision::Reject).await.unwrap();
  s.create_request(x, p).await.unwrap();

  let accepted = s.list_edges(x, EdgeFilter::accepted()).await.unwrap();
  assert_eq!(accepted.len(), 1);
  assert_eq!(accepted[0].sender, f);
  assert!(accepted.iter().all(|e| e.status == EdgeStatus::Accepted));
}

// ─── Removal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unfriend_deletes_the_row() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);
  let edge = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  s.respond(b.user_id, edge.edge_id, Decision::Accept).await.unwrap();

  s.unfriend(b.user_id, edge.edge_id).await.unwrap();
  assert!(s.get_edge(edge.edge_id).await.unwrap().is_none());

  let err = s.unfriend(b.user_id, edge.edge_id).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::EdgeNotFound(_)));
}

#[tokio::test]
async fn unfriend_by_outsider_is_refused() {
  let s = store().await;
  let (a, b, c) = (user(&s, "a").await, user(&s, "b").await, user(&s, "c").await);
  let edge = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  s.create_request(b.user_id, a.user_id).await.unwrap();

  let err = s.unfriend(c.user_id, edge.edge_id).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::NotParticipant(_)));
  assert_eq!(edge_count(&s).await, 1);
}

#[tokio::test]
async fn cleared_rejection_allows_a_new_request() {
  let s = store().await;
  let (a, b) = (user(&s, "a").await, user(&s, "b").await);
  let edge = s.create_request(a.user_id, b.user_id).await.unwrap().into_edge();
  s.respond(b.user_id, edge.edge_id, Decision::Reject).await.unwrap();

  let err = s.create_request(b.user_id, a.user_id).await.unwrap_err();
  assert!(matches!(core(err), amity_core::Error::DuplicateRequest));

  s.clear_rejected(b.user_id, edge.edge_id).await.unwrap();
  let outcome = s.create_request(b.user_id, a.user_id).await.unwrap();
  assert!(matches!(outcome, RequestOutcome::Created(ref e) if e.sender == b.user_id));
}

// ─── Relation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn relation_with_classifies_edges() {
  let s = store().await;
  let (x, y, z) = (user(&s, "x").await, user(&s, "y").await, user(&s, "z").await);
  s.create_request(y.user_id, x.user_id).await.unwrap();

  let rel = s.relation_with(x.user_id, y.user_id).await.unwrap().unwrap();
  assert_eq!(rel.status, RelationStatus::Waiting);
  assert_eq!(rel.actor_role, Role::Recipient);

  s.create_request(x.user_id, y.user_id).await.unwrap();
  let rel = s.relation_with(y.user_id, x.user_id).await.unwrap().unwrap();
  assert_eq!(rel.status, RelationStatus::Friends);
  assert_eq!(rel.actor_role, Role::Sender);

  assert!(s.relation_with(x.user_id, z.user_id).await.unwrap().is_none());
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_survives_reopen() {
  let path = std::env::temp_dir().join(format!("amity-test-{}.db", Uuid::new_v4()));

  let edge_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let (a, b) = (user(&s, "a").await, user(&s, "b").await);
    s.create_request(a.user_id, b.user_id).await.unwrap().into_edge().edge_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let edge = s.get_edge(edge_id).await.unwrap().unwrap();
  assert_eq!(edge.status, EdgeStatus::Pending);
  assert!(s.find_by_username("a").await.unwrap().is_some());

  drop(s);
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}
