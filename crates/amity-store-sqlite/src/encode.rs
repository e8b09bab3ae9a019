//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that they sort lexicographically. UUIDs are
//! stored as hyphenated lowercase strings. Edge status is the nullable
//! `accepted` flag.

use chrono::{DateTime, SecondsFormat, Utc};
use amity_core::{
  edge::{Edge, EdgeStatus},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time, truncated to what [`encode_dt`] keeps, so that values
/// handed back to callers equal what a later read returns.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEdge::from_row`].
pub const EDGE_COLUMNS: &str =
  "edge_id, sender, recipient, accepted, created_at, updated_at";

/// Raw values read directly from an `edges` row.
pub struct RawEdge {
  pub edge_id:    String,
  pub sender:     String,
  pub recipient:  String,
  pub accepted:   Option<bool>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawEdge {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      edge_id:    row.get(0)?,
      sender:     row.get(1)?,
      recipient:  row.get(2)?,
      accepted:   row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_edge(self) -> Result<Edge> {
    Ok(Edge {
      edge_id:    decode_uuid(&self.edge_id)?,
      sender:     decode_uuid(&self.sender)?,
      recipient:  decode_uuid(&self.recipient)?,
      status:     EdgeStatus::from_flag(self.accepted),
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, username, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
