//! SQL schema for the Amity SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- One row per unordered pair of users, pointing from sender to recipient.
CREATE TABLE IF NOT EXISTS edges (
    edge_id     TEXT PRIMARY KEY,
    sender      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    recipient   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    accepted    INTEGER,         -- NULL pending | 1 accepted | 0 rejected
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; server-assigned
    updated_at  TEXT NOT NULL,
    UNIQUE (sender, recipient),
    CHECK  (sender != recipient),
    CHECK  (accepted IN (0, 1))
);

-- Backstop for the unordered-pair invariant: A->B and B->A cannot coexist.
CREATE UNIQUE INDEX IF NOT EXISTS edges_pair_idx
    ON edges(min(sender, recipient), max(sender, recipient));

CREATE INDEX IF NOT EXISTS edges_sender_idx    ON edges(sender);
CREATE INDEX IF NOT EXISTS edges_recipient_idx ON edges(recipient);

PRAGMA user_version = 1;
";
