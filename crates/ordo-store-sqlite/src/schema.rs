//! SQL schema for the Ordo SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS item_groups (
    group_id    TEXT PRIMARY KEY,
    label       TEXT NOT NULL,
    sort_order  INTEGER NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS item_groups_sort_order_idx
    ON item_groups(sort_order) WHERE active = 1;

-- `position` is only ever written by the positioning engine.
CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    group_id    TEXT NOT NULL REFERENCES item_groups(group_id),
    position    INTEGER NOT NULL,
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed-width microseconds
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS items_group_position_idx
    ON items(group_id, position) WHERE active = 1;

PRAGMA user_version = 1;
";
