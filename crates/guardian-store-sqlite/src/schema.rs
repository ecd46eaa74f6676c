//! SQL schema for the Guardian SQLite backend.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity records. Owned by the identity provider; the accident store
-- never reads this table.
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- user_id points at the identity provider's records; no FK across that
-- boundary. UNIQUE enforces one station per identity.
CREATE TABLE IF NOT EXISTS stations (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    location_lat REAL NOT NULL,
    location_lng REAL NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- Lifecycle transitions are single-row conditional UPDATEs; the WHERE
-- clause carries the whole concurrency contract. No row ever moves
-- backwards through status.
CREATE TABLE IF NOT EXISTS accidents (
    id               TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    description      TEXT,
    severity         TEXT NOT NULL
                     CHECK (severity IN ('critical','high','medium','low')),
    status           TEXT NOT NULL DEFAULT 'pending'
                     CHECK (status IN ('pending','acknowledged','resolved')),
    location_lat     REAL NOT NULL,
    location_lng     REAL NOT NULL,
    location_address TEXT,
    reported_at      TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    acknowledged_by  TEXT REFERENCES stations(id),
    acknowledged_at  TEXT,
    resolved_at      TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS accidents_reported_idx ON accidents(reported_at);
CREATE INDEX IF NOT EXISTS accidents_status_idx   ON accidents(status);

PRAGMA user_version = 1;
";
