//! SQL schema for the Roster SQLite directory.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    tenant_id  TEXT,                        -- NULL only for platform admins
    role       TEXT NOT NULL,               -- 'ADMIN' | 'PROFESSOR' | 'NUTRI' | 'ALUNO'
    name       TEXT NOT NULL,
    email      TEXT,
    active     INTEGER NOT NULL DEFAULT 1
);

-- Instructor-student bindings. Deactivated rather than deleted.
-- (student_id, instructor_id, instructor_role) is intentionally not UNIQUE:
-- uniqueness is the management workflow's concern.
CREATE TABLE IF NOT EXISTS instructor_links (
    link_id          TEXT PRIMARY KEY,
    student_id       TEXT NOT NULL REFERENCES users(user_id),
    instructor_id    TEXT NOT NULL REFERENCES users(user_id),
    instructor_role  TEXT NOT NULL CHECK (instructor_role IN ('PROFESSOR', 'NUTRI')),
    active           INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL   -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS users_tenant_role_idx ON users(tenant_id, role);
CREATE INDEX IF NOT EXISTS links_instructor_idx  ON instructor_links(instructor_id, instructor_role);
CREATE INDEX IF NOT EXISTS links_student_idx     ON instructor_links(student_id);

PRAGMA user_version = 1;
";
