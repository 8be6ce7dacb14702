//! Encoding and decoding helpers between Roster domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, roles
//! their upper-case wire names.

use chrono::{DateTime, Utc};
use roster_core::{
  InstructorRole, Role, TenantId, UserId,
  directory::{Link, LinkedStudent, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── InstructorRole ──────────────────────────────────────────────────────────

pub fn decode_instructor_role(s: &str) -> Result<InstructorRole> {
  match s {
    "PROFESSOR" => Ok(InstructorRole::Professor),
    "NUTRI" => Ok(InstructorRole::Nutri),
    other => Err(Error::Decode(format!("unknown instructor role: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`] at offset 0.
pub const USER_COLUMNS: &str = "user_id, tenant_id, role, name, email, active";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:   String,
  pub tenant_id: Option<String>,
  pub role:      String,
  pub name:      String,
  pub email:     Option<String>,
  pub active:    bool,
}

impl RawUser {
  /// Read the six user columns starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(offset)?,
      tenant_id: row.get(offset + 1)?,
      role:      row.get(offset + 2)?,
      name:      row.get(offset + 3)?,
      email:     row.get(offset + 4)?,
      active:    row.get(offset + 5)?,
    })
  }

  pub fn into_user(self) -> User {
    User {
      id:        UserId::from(self.user_id),
      tenant_id: self.tenant_id.map(TenantId::from),
      // Unknown role strings survive as `Role::Unrecognized`.
      role:      Role::from(self.role),
      name:      self.name,
      email:     self.email,
      active:    self.active,
    }
  }
}

/// Column list matching [`RawLink::from_row`] at offset 0.
pub const LINK_COLUMNS: &str =
  "link_id, student_id, instructor_id, instructor_role, active, created_at";

/// Raw values read directly from an `instructor_links` row.
pub struct RawLink {
  pub link_id:         String,
  pub student_id:      String,
  pub instructor_id:   String,
  pub instructor_role: String,
  pub active:          bool,
  pub created_at:      String,
}

impl RawLink {
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      link_id:         row.get(offset)?,
      student_id:      row.get(offset + 1)?,
      instructor_id:   row.get(offset + 2)?,
      instructor_role: row.get(offset + 3)?,
      active:          row.get(offset + 4)?,
      created_at:      row.get(offset + 5)?,
    })
  }

  pub fn into_link(self) -> Result<Link> {
    Ok(Link {
      id:              decode_uuid(&self.link_id)?,
      student_id:      UserId::from(self.student_id),
      instructor_id:   UserId::from(self.instructor_id),
      instructor_role: decode_instructor_role(&self.instructor_role)?,
      active:          self.active,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// A link row joined with its student's `users` row.
pub struct RawLinkedStudent {
  pub link:    RawLink,
  pub student: RawUser,
}

impl RawLinkedStudent {
  pub fn into_linked(self) -> Result<LinkedStudent> {
    Ok(LinkedStudent {
      link:    self.link.into_link()?,
      student: self.student.into_user(),
    })
  }
}
