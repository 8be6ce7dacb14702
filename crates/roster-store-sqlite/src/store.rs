//! [`SqliteDirectory`] — the SQLite implementation of [`Directory`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  InstructorRole, TenantId, UserId,
  directory::{Directory, Link, LinkedStudent, User},
};

use crate::{
  Error, Result,
  encode::{
    LINK_COLUMNS, RawLink, RawLinkedStudent, RawUser, USER_COLUMNS, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A user/link directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(?path, "opening sqlite directory");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory directory — useful for testing.
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
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Provisioning writes ───────────────────────────────────────────────────
  //
  // Used by the external management workflow and by fixtures. The engine
  // never calls these.

  /// Insert a user record verbatim.
  pub async fn insert_user(&self, user: &User) -> Result<()> {
    let id_str     = user.id.as_str().to_owned();
    let tenant_str = user.tenant_id.as_ref().map(|t| t.as_str().to_owned());
    let role_str   = user.role.as_str().to_owned();
    let name       = user.name.clone();
    let email      = user.email.clone();
    let active     = user.active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, tenant_id, role, name, email, active)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, tenant_str, role_str, name, email, active],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flip a user's `active` flag.
  pub async fn set_user_active(&self, user_id: &UserId, active: bool) -> Result<()> {
    let id_str = user_id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET active = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::UserNotFound(user_id.clone()));
    }
    Ok(())
  }

  /// Create a new active link and return it.
  pub async fn insert_link(
    &self,
    student_id: &UserId,
    instructor_id: &UserId,
    instructor_role: InstructorRole,
  ) -> Result<Link> {
    let link = Link {
      id: Uuid::new_v4(),
      student_id: student_id.clone(),
      instructor_id: instructor_id.clone(),
      instructor_role,
      active: true,
      created_at: Utc::now(),
    };

    let id_str         = encode_uuid(link.id);
    let student_str    = link.student_id.as_str().to_owned();
    let instructor_str = link.instructor_id.as_str().to_owned();
    let role_str       = instructor_role.as_str();
    let at_str         = encode_dt(link.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO instructor_links (
             link_id, student_id, instructor_id, instructor_role, active, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, student_str, instructor_str, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  /// Activate or deactivate an existing link.
  pub async fn set_link_active(&self, link_id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(link_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE instructor_links SET active = ?2 WHERE link_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::LinkNotFound(link_id));
    }
    Ok(())
  }

  async fn list_users(&self, sql: String, tenant_id: &TenantId) -> Result<Vec<User>> {
    let tenant_str = tenant_id.as_str().to_owned();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![tenant_str], |row| RawUser::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawUser::into_user).collect())
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteDirectory {
  type Error = Error;

  async fn find_subject(&self, user_id: &UserId) -> Result<Option<User>> {
    let id_str = user_id.as_str().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              |row| RawUser::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }

  async fn find_active_link(
    &self,
    student_id: &UserId,
    instructor_id: &UserId,
    instructor_role: InstructorRole,
  ) -> Result<Option<Link>> {
    let student_str    = student_id.as_str().to_owned();
    let instructor_str = instructor_id.as_str().to_owned();
    let role_str       = instructor_role.as_str();

    let raw: Option<RawLink> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {LINK_COLUMNS} FROM instructor_links
                 WHERE student_id = ?1
                   AND instructor_id = ?2
                   AND instructor_role = ?3
                   AND active = 1
                 ORDER BY created_at, link_id
                 LIMIT 1"
              ),
              rusqlite::params![student_str, instructor_str, role_str],
              |row| RawLink::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLink::into_link).transpose()
  }

  async fn list_active_students(&self, tenant_id: &TenantId) -> Result<Vec<User>> {
    self
      .list_users(
        format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE tenant_id = ?1 AND role = 'ALUNO' AND active = 1
           ORDER BY name, user_id"
        ),
        tenant_id,
      )
      .await
  }

  async fn list_active_links_for_instructor(
    &self,
    instructor_id: &UserId,
    instructor_role: InstructorRole,
  ) -> Result<Vec<LinkedStudent>> {
    let instructor_str = instructor_id.as_str().to_owned();
    let role_str       = instructor_role.as_str();

    // One statement resolves every link to its student, so the pair is read
    // from the same snapshot.
    let raws: Vec<RawLinkedStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             l.link_id, l.student_id, l.instructor_id, l.instructor_role,
             l.active, l.created_at,
             u.user_id, u.tenant_id, u.role, u.name, u.email, u.active
           FROM instructor_links l
           JOIN users u ON u.user_id = l.student_id
           WHERE l.instructor_id = ?1
             AND l.instructor_role = ?2
             AND l.active = 1
             AND u.active = 1
           ORDER BY u.name, u.user_id, l.created_at, l.link_id",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![instructor_str, role_str], |row| {
            Ok(RawLinkedStudent {
              link:    RawLink::from_row(row, 0)?,
              student: RawUser::from_row(row, 6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLinkedStudent::into_linked).collect()
  }

  async fn list_active_instructors(&self, tenant_id: &TenantId) -> Result<Vec<User>> {
    self
      .list_users(
        format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE tenant_id = ?1 AND role IN ('PROFESSOR', 'NUTRI') AND active = 1
           ORDER BY name, user_id"
        ),
        tenant_id,
      )
      .await
  }
}
