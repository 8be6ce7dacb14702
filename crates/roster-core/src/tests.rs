//! Engine tests against an in-memory directory.

use std::sync::{
  Arc, RwLock,
  atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Actor, AuthorizationEngine, AuthorizationRequest, Decision, DenyReason, Error,
  InstructorRole, Role, TenantId, UserId,
  directory::{Directory, Link, LinkedStudent, User},
};

// ─── Fake directory ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("directory offline")]
struct Offline;

#[derive(Default)]
struct MemoryDirectory {
  users:   RwLock<Vec<User>>,
  links:   RwLock<Vec<Link>>,
  offline: AtomicBool,
}

impl MemoryDirectory {
  fn user(&self, id: &str, role: Role, tenant: Option<&str>) {
    self.users.write().unwrap().push(User {
      id: UserId::from(id),
      tenant_id: tenant.map(TenantId::from),
      role,
      name: format!("User {id}"),
      email: Some(format!("{id}@example.com")),
      active: true,
    });
  }

  fn link(&self, student: &str, instructor: &str, role: InstructorRole) -> Uuid {
    let id = Uuid::new_v4();
    self.links.write().unwrap().push(Link {
      id,
      student_id: UserId::from(student),
      instructor_id: UserId::from(instructor),
      instructor_role: role,
      active: true,
      created_at: Utc::now(),
    });
    id
  }

  fn set_link_active(&self, id: Uuid, active: bool) {
    for link in self.links.write().unwrap().iter_mut() {
      if link.id == id {
        link.active = active;
      }
    }
  }

  fn set_user_active(&self, id: &str, active: bool) {
    for user in self.users.write().unwrap().iter_mut() {
      if user.id.as_str() == id {
        user.active = active;
      }
    }
  }

  fn go_offline(&self) { self.offline.store(true, Ordering::SeqCst); }

  fn check(&self) -> Result<(), Offline> {
    if self.offline.load(Ordering::SeqCst) { Err(Offline) } else { Ok(()) }
  }

  fn users_where(&self, pred: impl Fn(&User) -> bool) -> Vec<User> {
    self.users.read().unwrap().iter().filter(|u| pred(*u)).cloned().collect()
  }
}

impl Directory for MemoryDirectory {
  type Error = Offline;

  async fn find_subject(&self, user_id: &UserId) -> Result<Option<User>, Offline> {
    self.check()?;
    Ok(self.users_where(|u| &u.id == user_id).into_iter().next())
  }

  async fn find_active_link(
    &self,
    student_id: &UserId,
    instructor_id: &UserId,
    instructor_role: InstructorRole,
  ) -> Result<Option<Link>, Offline> {
    self.check()?;
    Ok(
      self
        .links
        .read()
        .unwrap()
        .iter()
        .find(|l| {
          l.active
            && &l.student_id == student_id
            && &l.instructor_id == instructor_id
            && l.instructor_role == instructor_role
        })
        .cloned(),
    )
  }

  async fn list_active_students(&self, tenant_id: &TenantId) -> Result<Vec<User>, Offline> {
    self.check()?;
    Ok(self.users_where(|u| {
      u.active && u.role == Role::Aluno && u.tenant_id.as_ref() == Some(tenant_id)
    }))
  }

  async fn list_active_links_for_instructor(
    &self,
    instructor_id: &UserId,
    instructor_role: InstructorRole,
  ) -> Result<Vec<LinkedStudent>, Offline> {
    self.check()?;
    let links: Vec<Link> = self
      .links
      .read()
      .unwrap()
      .iter()
      .filter(|l| {
        l.active && &l.instructor_id == instructor_id && l.instructor_role == instructor_role
      })
      .cloned()
      .collect();
    Ok(
      links
        .into_iter()
        .filter_map(|link| {
          let student = self
            .users_where(|u| u.id == link.student_id && u.active)
            .into_iter()
            .next()?;
          Some(LinkedStudent { link, student })
        })
        .collect(),
    )
  }

  async fn list_active_instructors(&self, tenant_id: &TenantId) -> Result<Vec<User>, Offline> {
    self.check()?;
    Ok(self.users_where(|u| {
      u.active
        && u.role.instructor_role().is_some()
        && u.tenant_id.as_ref() == Some(tenant_id)
    }))
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Two tenants: `g1` with an admin, a professor, a nutritionist and three
/// students; `g2` with an admin and one student.
fn academy() -> (Arc<MemoryDirectory>, AuthorizationEngine<Arc<MemoryDirectory>>) {
  let dir = Arc::new(MemoryDirectory::default());
  dir.user("admin1", Role::Admin, Some("g1"));
  dir.user("prof1", Role::Professor, Some("g1"));
  dir.user("nutri1", Role::Nutri, Some("g1"));
  dir.user("s1", Role::Aluno, Some("g1"));
  dir.user("s2", Role::Aluno, Some("g1"));
  dir.user("s3", Role::Aluno, Some("g1"));
  dir.user("admin2", Role::Admin, Some("g2"));
  dir.user("t1", Role::Aluno, Some("g2"));
  let engine = AuthorizationEngine::new(Arc::clone(&dir));
  (dir, engine)
}

fn actor(id: &str, role: Role, tenant: Option<&str>) -> Actor {
  Actor::new(id, role, tenant.map(TenantId::from))
}

fn uid(id: &str) -> UserId { UserId::from(id) }

// ─── Input validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_target_is_invalid_request() {
  let (_, engine) = academy();
  let a = actor("admin1", Role::Admin, Some("g1"));
  let err = engine.authorize(&a, &uid("")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest(_)));

  let err = engine.authorize(&a, &uid("   ")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn blank_actor_is_unauthenticated() {
  let (_, engine) = academy();
  let a = actor("", Role::Admin, Some("g1"));
  assert!(matches!(
    engine.authorize(&a, &uid("s1")).await,
    Err(Error::Unauthenticated(_))
  ));
  assert!(matches!(
    engine.resolve_accessible_students(&a).await,
    Err(Error::Unauthenticated(_))
  ));
  assert!(matches!(
    engine.resolve_accessible_instructors(&a).await,
    Err(Error::Unauthenticated(_))
  ));
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn student_sees_only_themselves() {
  let (_, engine) = academy();
  let u1 = actor("u1", Role::Aluno, Some("g1"));

  assert_eq!(engine.authorize(&u1, &uid("u1")).await.unwrap(), Decision::Allowed);
  assert_eq!(
    engine.authorize(&u1, &uid("u2")).await.unwrap(),
    Decision::Denied(DenyReason::SelfOnly)
  );
}

#[tokio::test]
async fn student_without_tenant_is_denied() {
  let (_, engine) = academy();
  let u1 = actor("u1", Role::Aluno, None);
  assert_eq!(
    engine.authorize(&u1, &uid("u1")).await.unwrap(),
    Decision::Denied(DenyReason::MissingTenant)
  );
}

#[tokio::test]
async fn student_lists_are_empty() {
  let (_, engine) = academy();
  let s1 = actor("s1", Role::Aluno, Some("g1"));
  assert!(engine.resolve_accessible_students(&s1).await.unwrap().is_empty());
  assert!(engine.resolve_accessible_instructors(&s1).await.unwrap().is_empty());
}

// ─── Instructors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn professor_needs_active_link() {
  let (dir, engine) = academy();
  let prof = actor("prof1", Role::Professor, Some("g1"));
  let link = dir.link("s1", "prof1", InstructorRole::Professor);

  assert_eq!(engine.authorize(&prof, &uid("s1")).await.unwrap(), Decision::Allowed);

  dir.set_link_active(link, false);
  assert_eq!(
    engine.authorize(&prof, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::NoActiveLink)
  );

  dir.set_link_active(link, true);
  assert_eq!(engine.authorize(&prof, &uid("s1")).await.unwrap(), Decision::Allowed);
}

#[tokio::test]
async fn unlinked_student_is_denied() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  let prof = actor("prof1", Role::Professor, Some("g1"));
  assert_eq!(
    engine.authorize(&prof, &uid("s2")).await.unwrap(),
    Decision::Denied(DenyReason::NoActiveLink)
  );
}

#[tokio::test]
async fn link_role_must_match_actor_role() {
  let (dir, engine) = academy();
  // nutri1 linked as a professor confers nothing to nutri1 acting as NUTRI.
  dir.link("s1", "nutri1", InstructorRole::Professor);
  let nutri = actor("nutri1", Role::Nutri, Some("g1"));
  assert_eq!(
    engine.authorize(&nutri, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::NoActiveLink)
  );

  dir.link("s1", "nutri1", InstructorRole::Nutri);
  assert_eq!(engine.authorize(&nutri, &uid("s1")).await.unwrap(), Decision::Allowed);
}

#[tokio::test]
async fn link_into_another_tenant_is_cross_tenant() {
  let (dir, engine) = academy();
  dir.link("t1", "prof1", InstructorRole::Professor);
  let prof = actor("prof1", Role::Professor, Some("g1"));
  assert_eq!(
    engine.authorize(&prof, &uid("t1")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
}

#[tokio::test]
async fn instructor_without_tenant_is_denied() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  let prof = actor("prof1", Role::Professor, None);
  assert_eq!(
    engine.authorize(&prof, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::MissingTenant)
  );
  assert!(engine.resolve_accessible_students(&prof).await.unwrap().is_empty());
}

#[tokio::test]
async fn professor_students_collapse_duplicate_links() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  dir.link("s1", "prof1", InstructorRole::Professor);
  dir.link("s2", "prof1", InstructorRole::Professor);
  dir.link("s3", "prof1", InstructorRole::Nutri);
  let inactive = dir.link("s3", "prof1", InstructorRole::Professor);
  dir.set_link_active(inactive, false);

  let prof = actor("prof1", Role::Professor, Some("g1"));
  let ids: Vec<String> = engine
    .resolve_accessible_students(&prof)
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.id.to_string())
    .collect();
  assert_eq!(ids, vec!["s1", "s2"]);

  // Duplicates are harmless for single checks too.
  assert_eq!(engine.authorize(&prof, &uid("s1")).await.unwrap(), Decision::Allowed);
}

#[tokio::test]
async fn professor_students_skip_inactive_and_foreign_students() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  dir.link("s2", "prof1", InstructorRole::Professor);
  dir.link("t1", "prof1", InstructorRole::Professor);
  dir.set_user_active("s2", false);

  let prof = actor("prof1", Role::Professor, Some("g1"));
  let students = engine.resolve_accessible_students(&prof).await.unwrap();
  assert_eq!(students.len(), 1);
  assert_eq!(students[0].id, uid("s1"));
  assert_eq!(students[0].email.as_deref(), Some("s1@example.com"));
}

#[tokio::test]
async fn professor_sees_no_instructors() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  let prof = actor("prof1", Role::Professor, Some("g1"));
  assert!(engine.resolve_accessible_instructors(&prof).await.unwrap().is_empty());
}

// ─── Administrators ──────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_sees_own_tenant_only() {
  let (_, engine) = academy();
  let admin = actor("admin1", Role::Admin, Some("g1"));

  assert_eq!(engine.authorize(&admin, &uid("s1")).await.unwrap(), Decision::Allowed);
  assert_eq!(engine.authorize(&admin, &uid("prof1")).await.unwrap(), Decision::Allowed);
  assert_eq!(
    engine.authorize(&admin, &uid("t1")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
  assert_eq!(
    engine.authorize(&admin, &uid("admin2")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
}

#[tokio::test]
async fn admin_missing_subject_is_cross_tenant() {
  let (_, engine) = academy();
  let admin = actor("admin1", Role::Admin, Some("g1"));
  assert_eq!(
    engine.authorize(&admin, &uid("ghost")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
}

#[tokio::test]
async fn admin_without_tenant_sees_nothing() {
  let (dir, engine) = academy();
  dir.user("drifter", Role::Aluno, None);
  let admin = actor("root", Role::Admin, None);

  assert_eq!(
    engine.authorize(&admin, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
  assert_eq!(
    engine.authorize(&admin, &uid("drifter")).await.unwrap(),
    Decision::Denied(DenyReason::CrossTenant)
  );
  assert!(engine.resolve_accessible_students(&admin).await.unwrap().is_empty());
  assert!(engine.resolve_accessible_instructors(&admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_lists_tenant_students_and_instructors() {
  let (dir, engine) = academy();
  dir.set_user_active("s3", false);
  let admin = actor("admin1", Role::Admin, Some("g1"));

  let mut students: Vec<String> = engine
    .resolve_accessible_students(&admin)
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.id.to_string())
    .collect();
  students.sort();
  assert_eq!(students, vec!["s1", "s2"]);

  let instructors = engine.resolve_accessible_instructors(&admin).await.unwrap();
  let mut roles: Vec<(String, InstructorRole)> = instructors
    .into_iter()
    .map(|i| (i.id.to_string(), i.role))
    .collect();
  roles.sort_by(|a, b| a.0.cmp(&b.0));
  assert_eq!(
    roles,
    vec![
      ("nutri1".to_string(), InstructorRole::Nutri),
      ("prof1".to_string(), InstructorRole::Professor),
    ]
  );
}

// ─── Unknown roles ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unrecognized_role_is_denied() {
  let (_, engine) = academy();
  let a = actor("x", Role::from("JANITOR"), Some("g1"));
  assert_eq!(
    engine.authorize(&a, &uid("x")).await.unwrap(),
    Decision::Denied(DenyReason::UnknownRole)
  );
  assert!(engine.resolve_accessible_students(&a).await.unwrap().is_empty());
}

// ─── Directory failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn misspelled_roles_grant_nothing() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);

  let admin = actor("admin1", Role::from("admin"), Some("g1"));
  assert_eq!(
    engine.authorize(&admin, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::UnknownRole)
  );
  assert!(engine.resolve_accessible_students(&admin).await.unwrap().is_empty());
  assert!(engine.resolve_accessible_instructors(&admin).await.unwrap().is_empty());

  let prof = actor("prof1", Role::from(" Professor "), Some("g1"));
  assert_eq!(
    engine.authorize(&prof, &uid("s1")).await.unwrap(),
    Decision::Denied(DenyReason::UnknownRole)
  );
}

#[tokio::test]
async fn directory_failure_is_never_a_denial() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  dir.go_offline();

  let admin = actor("admin1", Role::Admin, Some("g1"));
  let prof = actor("prof1", Role::Professor, Some("g1"));

  assert!(matches!(
    engine.authorize(&admin, &uid("s1")).await,
    Err(Error::DirectoryUnavailable(_))
  ));
  assert!(matches!(
    engine.authorize(&prof, &uid("s1")).await,
    Err(Error::DirectoryUnavailable(_))
  ));
  assert!(matches!(
    engine.resolve_accessible_students(&prof).await,
    Err(Error::DirectoryUnavailable(_))
  ));
  assert!(matches!(
    engine.resolve_accessible_instructors(&admin).await,
    Err(Error::DirectoryUnavailable(_))
  ));

  // Self checks never touch the directory.
  let s1 = actor("s1", Role::Aluno, Some("g1"));
  assert_eq!(engine.authorize(&s1, &uid("s1")).await.unwrap(), Decision::Allowed);
}

// ─── Determinism ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_and_concurrent_checks_agree() {
  let (dir, engine) = academy();
  dir.link("s1", "prof1", InstructorRole::Professor);
  let prof = actor("prof1", Role::Professor, Some("g1"));
  let request = AuthorizationRequest::new(prof.clone(), "s1");

  let s1 = uid("s1");

  let (a, b, c) = tokio::join!(
    engine.evaluate(&request),
    engine.authorize(&prof, &s1),
    engine.authorize(&prof, &s1),
  );
  assert_eq!(a.unwrap(), Decision::Allowed);
  assert_eq!(b.unwrap(), Decision::Allowed);
  assert_eq!(c.unwrap(), Decision::Allowed);

  let first = engine.resolve_accessible_students(&prof).await.unwrap();
  let second = engine.resolve_accessible_students(&prof).await.unwrap();
  assert_eq!(first, second);
}

// ─── Wire forms ──────────────────────────────────────────────────────────────

#[test]
fn role_parsing_keeps_unknown_values() {
  assert_eq!(Role::from("PROFESSOR"), Role::Professor);
  assert_eq!(Role::from("ALUNO"), Role::Aluno);
  assert_eq!(Role::from("professor"), Role::Unrecognized("professor".into()));
  assert_eq!(Role::from(" ADMIN "), Role::Unrecognized(" ADMIN ".into()));
  assert_eq!(Role::from("coach"), Role::Unrecognized("coach".into()));
  assert_eq!(String::from(Role::Nutri), "NUTRI");
  assert_eq!(String::from(Role::from("coach")), "coach");
}

#[test]
fn decision_serializes_with_reason() {
  let denied = serde_json::to_value(Decision::Denied(DenyReason::NoActiveLink)).unwrap();
  assert_eq!(denied, serde_json::json!({ "outcome": "denied", "reason": "no_active_link" }));

  let allowed = serde_json::to_value(Decision::Allowed).unwrap();
  assert_eq!(allowed, serde_json::json!({ "outcome": "allowed" }));
}
