//! Status transition engine.
//!
//! Every status write in the system goes through here: the edge is checked
//! against the entity's table, the row is locked and compared with the
//! caller's expected status, preconditions run, and the versioned write,
//! side effects and history row commit in one transaction. Notifications go
//! out after commit and can only produce warnings.

pub mod applications;
pub mod assignments;
pub mod error;
pub mod interviews;
pub mod jobs;
pub mod reconcile;
pub mod status;
pub mod students;
pub mod tasks;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::admin::Role;
use crate::models::application::ApplicationStatus;
use crate::models::notification::NotificationType;
use crate::models::student::StudentStatus;
use crate::services::dispatch_service::{Dispatcher, Notice};
use crate::utils::token::Claims;

pub use error::TransitionError;
pub use status::{verify_tables, EntityKind, Lifecycle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    System,
    Staff {
        id: Uuid,
        username: String,
        role: Role,
    },
}

impl Actor {
    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    pub fn label(&self) -> String {
        match self {
            Actor::System => "system".to_string(),
            Actor::Staff { username, role, .. } => format!("{}:{}", role, username),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Actor::Staff {
            id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

/// A status change request. `from` is the status the caller believes the
/// row is in; when absent the current status is read and used.
#[derive(Debug, Clone)]
pub struct Transition<L> {
    pub id: Uuid,
    pub from: Option<L>,
    pub to: L,
    pub note: Option<String>,
}

impl<L> Transition<L> {
    pub fn new(id: Uuid, to: L) -> Self {
        Self {
            id,
            from: None,
            to,
            note: None,
        }
    }

    pub fn expecting(mut self, from: L) -> Self {
        self.from = Some(from);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub record: T,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct TransitionEngine {
    pool: PgPool,
    dispatcher: Dispatcher,
    timeout: Duration,
}

impl TransitionEngine {
    pub fn new(pool: PgPool, dispatcher: Dispatcher, timeout: Duration) -> Self {
        Self {
            pool,
            dispatcher,
            timeout,
        }
    }

    /// Dropping the unit on timeout rolls its transaction back. A commit
    /// already in flight may still land: the caller then sees `Timeout`, and
    /// repeating the call with the same `from` fails with
    /// `ConcurrentModification` instead of applying twice.
    async fn bounded<T>(
        &self,
        unit: impl Future<Output = Result<T, TransitionError>>,
    ) -> Result<T, TransitionError> {
        tokio::time::timeout(self.timeout, unit)
            .await
            .map_err(|_| TransitionError::Timeout(self.timeout))?
    }

    async fn resolve_from<L: Lifecycle>(
        &self,
        id: Uuid,
        expected: Option<L>,
    ) -> Result<L, TransitionError> {
        if let Some(from) = expected {
            return Ok(from);
        }
        let sql = format!("SELECT status FROM {} WHERE id = $1", L::TABLE);
        let raw: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let raw = raw.ok_or(TransitionError::NotFound { entity: L::KIND, id })?;
        Ok(raw.parse()?)
    }

    async fn notify(&self, notices: &[Notice]) -> Vec<String> {
        let mut warnings = Vec::new();
        for notice in notices {
            warnings.extend(self.dispatcher.dispatch(notice).await);
        }
        warnings
    }
}

pub fn ensure_edge<L: Lifecycle>(from: L, to: L, actor: &Actor) -> Result<(), TransitionError> {
    if from.can_transition(to, actor) {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition {
            entity: L::KIND,
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Edge first, then the locked row's current status against `from`.
pub fn check_transition<L: Lifecycle>(
    id: Uuid,
    current: L,
    from: L,
    to: L,
    actor: &Actor,
) -> Result<(), TransitionError> {
    ensure_edge(from, to, actor)?;
    if current != from {
        return Err(TransitionError::ConcurrentModification {
            entity: L::KIND,
            id,
            detail: format!("expected {}, found {}", from, current),
        });
    }
    Ok(())
}

pub(crate) async fn lock_status<L: Lifecycle>(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<(L, i32), TransitionError> {
    let sql = format!(
        "SELECT status, version FROM {} WHERE id = $1 FOR UPDATE",
        L::TABLE
    );
    let row: Option<(String, i32)> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let (raw, version) = row.ok_or(TransitionError::NotFound { entity: L::KIND, id })?;
    Ok((raw.parse()?, version))
}

pub(crate) async fn write_status<L: Lifecycle>(
    conn: &mut PgConnection,
    id: Uuid,
    to: L,
    version: i32,
) -> Result<(), TransitionError> {
    let sql = format!(
        "UPDATE {} SET status = $1, version = version + 1, updated_at = NOW() \
         WHERE id = $2 AND version = $3",
        L::TABLE
    );
    let done = sqlx::query(&sql)
        .bind(to.label())
        .bind(id)
        .bind(version)
        .execute(&mut *conn)
        .await?;
    if done.rows_affected() == 0 {
        return Err(TransitionError::ConcurrentModification {
            entity: L::KIND,
            id,
            detail: format!("version {} is stale", version),
        });
    }
    Ok(())
}

pub(crate) async fn record_change(
    conn: &mut PgConnection,
    entity: EntityKind,
    id: Uuid,
    from: Option<&str>,
    to: &str,
    actor: &Actor,
    note: Option<&str>,
) -> Result<(), TransitionError> {
    sqlx::query(
        "INSERT INTO status_changes (entity_type, entity_id, from_status, to_status, actor, note) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entity.as_str())
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(actor.label())
    .bind(note)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// The locked student row every cross-entity unit starts from.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentLock {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub status: StudentStatus,
    pub version: i32,
}

impl StudentLock {
    pub fn notice(&self, title: &str, message: String, kind: NotificationType) -> Notice {
        Notice {
            student_id: Some(self.id),
            admin_id: None,
            email: Some(self.email.clone()),
            recipient_name: Some(format!("{} {}", self.first_name, self.last_name)),
            title: title.to_string(),
            message,
            kind,
        }
    }
}

/// Reads a record back inside the unit's transaction.
pub(crate) async fn fetch_record<T>(
    conn: &mut PgConnection,
    select: &str,
    key: &str,
    id: Uuid,
) -> Result<T, TransitionError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!("{} WHERE {} = $1", select, key);
    let record = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(record)
}

const STUDENT_LOCK_SELECT: &str = "SELECT id, first_name, last_name, email, status, version FROM students";

/// Unlocked read, for units that only need the student's contact details.
pub(crate) async fn find_student(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<StudentLock>, TransitionError> {
    let student = sqlx::query_as::<_, StudentLock>(&format!("{} WHERE id = $1", STUDENT_LOCK_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(student)
}

pub(crate) async fn lock_student(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<StudentLock>, TransitionError> {
    let student = sqlx::query_as::<_, StudentLock>(&format!(
        "{} WHERE id = $1 FOR UPDATE",
        STUDENT_LOCK_SELECT
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(student)
}

/// Derived availability change, taken on the system's authority.
pub(crate) async fn move_student(
    conn: &mut PgConnection,
    student: &mut StudentLock,
    to: StudentStatus,
    note: &str,
) -> Result<(), TransitionError> {
    if student.status == to {
        return Ok(());
    }
    if !student.status.can_transition(to, &Actor::System) {
        return Err(TransitionError::PreconditionFailed(format!(
            "Student is {} and cannot become {}",
            student.status, to
        )));
    }
    write_status(conn, student.id, to, student.version).await?;
    record_change(
        conn,
        EntityKind::Student,
        student.id,
        Some(student.status.label()),
        to.label(),
        &Actor::System,
        Some(note),
    )
    .await?;
    tracing::info!(student_id = %student.id, from = %student.status, to = %to, "student availability changed");
    student.status = to;
    student.version += 1;
    Ok(())
}

pub(crate) async fn open_applications(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> Result<i64, TransitionError> {
    let sql = format!(
        "SELECT COUNT(*) FROM applications WHERE student_id = $1 AND status IN {}",
        ApplicationStatus::OPEN_SQL
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub(crate) async fn active_assignments(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> Result<i64, TransitionError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM intern_assignments WHERE student_id = $1 AND status = 'Assigned'",
    )
    .bind(student_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// An Applied student with nothing left open goes back to Available.
pub(crate) async fn release_if_idle(
    conn: &mut PgConnection,
    student: &mut StudentLock,
    note: &str,
) -> Result<bool, TransitionError> {
    if student.status != StudentStatus::Applied {
        return Ok(false);
    }
    if open_applications(conn, student.id).await? > 0 {
        return Ok(false);
    }
    move_student(conn, student, StudentStatus::Available, note).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;

    fn manager() -> Actor {
        Actor::Staff {
            id: Uuid::new_v4(),
            username: "kim".into(),
            role: Role::Manager,
        }
    }

    #[test]
    fn edge_is_checked_before_current_status() {
        let id = Uuid::new_v4();
        let err = check_transition(
            id,
            ApplicationStatus::Pending,
            ApplicationStatus::Selected,
            ApplicationStatus::Pending,
            &manager(),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn stale_expectation_is_concurrent_modification() {
        let id = Uuid::new_v4();
        let err = check_transition(
            id,
            JobStatus::Closed,
            JobStatus::Active,
            JobStatus::Inactive,
            &manager(),
        )
        .unwrap_err();
        match err {
            TransitionError::ConcurrentModification { entity, id: got, detail } => {
                assert_eq!(entity, EntityKind::Job);
                assert_eq!(got, id);
                assert_eq!(detail, "expected Active, found Closed");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn matching_status_on_legal_edge_passes() {
        let id = Uuid::new_v4();
        assert!(check_transition(
            id,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Selected,
            &manager(),
        )
        .is_ok());
    }

    #[test]
    fn actor_labels() {
        assert_eq!(Actor::System.label(), "system");
        assert_eq!(manager().label(), "manager:kim");
    }
}
