//! Availability derivation and drift repair for students.

use serde::Serialize;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::engine::{
    lock_student, move_student, record_change, Actor, EntityKind, Lifecycle, StudentLock,
    TransitionEngine, TransitionError,
};
use crate::models::application::ApplicationStatus;
use crate::models::student::StudentStatus;

/// What a student's status should be given what they currently hold.
///
/// An Assigned internship always means Selected. A Selected student keeps
/// the status while a Selected application backs it. Inactive is a staff
/// decision and Completed stays until something new is opened.
pub fn derive_availability(
    current: StudentStatus,
    open: i64,
    selected: i64,
    active: i64,
) -> StudentStatus {
    use StudentStatus::*;

    if active > 0 {
        return Selected;
    }
    match current {
        Inactive => Inactive,
        Selected if selected > 0 => Selected,
        Completed if open == 0 => Completed,
        _ if open > 0 => Applied,
        _ => Available,
    }
}

#[derive(Debug, Clone, FromRow)]
struct Holdings {
    open: i64,
    selected: i64,
    active: i64,
}

async fn holdings(conn: &mut PgConnection, student_id: Uuid) -> Result<Holdings, TransitionError> {
    let sql = format!(
        r#"
        SELECT
            (SELECT COUNT(*) FROM applications WHERE student_id = $1 AND status IN {open}) AS open,
            (SELECT COUNT(*) FROM applications WHERE student_id = $1 AND status = 'Selected') AS selected,
            (SELECT COUNT(*) FROM intern_assignments WHERE student_id = $1 AND status = 'Assigned') AS active
        "#,
        open = ApplicationStatus::OPEN_SQL
    );
    let row = sqlx::query_as::<_, Holdings>(&sql)
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

/// Moves a locked student to their derived status along system edges,
/// passing through Available when there is no direct edge.
pub(crate) async fn settle_student(
    conn: &mut PgConnection,
    student: &mut StudentLock,
    note: &str,
) -> Result<(), TransitionError> {
    let h = holdings(conn, student.id).await?;
    let target = derive_availability(student.status, h.open, h.selected, h.active);
    if target == student.status {
        return Ok(());
    }
    if !student.status.can_transition(target, &Actor::System) {
        move_student(conn, student, StudentStatus::Available, note).await?;
    }
    move_student(conn, student, target, note).await
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    pub student_id: Uuid,
    pub from: StudentStatus,
    pub to: StudentStatus,
}

impl TransitionEngine {
    /// Recomputes every student's availability and rewrites drifted rows.
    pub async fn reconcile_students(&self) -> Result<Vec<Repair>, TransitionError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM students ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        let mut repairs = Vec::new();
        for id in ids {
            match self.bounded(self.repair_student(id)).await {
                Ok(Some(repair)) => repairs.push(repair),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(student_id = %id, error = %e, "failed to reconcile student");
                }
            }
        }
        tracing::info!(repaired = repairs.len(), "student reconciliation finished");
        Ok(repairs)
    }

    async fn repair_student(&self, id: Uuid) -> Result<Option<Repair>, TransitionError> {
        let mut tx = self.pool.begin().await?;
        let Some(student) = lock_student(&mut tx, id).await? else {
            return Ok(None);
        };
        let h = holdings(&mut tx, id).await?;
        let target = derive_availability(student.status, h.open, h.selected, h.active);
        if target == student.status {
            return Ok(None);
        }

        // A repair is not a transition: it may cross edges no unit would take.
        sqlx::query(
            "UPDATE students SET status = $1, version = version + 1, updated_at = NOW() \
             WHERE id = $2 AND version = $3",
        )
        .bind(target.as_str())
        .bind(id)
        .bind(student.version)
        .execute(&mut *tx)
        .await?;
        record_change(
            &mut tx,
            EntityKind::Student,
            id,
            Some(student.status.as_str()),
            target.as_str(),
            &Actor::System,
            Some("reconciled from applications and assignments"),
        )
        .await?;
        tx.commit().await?;

        tracing::warn!(student_id = %id, from = %student.status, to = %target, "repaired drifted student status");
        Ok(Some(Repair {
            student_id: id,
            from: student.status,
            to: target,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StudentStatus::*;

    #[test]
    fn active_assignment_always_means_selected() {
        for current in StudentStatus::ALL {
            assert_eq!(derive_availability(*current, 0, 0, 1), Selected);
        }
    }

    #[test]
    fn open_applications_mean_applied() {
        assert_eq!(derive_availability(Available, 2, 0, 0), Applied);
        assert_eq!(derive_availability(Completed, 1, 0, 0), Applied);
        assert_eq!(derive_availability(Applied, 0, 0, 0), Available);
    }

    #[test]
    fn selection_is_sticky_only_while_backed() {
        assert_eq!(derive_availability(Selected, 0, 1, 0), Selected);
        assert_eq!(derive_availability(Selected, 1, 0, 0), Applied);
        assert_eq!(derive_availability(Selected, 0, 0, 0), Available);
        // a finished placement does not pull the student back
        assert_eq!(derive_availability(Available, 0, 1, 0), Available);
    }

    #[test]
    fn staff_states_are_left_alone() {
        assert_eq!(derive_availability(Inactive, 0, 3, 0), Inactive);
        assert_eq!(derive_availability(Completed, 0, 1, 0), Completed);
    }
}
