use sqlx::PgConnection;
use uuid::Uuid;

use crate::dto::internship_dto::AssignStudentPayload;
use crate::engine::{
    check_transition, ensure_edge, fetch_record, find_student, lock_status, lock_student,
    move_student, record_change, write_status, Actor, EntityKind, Lifecycle, Outcome, Transition,
    TransitionEngine, TransitionError,
};
use crate::models::internship::{AssignmentStatus, InternAssignment};
use crate::models::notification::NotificationType;
use crate::models::student::StudentStatus;
use crate::services::dispatch_service::Notice;
use crate::services::internship_service::ASSIGNMENT_SELECT;

/// Writes the assignment row and the student's move to Selected on `conn`.
/// Nothing is committed here; the caller owns the transaction.
pub async fn assign_within(
    conn: &mut PgConnection,
    internship_id: Uuid,
    payload: &AssignStudentPayload,
    actor: &Actor,
) -> Result<Uuid, TransitionError> {
    let internship: Option<(bool, i32)> =
        sqlx::query_as("SELECT is_active, slots FROM internships WHERE id = $1 FOR UPDATE")
            .bind(internship_id)
            .fetch_optional(&mut *conn)
            .await?;
    let (is_active, slots) = internship.ok_or(TransitionError::NotFound {
        entity: EntityKind::Internship,
        id: internship_id,
    })?;
    if !is_active {
        return Err(TransitionError::PreconditionFailed(
            "Internship is not active".to_string(),
        ));
    }

    let mut student = lock_student(conn, payload.student_id).await?.ok_or_else(|| {
        TransitionError::PreconditionFailed(format!(
            "Student {} does not exist",
            payload.student_id
        ))
    })?;
    if student.status != StudentStatus::Available {
        return Err(TransitionError::PreconditionFailed(format!(
            "Student is {} and not available for assignment",
            student.status
        )));
    }

    let filled: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM intern_assignments WHERE internship_id = $1 AND status = 'Assigned'",
    )
    .bind(internship_id)
    .fetch_one(&mut *conn)
    .await?;
    if filled >= i64::from(slots) {
        return Err(TransitionError::PreconditionFailed(format!(
            "Internship has no free slots ({} of {} filled)",
            filled, slots
        )));
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO intern_assignments (internship_id, student_id, mentor) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(internship_id)
    .bind(payload.student_id)
    .bind(&payload.mentor)
    .fetch_one(&mut *conn)
    .await?;
    record_change(
        conn,
        EntityKind::Assignment,
        id,
        None,
        AssignmentStatus::INITIAL.label(),
        actor,
        None,
    )
    .await?;
    move_student(conn, &mut student, StudentStatus::Selected, "assigned to an internship").await?;
    Ok(id)
}

impl TransitionEngine {
    pub async fn assign_student(
        &self,
        internship_id: Uuid,
        payload: AssignStudentPayload,
        actor: &Actor,
    ) -> Result<Outcome<InternAssignment>, TransitionError> {
        let (record, notices) = self
            .bounded(self.assign_unit(internship_id, &payload, actor))
            .await?;
        tracing::info!(
            assignment_id = %record.id,
            internship_id = %internship_id,
            student_id = %record.student_id,
            actor = %actor,
            "student assigned"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn assign_unit(
        &self,
        internship_id: Uuid,
        payload: &AssignStudentPayload,
        actor: &Actor,
    ) -> Result<(InternAssignment, Vec<Notice>), TransitionError> {
        let mut tx = self.pool.begin().await?;
        let id = assign_within(&mut tx, internship_id, payload, actor).await?;
        let record: InternAssignment = fetch_record(&mut tx, ASSIGNMENT_SELECT, "x.id", id).await?;
        let student = find_student(&mut tx, record.student_id).await?;
        tx.commit().await?;

        let notices = student
            .map(|s| {
                s.notice(
                    "Internship assignment",
                    format!(
                        "You have been assigned to {}.",
                        record.internship_title.as_deref().unwrap_or("an internship")
                    ),
                    NotificationType::Success,
                )
            })
            .into_iter()
            .collect();
        Ok((record, notices))
    }

    /// Ending an assignment stamps `ended_at` and frees the student.
    pub async fn transition_assignment(
        &self,
        transition: Transition<AssignmentStatus>,
        actor: &Actor,
    ) -> Result<Outcome<InternAssignment>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let (record, notices) = self
            .bounded(self.transition_assignment_unit(&transition, from, actor))
            .await?;
        tracing::info!(
            entity = "assignment",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn transition_assignment_unit(
        &self,
        transition: &Transition<AssignmentStatus>,
        from: AssignmentStatus,
        actor: &Actor,
    ) -> Result<(InternAssignment, Vec<Notice>), TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let student_id: Option<Uuid> =
            sqlx::query_scalar("SELECT student_id FROM intern_assignments WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let student_id = student_id.ok_or(TransitionError::NotFound {
            entity: EntityKind::Assignment,
            id,
        })?;
        let mut student = lock_student(&mut tx, student_id)
            .await?
            .ok_or(TransitionError::NotFound {
                entity: EntityKind::Student,
                id: student_id,
            })?;
        let (current, version) = lock_status::<AssignmentStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;

        write_status(&mut tx, id, to, version).await?;
        sqlx::query("UPDATE intern_assignments SET ended_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        record_change(
            &mut tx,
            EntityKind::Assignment,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        if student.status == StudentStatus::Selected {
            let note = match to {
                AssignmentStatus::Completed => "internship completed",
                _ => "internship cancelled",
            };
            move_student(&mut tx, &mut student, StudentStatus::Available, note).await?;
        }

        let record: InternAssignment = fetch_record(&mut tx, ASSIGNMENT_SELECT, "x.id", id).await?;
        tx.commit().await?;

        let title = record.internship_title.as_deref().unwrap_or("your internship");
        let notice = match to {
            AssignmentStatus::Completed => student.notice(
                "Internship completed",
                format!("Congratulations on completing {}.", title),
                NotificationType::Success,
            ),
            _ => student.notice(
                "Internship cancelled",
                format!("Your assignment to {} has been cancelled.", title),
                NotificationType::Warning,
            ),
        };
        Ok((record, vec![notice]))
    }
}
