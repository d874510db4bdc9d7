use crate::engine::{
    active_assignments, check_transition, ensure_edge, fetch_record, find_student, lock_status,
    open_applications, record_change, write_status, Actor, EntityKind, Lifecycle, Outcome,
    Transition, TransitionEngine, TransitionError,
};
use crate::models::notification::NotificationType;
use crate::models::student::{Student, StudentStatus};
use crate::services::dispatch_service::Notice;
use crate::services::student_service::STUDENT_COLUMNS;

impl TransitionEngine {
    /// Staff-driven availability changes. Edges reserved for the system are
    /// refused as invalid transitions.
    pub async fn transition_student(
        &self,
        transition: Transition<StudentStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Student>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let (record, notices) = self
            .bounded(self.transition_student_unit(&transition, from, actor))
            .await?;
        tracing::info!(
            entity = "student",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn transition_student_unit(
        &self,
        transition: &Transition<StudentStatus>,
        from: StudentStatus,
        actor: &Actor,
    ) -> Result<(Student, Vec<Notice>), TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let (current, version) = lock_status::<StudentStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;

        match to {
            StudentStatus::Inactive => {
                let open = open_applications(&mut tx, id).await?;
                if open > 0 {
                    return Err(TransitionError::PreconditionFailed(format!(
                        "Student has {} open application(s)",
                        open
                    )));
                }
                if active_assignments(&mut tx, id).await? > 0 {
                    return Err(TransitionError::PreconditionFailed(
                        "Student is assigned to an internship".to_string(),
                    ));
                }
            }
            StudentStatus::Completed => {
                if active_assignments(&mut tx, id).await? > 0 {
                    return Err(TransitionError::PreconditionFailed(
                        "Student still has an active internship assignment".to_string(),
                    ));
                }
            }
            _ => {}
        }

        write_status(&mut tx, id, to, version).await?;
        record_change(
            &mut tx,
            EntityKind::Student,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        let select = format!("SELECT {} FROM students", STUDENT_COLUMNS);
        let record: Student = fetch_record(&mut tx, &select, "id", id).await?;
        let contact = find_student(&mut tx, id).await?;
        tx.commit().await?;

        let notices = contact
            .map(|s| {
                s.notice(
                    "Profile status updated",
                    format!("Your placement status is now {}.", to),
                    NotificationType::Info,
                )
            })
            .into_iter()
            .collect();
        Ok((record, notices))
    }
}
