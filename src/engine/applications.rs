use chrono::NaiveDate;
use uuid::Uuid;

use crate::dto::application_dto::CreateApplicationPayload;
use crate::engine::reconcile::settle_student;
use crate::engine::{
    check_transition, ensure_edge, fetch_record, lock_status, lock_student, move_student,
    record_change, release_if_idle, write_status, Actor, EntityKind, Lifecycle, Outcome,
    Transition, TransitionEngine, TransitionError,
};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::job::JobStatus;
use crate::models::notification::NotificationType;
use crate::models::student::StudentStatus;
use crate::services::application_service::APPLICATION_SELECT;
use crate::services::dispatch_service::Notice;

async fn application_student(
    conn: &mut sqlx::PgConnection,
    id: Uuid,
) -> Result<Uuid, TransitionError> {
    let student_id: Option<Uuid> = sqlx::query_scalar("SELECT student_id FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    student_id.ok_or(TransitionError::NotFound {
        entity: EntityKind::Application,
        id,
    })
}

impl TransitionEngine {
    /// Creates a Pending application and marks the student Applied.
    pub async fn submit_application(
        &self,
        payload: CreateApplicationPayload,
        actor: &Actor,
    ) -> Result<Outcome<Application>, TransitionError> {
        let (record, notices) = self.bounded(self.submit_unit(&payload, actor)).await?;
        tracing::info!(
            application_id = %record.id,
            student_id = %record.student_id,
            job_id = %record.job_id,
            actor = %actor,
            "application submitted"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn submit_unit(
        &self,
        payload: &CreateApplicationPayload,
        actor: &Actor,
    ) -> Result<(Application, Vec<Notice>), TransitionError> {
        let mut tx = self.pool.begin().await?;

        let mut student = lock_student(&mut tx, payload.student_id).await?.ok_or_else(|| {
            TransitionError::PreconditionFailed(format!(
                "Student {} does not exist",
                payload.student_id
            ))
        })?;

        // a repeated pair is a conflict whatever the first one became
        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE student_id = $1 AND job_id = $2)",
        )
        .bind(payload.student_id)
        .bind(payload.job_id)
        .fetch_one(&mut *tx)
        .await?;
        if duplicate {
            return Err(TransitionError::Conflict(
                "Student has already applied to this job".to_string(),
            ));
        }

        if matches!(student.status, StudentStatus::Selected | StudentStatus::Inactive) {
            return Err(TransitionError::PreconditionFailed(format!(
                "Student is {} and cannot apply to jobs",
                student.status
            )));
        }

        let job: Option<(String, NaiveDate, bool)> = sqlx::query_as(
            "SELECT status, deadline, deadline < CURRENT_DATE FROM jobs WHERE id = $1 FOR SHARE",
        )
        .bind(payload.job_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (job_status, deadline, expired) = job.ok_or_else(|| {
            TransitionError::PreconditionFailed(format!("Job {} does not exist", payload.job_id))
        })?;
        let job_status: JobStatus = job_status.parse()?;
        if job_status != JobStatus::Active {
            return Err(TransitionError::PreconditionFailed(format!(
                "Job is {} and not accepting applications",
                job_status
            )));
        }
        if expired {
            return Err(TransitionError::PreconditionFailed(format!(
                "Application deadline {} has passed",
                deadline
            )));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO applications (student_id, job_id, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(payload.student_id)
        .bind(payload.job_id)
        .bind(&payload.cover_letter)
        .bind(&payload.resume_url)
        .fetch_one(&mut *tx)
        .await?;
        record_change(
            &mut tx,
            EntityKind::Application,
            id,
            None,
            ApplicationStatus::INITIAL.label(),
            actor,
            None,
        )
        .await?;

        if matches!(student.status, StudentStatus::Available | StudentStatus::Completed) {
            move_student(&mut tx, &mut student, StudentStatus::Applied, "applied to a job").await?;
        }

        let record: Application = fetch_record(&mut tx, APPLICATION_SELECT, "a.id", id).await?;
        tx.commit().await?;

        let notice = student.notice(
            "Application received",
            format!(
                "Your application for {} has been received.",
                record.job_title.as_deref().unwrap_or("the job")
            ),
            NotificationType::Info,
        );
        Ok((record, vec![notice]))
    }

    pub async fn transition_application(
        &self,
        transition: Transition<ApplicationStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Application>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let (record, notices) = self
            .bounded(self.transition_application_unit(&transition, from, actor))
            .await?;
        tracing::info!(
            entity = "application",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn transition_application_unit(
        &self,
        transition: &Transition<ApplicationStatus>,
        from: ApplicationStatus,
        actor: &Actor,
    ) -> Result<(Application, Vec<Notice>), TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let student_id = application_student(&mut tx, id).await?;
        let mut student = lock_student(&mut tx, student_id)
            .await?
            .ok_or(TransitionError::NotFound {
                entity: EntityKind::Student,
                id: student_id,
            })?;
        let (current, version) = lock_status::<ApplicationStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;

        if to == ApplicationStatus::Selected
            && matches!(student.status, StudentStatus::Selected | StudentStatus::Inactive)
        {
            return Err(TransitionError::PreconditionFailed(format!(
                "Student is already {} and cannot be selected",
                student.status
            )));
        }

        write_status(&mut tx, id, to, version).await?;
        record_change(
            &mut tx,
            EntityKind::Application,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        match to {
            ApplicationStatus::Selected => {
                move_student(&mut tx, &mut student, StudentStatus::Selected, "selected for a job")
                    .await?;
            }
            ApplicationStatus::Rejected => {
                release_if_idle(&mut tx, &mut student, "no open applications left").await?;
            }
            _ => {}
        }

        let record: Application = fetch_record(&mut tx, APPLICATION_SELECT, "a.id", id).await?;
        tx.commit().await?;

        let job = record.job_title.as_deref().unwrap_or("the job");
        let notice = match to {
            ApplicationStatus::Selected => student.notice(
                "You have been selected",
                format!("Congratulations, you have been selected for {}.", job),
                NotificationType::Success,
            ),
            ApplicationStatus::Rejected => student.notice(
                "Application update",
                format!("Your application for {} was not successful this time.", job),
                NotificationType::Warning,
            ),
            other => student.notice(
                "Application update",
                format!("Your application for {} is now {}.", job, other),
                NotificationType::Info,
            ),
        };
        Ok((record, vec![notice]))
    }

    /// Deletes the application; its interviews cascade and the student's
    /// availability is settled against what remains.
    pub async fn withdraw_application(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<Outcome<()>, TransitionError> {
        let from = self.bounded(self.withdraw_unit(id, actor)).await?;
        tracing::info!(application_id = %id, from = %from, actor = %actor, "application withdrawn");
        Ok(Outcome {
            record: (),
            warnings: Vec::new(),
        })
    }

    async fn withdraw_unit(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<ApplicationStatus, TransitionError> {
        let mut tx = self.pool.begin().await?;

        let student_id = application_student(&mut tx, id).await?;
        let mut student = lock_student(&mut tx, student_id)
            .await?
            .ok_or(TransitionError::NotFound {
                entity: EntityKind::Student,
                id: student_id,
            })?;
        let (current, _) = lock_status::<ApplicationStatus>(&mut tx, id).await?;

        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        record_change(
            &mut tx,
            EntityKind::Application,
            id,
            Some(current.label()),
            "Withdrawn",
            actor,
            None,
        )
        .await?;
        settle_student(&mut tx, &mut student, "application withdrawn").await?;
        tx.commit().await?;

        Ok(current)
    }
}
