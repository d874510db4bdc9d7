use uuid::Uuid;

use crate::dto::interview_dto::CreateInterviewPayload;
use crate::dto::transition_dto::InterviewDetails;
use crate::engine::{
    check_transition, ensure_edge, fetch_record, find_student, lock_status, record_change,
    write_status, Actor, EntityKind, Lifecycle, Outcome, Transition, TransitionEngine,
    TransitionError,
};
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::notification::NotificationType;
use crate::services::dispatch_service::Notice;
use crate::services::interview_service::INTERVIEW_SELECT;

const DEFAULT_DURATION: i32 = 60;

impl TransitionEngine {
    /// Any application status is accepted; the interview's student is
    /// always the application's.
    pub async fn schedule_interview(
        &self,
        payload: CreateInterviewPayload,
        actor: &Actor,
    ) -> Result<Outcome<Interview>, TransitionError> {
        let (record, notices) = self.bounded(self.schedule_unit(&payload, actor)).await?;
        tracing::info!(
            interview_id = %record.id,
            application_id = %record.application_id,
            scheduled_at = %record.scheduled_at,
            actor = %actor,
            "interview scheduled"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn schedule_unit(
        &self,
        payload: &CreateInterviewPayload,
        actor: &Actor,
    ) -> Result<(Interview, Vec<Notice>), TransitionError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT student_id FROM applications WHERE id = $1 FOR SHARE")
                .bind(payload.application_id)
                .fetch_optional(&mut *tx)
                .await?;
        let owner = owner.ok_or_else(|| {
            TransitionError::PreconditionFailed(format!(
                "Application {} does not exist",
                payload.application_id
            ))
        })?;
        if let Some(given) = payload.student_id {
            if given != owner {
                return Err(TransitionError::PreconditionFailed(format!(
                    "Student {} is not the applicant of application {}",
                    given, payload.application_id
                )));
            }
        }
        let student = find_student(&mut tx, owner).await?.ok_or_else(|| {
            TransitionError::PreconditionFailed(format!("Student {} does not exist", owner))
        })?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO interviews (
                application_id, student_id, mode, scheduled_at, duration_minutes,
                location, meeting_link, interviewer
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(payload.application_id)
        .bind(owner)
        .bind(payload.mode.as_str())
        .bind(payload.scheduled_at)
        .bind(payload.duration_minutes.unwrap_or(DEFAULT_DURATION))
        .bind(&payload.location)
        .bind(&payload.meeting_link)
        .bind(&payload.interviewer)
        .fetch_one(&mut *tx)
        .await?;
        record_change(
            &mut tx,
            EntityKind::Interview,
            id,
            None,
            InterviewStatus::INITIAL.label(),
            actor,
            None,
        )
        .await?;

        let record: Interview = fetch_record(&mut tx, INTERVIEW_SELECT, "i.id", id).await?;
        tx.commit().await?;

        let notice = student.notice(
            "Interview scheduled",
            format!(
                "Your {} interview for {} is scheduled at {}.",
                record.mode,
                record.job_title.as_deref().unwrap_or("your application"),
                record.scheduled_at.format("%Y-%m-%d %H:%M UTC")
            ),
            NotificationType::Reminder,
        );
        Ok((record, vec![notice]))
    }

    /// Completing records score and feedback; moving back to Scheduled
    /// takes the new time. The parent application is never touched.
    pub async fn transition_interview(
        &self,
        transition: Transition<InterviewStatus>,
        details: InterviewDetails,
        actor: &Actor,
    ) -> Result<Outcome<Interview>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let (record, notices) = self
            .bounded(self.transition_interview_unit(&transition, &details, from, actor))
            .await?;
        tracing::info!(
            entity = "interview",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn transition_interview_unit(
        &self,
        transition: &Transition<InterviewStatus>,
        details: &InterviewDetails,
        from: InterviewStatus,
        actor: &Actor,
    ) -> Result<(Interview, Vec<Notice>), TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let (current, version) = lock_status::<InterviewStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;

        if to == InterviewStatus::Scheduled && details.scheduled_at.is_none() {
            return Err(TransitionError::PreconditionFailed(
                "A new scheduled_at is required to reschedule".to_string(),
            ));
        }

        write_status(&mut tx, id, to, version).await?;
        match to {
            InterviewStatus::Scheduled => {
                sqlx::query("UPDATE interviews SET scheduled_at = $2 WHERE id = $1")
                    .bind(id)
                    .bind(details.scheduled_at)
                    .execute(&mut *tx)
                    .await?;
            }
            InterviewStatus::Completed => {
                sqlx::query(
                    "UPDATE interviews SET score = COALESCE($2, score), feedback = COALESCE($3, feedback) WHERE id = $1",
                )
                .bind(id)
                .bind(details.score)
                .bind(&details.feedback)
                .execute(&mut *tx)
                .await?;
            }
            _ => {}
        }
        record_change(
            &mut tx,
            EntityKind::Interview,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        let record: Interview = fetch_record(&mut tx, INTERVIEW_SELECT, "i.id", id).await?;
        let student = find_student(&mut tx, record.student_id).await?;
        tx.commit().await?;

        let job = record.job_title.as_deref().unwrap_or("your application");
        let notices = student
            .map(|s| match to {
                InterviewStatus::Scheduled => s.notice(
                    "Interview rescheduled",
                    format!(
                        "Your interview for {} now takes place at {}.",
                        job,
                        record.scheduled_at.format("%Y-%m-%d %H:%M UTC")
                    ),
                    NotificationType::Reminder,
                ),
                InterviewStatus::Cancelled => s.notice(
                    "Interview cancelled",
                    format!("Your interview for {} has been cancelled.", job),
                    NotificationType::Warning,
                ),
                InterviewStatus::Rescheduled => s.notice(
                    "Interview to be rescheduled",
                    format!("Your interview for {} will be rescheduled; a new time will follow.", job),
                    NotificationType::Info,
                ),
                InterviewStatus::Completed => s.notice(
                    "Interview completed",
                    format!("Thank you for attending the interview for {}.", job),
                    NotificationType::Info,
                ),
            })
            .into_iter()
            .collect();
        Ok((record, notices))
    }
}
