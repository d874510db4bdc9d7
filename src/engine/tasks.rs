use uuid::Uuid;

use crate::dto::task_dto::CreateTaskPayload;
use crate::engine::{
    check_transition, ensure_edge, fetch_record, find_student, lock_status, record_change,
    write_status, Actor, EntityKind, Lifecycle, Outcome, Transition, TransitionEngine,
    TransitionError,
};
use crate::models::internship::AssignmentStatus;
use crate::models::notification::NotificationType;
use crate::models::task::{Task, TaskPriority, TaskStatus};
use crate::services::dispatch_service::Notice;
use crate::services::task_service::TASK_COLUMNS;

fn task_select() -> String {
    format!("SELECT {} FROM tasks", TASK_COLUMNS)
}

impl TransitionEngine {
    /// Tasks can only be attached to an Assigned internship assignment.
    pub async fn create_task(
        &self,
        payload: CreateTaskPayload,
        actor: &Actor,
    ) -> Result<Outcome<Task>, TransitionError> {
        let (record, notices) = self.bounded(self.create_task_unit(&payload, actor)).await?;
        tracing::info!(task_id = %record.id, assignment_id = %record.assignment_id, actor = %actor, "task created");
        let warnings = self.notify(&notices).await;
        Ok(Outcome { record, warnings })
    }

    async fn create_task_unit(
        &self,
        payload: &CreateTaskPayload,
        actor: &Actor,
    ) -> Result<(Task, Vec<Notice>), TransitionError> {
        let mut tx = self.pool.begin().await?;

        let assignment: Option<(String, Uuid)> = sqlx::query_as(
            "SELECT status, student_id FROM intern_assignments WHERE id = $1 FOR SHARE",
        )
        .bind(payload.assignment_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (raw, student_id) = assignment.ok_or_else(|| {
            TransitionError::PreconditionFailed(format!(
                "Assignment {} does not exist",
                payload.assignment_id
            ))
        })?;
        let status: AssignmentStatus = raw.parse()?;
        if status != AssignmentStatus::Assigned {
            return Err(TransitionError::PreconditionFailed(format!(
                "Assignment is {}; tasks need an active assignment",
                status
            )));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (assignment_id, title, description, priority, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(payload.assignment_id)
        .bind(payload.title.trim())
        .bind(&payload.description)
        .bind(payload.priority.unwrap_or(TaskPriority::Medium).as_str())
        .bind(payload.due_date)
        .fetch_one(&mut *tx)
        .await?;
        record_change(
            &mut tx,
            EntityKind::Task,
            id,
            None,
            TaskStatus::INITIAL.label(),
            actor,
            None,
        )
        .await?;

        let record: Task = fetch_record(&mut tx, &task_select(), "id", id).await?;
        let student = find_student(&mut tx, student_id).await?;
        tx.commit().await?;

        let notices = student
            .map(|s| {
                let due = record
                    .due_date
                    .map(|d| format!(" (due {})", d))
                    .unwrap_or_default();
                s.notice(
                    "New task",
                    format!("A new task was assigned to you: {}{}.", record.title, due),
                    NotificationType::Info,
                )
            })
            .into_iter()
            .collect();
        Ok((record, notices))
    }

    pub async fn transition_task(
        &self,
        transition: Transition<TaskStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Task>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let record = self
            .bounded(self.transition_task_unit(&transition, from, actor))
            .await?;
        tracing::info!(
            entity = "task",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        Ok(Outcome {
            record,
            warnings: Vec::new(),
        })
    }

    async fn transition_task_unit(
        &self,
        transition: &Transition<TaskStatus>,
        from: TaskStatus,
        actor: &Actor,
    ) -> Result<Task, TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let (current, version) = lock_status::<TaskStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;
        write_status(&mut tx, id, to, version).await?;
        if to == TaskStatus::Completed {
            sqlx::query("UPDATE tasks SET completed_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        record_change(
            &mut tx,
            EntityKind::Task,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        let record: Task = fetch_record(&mut tx, &task_select(), "id", id).await?;
        tx.commit().await?;
        Ok(record)
    }
}
