use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::task_dto::{TaskListQuery, UpdateTaskPayload};
use crate::error::{Error, Result};
use crate::models::task::Task;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

pub(crate) const TASK_COLUMNS: &str = "id, assignment_id, title, description, priority, due_date, status, completed_at, version, created_at, updated_at";

#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: TaskListQuery) -> Result<Page<Task>> {
        let mut filters = Predicates::new();
        filters
            .eq("assignment_id", query.assignment_id)
            .eq("status", query.status.map(|s| s.as_str()))
            .eq("priority", query.priority.map(|p| p.as_str()));

        fetch_page(
            &self.pool,
            &format!("SELECT {} FROM tasks", TASK_COLUMNS),
            "SELECT COUNT(*) FROM tasks",
            &filters,
            "due_date ASC NULLS LAST, created_at, id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Task>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, payload: UpdateTaskPayload) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                due_date = COALESCE($5, due_date),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(payload.priority.map(|p| p.as_str()))
        .bind(payload.due_date)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }
}
