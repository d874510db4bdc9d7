use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::task::{TaskPriority, TaskStatus};
use crate::utils::validation::{collect, finish, reject_status, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskPayload {
    pub assignment_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateTaskPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        reject_status(&mut errors, self.status.is_some(), "/api/tasks/{id}/status");
        let empty = self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    pub assignment_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
