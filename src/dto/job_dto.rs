use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::job::{JobStatus, JobType};
use crate::utils::time::today;
use crate::utils::validation::{
    add_error, check_non_negative, collect, finish, reject_status, require_changes,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobPayload {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary: Option<Decimal>,
    pub job_type: JobType,
    #[validate(length(max = 150))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub positions: Option<i32>,
    pub posted_date: Option<NaiveDate>,
    pub deadline: NaiveDate,
}

impl CreateJobPayload {
    pub fn effective_posted_date(&self) -> NaiveDate {
        self.posted_date.unwrap_or_else(today)
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_non_negative(&mut errors, "salary", self.salary);
        check_deadline(&mut errors, self.effective_posted_date(), self.deadline);
        finish(errors)
    }
}

pub fn check_deadline(errors: &mut ValidationErrors, posted: NaiveDate, deadline: NaiveDate) {
    if deadline <= posted {
        add_error(
            errors,
            "deadline",
            "deadline_order",
            "deadline must be after posted_date",
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary: Option<Decimal>,
    pub job_type: Option<JobType>,
    #[validate(length(max = 150))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub positions: Option<i32>,
    pub posted_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateJobPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_non_negative(&mut errors, "salary", self.salary);
        if let (Some(posted), Some(deadline)) = (self.posted_date, self.deadline) {
            check_deadline(&mut errors, posted, deadline);
        }
        reject_status(&mut errors, self.status.is_some(), "/api/jobs/{id}/status");
        let empty = self.title.is_none()
            && self.description.is_none()
            && self.requirements.is_none()
            && self.salary.is_none()
            && self.job_type.is_none()
            && self.location.is_none()
            && self.positions.is_none()
            && self.posted_date.is_none()
            && self.deadline.is_none()
            && self.status.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub company_id: Option<Uuid>,
    pub job_type: Option<JobType>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddJobSkillPayload {
    pub skill_id: Uuid,
    pub is_required: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::field_errors;
    use serde_json::json;

    #[test]
    fn deadline_before_posted_date_is_a_field_error() {
        let payload: CreateJobPayload = serde_json::from_value(json!({
            "company_id": Uuid::new_v4(),
            "title": "Backend Intern",
            "job_type": "Internship",
            "posted_date": "2026-05-10",
            "deadline": "2026-05-01"
        }))
        .unwrap();
        let errors = field_errors(&payload.check().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "deadline");
    }

    #[test]
    fn equal_dates_are_rejected_too() {
        let mut errors = ValidationErrors::new();
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        check_deadline(&mut errors, day, day);
        assert!(!errors.is_empty());
    }

    #[test]
    fn job_type_labels_parse() {
        let payload: UpdateJobPayload =
            serde_json::from_value(json!({"job_type": "full-time"})).unwrap();
        assert_eq!(payload.job_type, Some(JobType::FullTime));
        assert!(payload.check().is_ok());
    }

    #[test]
    fn negative_salary_and_zero_positions_both_reported() {
        let payload: UpdateJobPayload =
            serde_json::from_value(json!({"salary": "-5", "positions": 0})).unwrap();
        let fields: Vec<String> = field_errors(&payload.check().unwrap_err())
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["positions", "salary"]);
    }
}
