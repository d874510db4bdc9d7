use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::internship::AssignmentStatus;
use crate::utils::validation::{
    add_error, check_non_negative, collect, finish, reject_status, require_changes,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInternshipPayload {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stipend: Option<Decimal>,
    #[validate(range(min = 1, max = 1000))]
    pub slots: Option<i32>,
}

fn check_period(errors: &mut ValidationErrors, start: NaiveDate, end: NaiveDate) {
    if end <= start {
        add_error(errors, "end_date", "date_order", "end_date must be after start_date");
    }
}

impl CreateInternshipPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_non_negative(&mut errors, "stipend", self.stipend);
        check_period(&mut errors, self.start_date, self.end_date);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInternshipPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub stipend: Option<Decimal>,
    #[validate(range(min = 1, max = 1000))]
    pub slots: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateInternshipPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_non_negative(&mut errors, "stipend", self.stipend);
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            check_period(&mut errors, start, end);
        }
        let empty = self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.stipend.is_none()
            && self.slots.is_none()
            && self.is_active.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }

    /// Stored dates merged with the patch must still be ordered.
    pub fn check_against(&self, start: NaiveDate, end: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_period(
            &mut errors,
            self.start_date.unwrap_or(start),
            self.end_date.unwrap_or(end),
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InternshipListQuery {
    pub company_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignStudentPayload {
    pub student_id: Uuid,
    #[validate(length(max = 120))]
    pub mentor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAssignmentPayload {
    #[validate(length(min = 1, max = 120))]
    pub mentor: Option<String>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateAssignmentPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        reject_status(&mut errors, self.status.is_some(), "/api/assignments/{id}/status");
        require_changes(&mut errors, self.mentor.is_none() && self.status.is_none());
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentListQuery {
    pub internship_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
