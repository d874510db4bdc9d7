use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::skill::Proficiency;
use crate::models::student::StudentStatus;
use crate::utils::validation::{check_phone, collect, finish, reject_status, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentPayload {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 16, max = 100))]
    pub age: Option<i32>,
    #[validate(length(max = 2000))]
    pub education: Option<String>,
}

impl CreateStudentPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_phone(&mut errors, "phone", self.phone.as_deref());
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStudentPayload {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 16, max = 100))]
    pub age: Option<i32>,
    #[validate(length(max = 2000))]
    pub education: Option<String>,
    /// Only present to be refused.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateStudentPayload {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.city.is_none()
            && self.age.is_none()
            && self.education.is_none()
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_phone(&mut errors, "phone", self.phone.as_deref());
        reject_status(&mut errors, self.status.is_some(), "/api/students/{id}/status");
        require_changes(&mut errors, self.is_empty() && self.status.is_none());
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentListQuery {
    pub status: Option<StudentStatus>,
    pub city: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddStudentSkillPayload {
    pub skill_id: Uuid,
    pub proficiency: Proficiency,
    #[validate(range(min = 0, max = 50))]
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStudentSkillPayload {
    pub proficiency: Option<Proficiency>,
    #[validate(range(min = 0, max = 50))]
    pub years_experience: Option<i32>,
}

impl UpdateStudentSkillPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        require_changes(
            &mut errors,
            self.proficiency.is_none() && self.years_experience.is_none(),
        );
        finish(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::field_errors;
    use serde_json::json;

    #[test]
    fn create_reports_every_bad_field() {
        let payload: CreateStudentPayload = serde_json::from_value(json!({
            "first_name": "",
            "last_name": "Karimova",
            "email": "not-an-email",
            "phone": "abc",
            "age": 12
        }))
        .unwrap();
        let fields: Vec<String> = field_errors(&payload.check().unwrap_err())
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["age", "email", "first_name", "phone"]);
    }

    #[test]
    fn patch_with_status_is_refused() {
        let patch: UpdateStudentPayload =
            serde_json::from_value(json!({"status": "Selected"})).unwrap();
        let errors = field_errors(&patch.check().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "status");
    }

    #[test]
    fn empty_patch_is_refused() {
        let errors = field_errors(&UpdateStudentPayload::default().check().unwrap_err());
        assert_eq!(errors[0].message, "no fields to update");
    }

    #[test]
    fn list_query_parses_status_case_insensitively() {
        let q: StudentListQuery = serde_json::from_value(json!({"status": "available"})).unwrap();
        assert_eq!(q.status, Some(StudentStatus::Available));
    }
}
