use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::engine::Transition;
use crate::models::application::ApplicationStatus;
use crate::models::internship::AssignmentStatus;
use crate::models::interview::InterviewStatus;
use crate::models::job::JobStatus;
use crate::models::student::StudentStatus;
use crate::models::task::TaskStatus;
use crate::utils::validation::{add_error, finish};

const MAX_NOTE: usize = 500;

fn check_note(errors: &mut ValidationErrors, note: Option<&str>) {
    if note.map_or(false, |n| n.chars().count() > MAX_NOTE) {
        add_error(errors, "note", "length", "must be at most 500 characters");
    }
}

macro_rules! status_payload {
    ($name:ident, $status:ty) => {
        #[derive(Debug, Clone, Deserialize)]
        pub struct $name {
            pub status: $status,
            pub expected_status: Option<$status>,
            pub note: Option<String>,
        }

        impl $name {
            pub fn check(&self) -> Result<(), ValidationErrors> {
                let mut errors = ValidationErrors::new();
                check_note(&mut errors, self.note.as_deref());
                finish(errors)
            }

            pub fn into_transition(self, id: Uuid) -> Transition<$status> {
                Transition {
                    id,
                    from: self.expected_status,
                    to: self.status,
                    note: self.note,
                }
            }
        }
    };
}

status_payload!(ApplicationStatusPayload, ApplicationStatus);
status_payload!(JobStatusPayload, JobStatus);
status_payload!(AssignmentStatusPayload, AssignmentStatus);
status_payload!(StudentStatusPayload, StudentStatus);
status_payload!(TaskStatusPayload, TaskStatus);

/// Interview transitions also carry the outcome or the new slot.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewStatusPayload {
    pub status: InterviewStatus,
    pub expected_status: Option<InterviewStatus>,
    pub note: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewDetails {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
}

impl InterviewStatusPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_note(&mut errors, self.note.as_deref());
        if let Some(score) = self.score {
            if !(0..=100).contains(&score) {
                add_error(&mut errors, "score", "range", "must be between 0 and 100");
            }
            if self.status != InterviewStatus::Completed {
                add_error(
                    &mut errors,
                    "score",
                    "completed_only",
                    "score can only be recorded when completing an interview",
                );
            }
        }
        if self.status == InterviewStatus::Scheduled && self.scheduled_at.is_none() {
            add_error(
                &mut errors,
                "scheduled_at",
                "required",
                "a new scheduled_at is required to reschedule",
            );
        }
        finish(errors)
    }

    pub fn into_parts(self, id: Uuid) -> (Transition<InterviewStatus>, InterviewDetails) {
        (
            Transition {
                id,
                from: self.expected_status,
                to: self.status,
                note: self.note,
            },
            InterviewDetails {
                scheduled_at: self.scheduled_at,
                score: self.score,
                feedback: self.feedback,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::field_errors;
    use serde_json::json;

    #[test]
    fn status_labels_with_spaces_deserialize() {
        let p: ApplicationStatusPayload = serde_json::from_value(json!({
            "status": "Under Review",
            "expected_status": "pending"
        }))
        .unwrap();
        let t = p.into_transition(Uuid::nil());
        assert_eq!(t.to, ApplicationStatus::UnderReview);
        assert_eq!(t.from, Some(ApplicationStatus::Pending));
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        let err = serde_json::from_value::<JobStatusPayload>(json!({"status": "Archived"}))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Active, Inactive, Closed"));
    }

    #[test]
    fn rescheduling_needs_a_date_and_score_needs_completion() {
        let p: InterviewStatusPayload =
            serde_json::from_value(json!({"status": "Scheduled", "score": 120})).unwrap();
        let fields: Vec<String> = field_errors(&p.check().unwrap_err())
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["scheduled_at", "score", "score"]);
    }

    #[test]
    fn long_notes_are_refused() {
        let p = TaskStatusPayload {
            status: TaskStatus::Completed,
            expected_status: None,
            note: Some("x".repeat(501)),
        };
        assert!(p.check().is_err());
    }
}
