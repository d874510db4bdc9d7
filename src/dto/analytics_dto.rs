use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::company::Company;
use crate::models::internship::InternAssignment;
use crate::models::job::{Job, JobSkill};
use crate::models::student::Student;

/// One dashboard tile. A failed tile does not take the others down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Widget<T> {
    Ok { data: T },
    Error { message: String },
}

impl<T> Widget<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Widget::Ok { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct InterviewStats {
    pub total: i64,
    pub completed: i64,
    pub upcoming: i64,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ReviewStats {
    pub count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDemand {
    pub skill_id: Uuid,
    pub name: String,
    pub category: String,
    pub demand: i64,
    pub supply: i64,
    pub ratio: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub students_by_status: Widget<Vec<LabelCount>>,
    pub active_companies: Widget<i64>,
    pub jobs_by_status: Widget<Vec<LabelCount>>,
    pub applications_by_status: Widget<Vec<LabelCount>>,
    pub upcoming_interviews: Widget<i64>,
    pub active_assignments: Widget<i64>,
}

#[derive(Debug, Serialize)]
pub struct Trends {
    pub applications: Widget<Vec<MonthCount>>,
    pub students: Widget<Vec<MonthCount>>,
}

#[derive(Debug, Serialize)]
pub struct Geography {
    pub students_by_city: Widget<Vec<LabelCount>>,
    pub jobs_by_location: Widget<Vec<LabelCount>>,
}

#[derive(Debug, Serialize)]
pub struct StudentDashboard {
    pub student: Student,
    pub applications_by_status: Widget<Vec<LabelCount>>,
    pub interviews: Widget<InterviewStats>,
    pub skills: Widget<i64>,
    pub unread_notifications: Widget<i64>,
    pub active_assignment: Widget<Option<InternAssignment>>,
}

#[derive(Debug, Serialize)]
pub struct CompanyDashboard {
    pub company: Company,
    pub jobs_by_status: Widget<Vec<LabelCount>>,
    pub applications_by_status: Widget<Vec<LabelCount>>,
    pub reviews: Widget<ReviewStats>,
    pub active_interns: Widget<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job: Job,
    pub applications_by_status: Widget<Vec<LabelCount>>,
    pub interviews: Widget<InterviewStats>,
    pub skills: Widget<Vec<JobSkill>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillsQuery {
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn widgets_serialize_with_status_tag() {
        let ok: Widget<i64> = Widget::Ok { data: 4 };
        let failed: Widget<i64> = Widget::Error {
            message: "timed out".into(),
        };
        assert_eq!(serde_json::to_value(ok).unwrap(), json!({"status": "ok", "data": 4}));
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({"status": "error", "message": "timed out"})
        );
    }
}
