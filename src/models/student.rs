use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::skill::{Proficiency, SkillCategory};

text_enum! {
    /// Availability of a student for placement.
    pub enum StudentStatus {
        Available => "Available",
        Applied => "Applied",
        Selected => "Selected",
        Completed => "Completed",
        Inactive => "Inactive",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub age: Option<i32>,
    pub education: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: StudentStatus,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentSkill {
    pub student_id: Uuid,
    pub skill_id: Uuid,
    pub skill_name: String,
    #[sqlx(try_from = "String")]
    pub category: SkillCategory,
    #[sqlx(try_from = "String")]
    pub proficiency: Proficiency,
    pub years_experience: Option<i32>,
    pub created_at: DateTime<Utc>,
}
