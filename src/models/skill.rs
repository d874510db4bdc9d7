use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum SkillCategory {
        Technical => "Technical",
        SoftSkills => "Soft Skills" | "Soft_Skills" | "Soft",
        Language => "Language",
        Certification => "Certification",
        Other => "Other",
    }
}

text_enum! {
    pub enum Proficiency {
        Beginner => "Beginner",
        Intermediate => "Intermediate",
        Advanced => "Advanced",
        Expert => "Expert",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub category: SkillCategory,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
