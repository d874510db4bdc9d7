use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::models::skill::SkillCategory;
use crate::utils::validation::{collect, finish, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSkillPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub category: SkillCategory,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSkillPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl UpdateSkillPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        require_changes(
            &mut errors,
            self.name.is_none() && self.category.is_none() && self.description.is_none(),
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillListQuery {
    pub category: Option<SkillCategory>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
