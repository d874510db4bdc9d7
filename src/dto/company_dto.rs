use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::utils::validation::{check_phone, collect, finish, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    pub address: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 120))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
}

impl CreateCompanyPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_phone(&mut errors, "contact_phone", self.contact_phone.as_deref());
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    pub address: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 120))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCompanyPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        check_phone(&mut errors, "contact_phone", self.contact_phone.as_deref());
        let empty = self.name.is_none()
            && self.industry.is_none()
            && self.city.is_none()
            && self.address.is_none()
            && self.website.is_none()
            && self.contact_person.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
            && self.description.is_none()
            && self.is_active.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyListQuery {
    pub industry: Option<String>,
    pub city: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
