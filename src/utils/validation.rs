use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub fn validate<T: Validate>(val: &T) -> Result<(), ValidationErrors> {
    val.validate()
}

/// Runs the derived rules and returns the collected errors (possibly empty) so
/// callers can add cross-field rules before deciding.
pub fn collect<T: Validate>(val: &T) -> ValidationErrors {
    match val.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    }
}

pub fn add_error(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
}

/// Rejects a patch that carries none of its fields.
pub fn require_changes(errors: &mut ValidationErrors, is_empty: bool) {
    if is_empty {
        add_error(errors, "body", "empty_patch", "no fields to update");
    }
}

/// Governed status fields only move through their `/status` endpoint.
pub fn reject_status(errors: &mut ValidationErrors, present: bool, endpoint: &'static str) {
    if present {
        add_error(
            errors,
            "status",
            "read_only",
            format!("status cannot be set here; use PUT {}", endpoint),
        );
    }
}

pub fn check_phone(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) {
    if let Some(phone) = value {
        if !is_phone(phone) {
            add_error(errors, field, "phone", "must be a valid phone number");
        }
    }
}

pub fn is_phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        && !value[1..].contains('+')
}

pub fn check_non_negative(errors: &mut ValidationErrors, field: &'static str, value: Option<Decimal>) {
    if matches!(value, Some(v) if v.is_sign_negative() && !v.is_zero()) {
        add_error(errors, field, "range", "must not be negative");
    }
}

pub fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Flattens validator output into one entry per failing rule, sorted by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| default_message(&e.code)),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

fn default_message(code: &str) -> String {
    match code {
        "email" => "must be a valid email address".to_string(),
        "url" => "must be a valid URL".to_string(),
        "length" => "has an invalid length".to_string(),
        "range" => "is out of range".to_string(),
        other => format!("is invalid ({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Probe {
        #[validate(email)]
        email: String,
        #[validate(range(min = 1, max = 5))]
        rating: i32,
    }

    #[test]
    fn every_failing_field_is_reported() {
        let probe = Probe { email: "nope".into(), rating: 9 };
        let errors = validate(&probe).unwrap_err();
        let flat = field_errors(&errors);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].field, "email");
        assert_eq!(flat[0].message, "must be a valid email address");
        assert_eq!(flat[1].field, "rating");
    }

    #[test]
    fn custom_errors_merge_with_derived_ones() {
        let probe = Probe { email: "a@b.io".into(), rating: 3 };
        let mut errors = collect(&probe);
        assert!(errors.is_empty());
        add_error(&mut errors, "deadline", "deadline_order", "deadline must be after posted_date");
        let flat = field_errors(&finish(errors).unwrap_err());
        assert_eq!(flat, vec![FieldError {
            field: "deadline".into(),
            message: "deadline must be after posted_date".into(),
        }]);
    }

    #[test]
    fn phone_numbers() {
        assert!(is_phone("+998 90 123-45-67"));
        assert!(is_phone("(555) 123 4567"));
        assert!(!is_phone("12345"));
        assert!(!is_phone("call me"));
        assert!(!is_phone("90+1234567"));
    }

    #[test]
    fn status_in_patch_points_at_endpoint() {
        let mut errors = ValidationErrors::new();
        reject_status(&mut errors, true, "/api/students/{id}/status");
        let flat = field_errors(&errors);
        assert_eq!(flat[0].field, "status");
        assert_eq!(flat[0].message, "status cannot be set here; use PUT /api/students/{id}/status");
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut errors = ValidationErrors::new();
        check_non_negative(&mut errors, "salary", Some(Decimal::new(-1, 0)));
        check_non_negative(&mut errors, "stipend", Some(Decimal::ZERO));
        assert_eq!(field_errors(&errors).len(), 1);
    }

    #[test]
    fn empty_patch_is_reported_on_body() {
        let mut errors = ValidationErrors::new();
        require_changes(&mut errors, true);
        let flat = field_errors(&errors);
        assert_eq!(flat[0].field, "body");
        assert_eq!(flat[0].message, "no fields to update");

        let mut errors = ValidationErrors::new();
        require_changes(&mut errors, false);
        assert!(errors.is_empty());
    }
}
