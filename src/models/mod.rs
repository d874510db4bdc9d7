pub mod admin;
pub mod application;
pub mod company;
pub mod evaluation;
pub mod internship;
pub mod interview;
pub mod job;
pub mod notification;
pub mod review;
pub mod skill;
pub mod status_change;
pub mod student;
pub mod task;

/// A text value that is not a member of the closed set it was parsed into.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value '{value}' (expected one of: {allowed})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub allowed: String,
}
