pub mod analytics_dto;
pub mod application_dto;
pub mod auth_dto;
pub mod company_dto;
pub mod envelope;
pub mod evaluation_dto;
pub mod internship_dto;
pub mod interview_dto;
pub mod job_dto;
pub mod notification_dto;
pub mod review_dto;
pub mod skill_dto;
pub mod student_dto;
pub mod task_dto;
pub mod transition_dto;
