pub mod analytics_service;
pub mod application_service;
pub mod auth_service;
pub mod company_service;
pub mod dispatch_service;
pub mod evaluation_service;
pub mod export_service;
pub mod history_service;
pub mod internship_service;
pub mod interview_service;
pub mod job_service;
pub mod listing;
pub mod notification_service;
pub mod review_service;
pub mod skill_service;
pub mod student_service;
pub mod task_service;
