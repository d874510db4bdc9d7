#[macro_use]
mod macros;

pub mod config;
pub mod database;
pub mod dto;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::engine::TransitionEngine;
use crate::error::{Error, Result};
use crate::services::{
    analytics_service::AnalyticsService, application_service::ApplicationService,
    auth_service::AuthService, company_service::CompanyService, dispatch_service::Dispatcher,
    evaluation_service::EvaluationService, history_service::HistoryService,
    internship_service::InternshipService, interview_service::InterviewService,
    job_service::JobService, notification_service::NotificationService,
    review_service::ReviewService, skill_service::SkillService, student_service::StudentService,
    task_service::TaskService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub student_service: StudentService,
    pub company_service: CompanyService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
    pub skill_service: SkillService,
    pub notification_service: NotificationService,
    pub review_service: ReviewService,
    pub internship_service: InternshipService,
    pub evaluation_service: EvaluationService,
    pub task_service: TaskService,
    pub history_service: HistoryService,
    pub analytics_service: AnalyticsService,
    pub auth_service: AuthService,
    pub engine: TransitionEngine,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let dispatcher = Dispatcher::new(
            pool.clone(),
            http_client,
            config.mail_relay_url.clone(),
            config.mail_from.clone(),
        );
        let engine = TransitionEngine::new(pool.clone(), dispatcher, config.transition_timeout);
        let auth_service = AuthService::new(
            pool.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiry_hours,
        );

        Ok(Self {
            student_service: StudentService::new(pool.clone()),
            company_service: CompanyService::new(pool.clone()),
            job_service: JobService::new(pool.clone()),
            application_service: ApplicationService::new(pool.clone()),
            interview_service: InterviewService::new(pool.clone()),
            skill_service: SkillService::new(pool.clone()),
            notification_service: NotificationService::new(pool.clone()),
            review_service: ReviewService::new(pool.clone()),
            internship_service: InternshipService::new(pool.clone()),
            evaluation_service: EvaluationService::new(pool.clone()),
            task_service: TaskService::new(pool.clone()),
            history_service: HistoryService::new(pool.clone()),
            analytics_service: AnalyticsService::new(pool.clone()),
            auth_service,
            engine,
            config: Arc::new(config),
            pool,
        })
    }
}
