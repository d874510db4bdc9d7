pub mod admin;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod dashboard;
pub mod evaluations;
pub mod extract;
pub mod health;
pub mod internships;
pub mod interviews;
pub mod jobs;
pub mod notifications;
pub mod reports;
pub mod reviews;
pub mod skills;
pub mod students;
pub mod tasks;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::{
    auth::require_auth,
    cors::cors_layer,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::models::admin::Role;
use crate::AppState;

pub(crate) const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

const MAX_BODY_BYTES: usize = 1024 * 1024;

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(auth::profile))
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/students/:id/status", put(students::update_student_status))
        .route("/students/:id/dashboard", get(students::student_dashboard))
        .route(
            "/students/:id/skills",
            get(students::list_student_skills).post(students::add_student_skill),
        )
        .route(
            "/students/:id/skills/:skill_id",
            put(students::update_student_skill).delete(students::remove_student_skill),
        )
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/companies/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route("/companies/:id/dashboard", get(companies::company_dashboard))
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/jobs/:id",
            get(jobs::get_job).put(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/jobs/:id/status", put(jobs::update_job_status))
        .route("/jobs/:id/summary", get(jobs::job_summary))
        .route(
            "/jobs/:id/skills",
            get(jobs::list_job_skills).post(jobs::add_job_skill),
        )
        .route(
            "/jobs/:id/skills/:skill_id",
            axum::routing::delete(jobs::remove_job_skill),
        )
        .route(
            "/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/applications/:id",
            get(applications::get_application)
                .put(applications::update_application)
                .delete(applications::delete_application),
        )
        .route(
            "/applications/:id/status",
            put(applications::update_application_status),
        )
        .route(
            "/applications/:id/history",
            get(applications::application_history),
        )
        .route(
            "/interviews",
            get(interviews::list_interviews).post(interviews::create_interview),
        )
        .route(
            "/interviews/:id",
            get(interviews::get_interview)
                .put(interviews::update_interview)
                .delete(interviews::delete_interview),
        )
        .route(
            "/interviews/:id/status",
            put(interviews::update_interview_status),
        )
        .route("/skills", get(skills::list_skills).post(skills::create_skill))
        .route(
            "/skills/:id",
            get(skills::get_skill)
                .put(skills::update_skill)
                .delete(skills::delete_skill),
        )
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/read-all",
            put(notifications::mark_all_notifications_read),
        )
        .route(
            "/notifications/:id",
            get(notifications::get_notification)
                .put(notifications::update_notification)
                .delete(notifications::delete_notification),
        )
        .route(
            "/notifications/:id/read",
            put(notifications::mark_notification_read),
        )
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/reviews/:id",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/internships",
            get(internships::list_internships).post(internships::create_internship),
        )
        .route(
            "/internships/:id",
            get(internships::get_internship)
                .put(internships::update_internship)
                .delete(internships::delete_internship),
        )
        .route("/internships/:id/assign", post(internships::assign_student))
        .route("/assignments", get(internships::list_assignments))
        .route(
            "/assignments/:id",
            get(internships::get_assignment).put(internships::update_assignment),
        )
        .route(
            "/assignments/:id/status",
            put(internships::update_assignment_status),
        )
        .route(
            "/evaluations",
            get(evaluations::list_evaluations).post(evaluations::create_evaluation),
        )
        .route(
            "/evaluations/:id",
            get(evaluations::get_evaluation)
                .put(evaluations::update_evaluation)
                .delete(evaluations::delete_evaluation),
        )
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/:id/status", put(tasks::update_task_status))
        .route("/dashboard/overview", get(dashboard::overview))
        .route("/dashboard/trends", get(dashboard::trends))
        .route("/dashboard/skills", get(dashboard::skills))
        .route("/dashboard/geography", get(dashboard::geography))
        .route(
            "/reports/applications.xlsx",
            get(reports::applications_report),
        )
        .route("/admin/reconcile", post(admin::reconcile))
}

/// Full application: `/health` plus everything under `/api`. Every `/api`
/// route except login and register requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(state.config.api_rps);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(
            protected_routes()
                .route_layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .layer(from_fn_with_state(limiter, rps_middleware));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_origins))
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(state.config.request_timeout)),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
