#![allow(dead_code)]

use std::env;
use std::time::Duration;

use chrono::Duration as Days;
use placement_backend::{
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    dto::{
        company_dto::CreateCompanyPayload, internship_dto::CreateInternshipPayload,
        job_dto::CreateJobPayload, student_dto::CreateStudentPayload,
    },
    engine::Actor,
    models::{admin::Role, job::JobType},
    utils::time::today,
    AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config(database_url: String) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 1,
        api_rps: 10_000,
        cors_origins: Vec::new(),
        mail_relay_url: None,
        mail_from: "tests@placement.local".to_string(),
        db_max_connections: 10,
        db_acquire_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(30),
        transition_timeout: Duration::from_secs(10),
        job_sweep_cron: "0 0 * * * *".to_string(),
        log_format: LogFormat::Text,
    }
}

/// `None` when no database is configured; callers return early.
pub async fn setup() -> Option<AppState> {
    dotenvy::dotenv().ok();
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let config = test_config(url);
    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    Some(AppState::new(pool, config).expect("state"))
}

pub fn staff() -> Actor {
    Actor::Staff {
        id: Uuid::new_v4(),
        username: "placement-officer".to_string(),
        role: Role::Admin,
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

pub fn student_payload(city: &str) -> CreateStudentPayload {
    CreateStudentPayload {
        first_name: "Dilnoza".to_string(),
        last_name: "Karimova".to_string(),
        email: format!("{}@example.com", unique("student")),
        phone: None,
        city: Some(city.to_string()),
        age: Some(21),
        education: Some("BSc Computer Science".to_string()),
    }
}

pub async fn seed_student(state: &AppState) -> Uuid {
    state
        .student_service
        .create(student_payload("Tashkent"))
        .await
        .expect("student")
}

pub async fn seed_company(state: &AppState) -> Uuid {
    state
        .company_service
        .create(CreateCompanyPayload {
            name: unique("Acme"),
            industry: Some("Software".to_string()),
            city: Some("Tashkent".to_string()),
            address: None,
            website: None,
            contact_person: None,
            contact_email: None,
            contact_phone: None,
            description: None,
        })
        .await
        .expect("company")
}

pub async fn seed_job(state: &AppState, company_id: Uuid) -> Uuid {
    state
        .job_service
        .create(CreateJobPayload {
            company_id,
            title: "Backend Intern".to_string(),
            description: None,
            requirements: None,
            salary: None,
            job_type: JobType::Internship,
            location: Some("Tashkent".to_string()),
            positions: Some(2),
            posted_date: None,
            deadline: today() + Days::days(30),
        })
        .await
        .expect("job")
}

pub async fn seed_internship(state: &AppState, company_id: Uuid, slots: i32) -> Uuid {
    state
        .internship_service
        .create(CreateInternshipPayload {
            company_id,
            title: "Summer Internship".to_string(),
            description: None,
            start_date: today() + Days::days(7),
            end_date: today() + Days::days(97),
            stipend: None,
            slots: Some(slots),
        })
        .await
        .expect("internship")
}
