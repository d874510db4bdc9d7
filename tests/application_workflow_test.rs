mod common;

use std::time::Duration;

use common::{seed_company, seed_job, seed_student, setup, staff, test_config};
use placement_backend::{
    dto::application_dto::CreateApplicationPayload,
    engine::{EntityKind, Transition, TransitionError},
    error::Error,
    models::{application::ApplicationStatus as A, job::JobStatus, student::StudentStatus},
    AppState,
};
use uuid::Uuid;

fn apply(student_id: Uuid, job_id: Uuid) -> CreateApplicationPayload {
    CreateApplicationPayload {
        student_id,
        job_id,
        cover_letter: Some("I would like to join the backend team.".to_string()),
        resume_url: None,
    }
}

#[tokio::test]
async fn application_moves_through_the_pipeline_to_selection() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    let created = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .expect("submit");
    let id = created.record.id;
    assert_eq!(created.record.status, A::Pending);
    assert!(created.warnings.is_empty());
    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Applied);

    for to in [A::UnderReview, A::Shortlisted, A::Selected] {
        let out = state
            .engine
            .transition_application(Transition::new(id, to), &actor)
            .await
            .expect("transition");
        assert_eq!(out.record.status, to);

        let dup = state
            .engine
            .submit_application(apply(student, job), &actor)
            .await
            .unwrap_err();
        assert!(
            matches!(dup, TransitionError::Conflict(_)),
            "second application for the pair must conflict, got {:?}",
            dup
        );
    }

    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Selected);

    let err = state
        .engine
        .transition_application(Transition::new(id, A::Pending), &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    assert_eq!(Error::from(err).code(), "INVALID_TRANSITION");

    let history = state
        .history_service
        .for_entity(EntityKind::Application, id)
        .await
        .unwrap();
    let steps: Vec<(Option<String>, String)> = history
        .into_iter()
        .map(|h| (h.from_status, h.to_status))
        .collect();
    assert_eq!(
        steps,
        vec![
            (None, "Pending".to_string()),
            (Some("Pending".to_string()), "Under Review".to_string()),
            (Some("Under Review".to_string()), "Shortlisted".to_string()),
            (Some("Shortlisted".to_string()), "Selected".to_string()),
        ]
    );
}

#[tokio::test]
async fn duplicate_application_is_a_conflict() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap();
    let err = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::Conflict(_)));
}

#[tokio::test]
async fn applying_to_an_inactive_job_fails_its_precondition() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    state
        .engine
        .transition_job(Transition::new(job, JobStatus::Inactive), &actor)
        .await
        .unwrap();
    let err = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::PreconditionFailed(_)));

    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Available);
}

#[tokio::test]
async fn rejection_releases_an_idle_student() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    let app = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap();
    state
        .engine
        .transition_application(Transition::new(app.record.id, A::Rejected), &actor)
        .await
        .unwrap();

    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Available);
}

#[tokio::test]
async fn stale_expected_status_is_a_concurrent_modification() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    let app = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap();
    let id = app.record.id;

    let first = state
        .engine
        .transition_application(Transition::new(id, A::UnderReview).expecting(A::Pending), &actor);
    let second = state
        .engine
        .transition_application(Transition::new(id, A::Rejected).expecting(A::Pending), &actor);
    let (a, b) = tokio::join!(first, second);

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let loser = a.err().or(b.err()).unwrap();
    assert!(matches!(loser, TransitionError::ConcurrentModification { .. }));
    assert!(Error::from(loser).is_retriable());
}

#[tokio::test]
async fn student_with_an_open_application_cannot_be_deleted() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    let app = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap();

    let err = state.student_service.delete(student).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let err = state.job_service.delete(job).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    state
        .engine
        .transition_application(Transition::new(app.record.id, A::Rejected), &actor)
        .await
        .unwrap();
    state.student_service.delete(student).await.expect("delete");
    let err = state.student_service.get_by_id(student).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn withdrawing_releases_the_student_and_records_history() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    let app = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap();
    state
        .engine
        .withdraw_application(app.record.id, &actor)
        .await
        .expect("withdraw");

    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Available);
    let history = state
        .history_service
        .for_entity(EntityKind::Application, app.record.id)
        .await
        .unwrap();
    assert_eq!(history.last().map(|h| h.to_status.as_str()), Some("Withdrawn"));
}

/// Submits and walks one application to `to` along the staff pipeline.
async fn application_at(state: &AppState, student: Uuid, job: Uuid, to: A) -> Uuid {
    let actor = staff();
    let id = state
        .engine
        .submit_application(apply(student, job), &actor)
        .await
        .unwrap()
        .record
        .id;
    let path: &[A] = match to {
        A::Pending => &[],
        A::Rejected => &[A::Rejected],
        _ => &[A::UnderReview, A::Shortlisted, A::Selected],
    };
    for step in path {
        state
            .engine
            .transition_application(Transition::new(id, *step), &actor)
            .await
            .unwrap();
    }
    id
}

#[tokio::test]
async fn company_with_an_open_application_cannot_be_deactivated() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;
    application_at(&state, student, job, A::Shortlisted).await;

    let err = state.company_service.delete(company, &actor).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let company_row = state.company_service.get_by_id(company).await.unwrap();
    assert!(company_row.is_active);
    let job_row = state.job_service.get_by_id(job).await.unwrap();
    assert_eq!(job_row.status, JobStatus::Active);
}

#[tokio::test]
async fn deleting_a_job_settles_its_selected_student() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let selected = seed_student(&state).await;
    let rejected = seed_student(&state).await;
    application_at(&state, selected, job, A::Selected).await;
    application_at(&state, rejected, job, A::Rejected).await;

    let s = state.student_service.get_by_id(selected).await.unwrap();
    assert_eq!(s.status, StudentStatus::Selected);

    state.job_service.delete(job).await.expect("delete");

    let err = state.job_service.get_by_id(job).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let s = state.student_service.get_by_id(selected).await.unwrap();
    assert_eq!(s.status, StudentStatus::Available);
    let r = state.student_service.get_by_id(rejected).await.unwrap();
    assert_eq!(r.status, StudentStatus::Available);

    let repairs = state.engine.reconcile_students().await.unwrap();
    assert!(repairs
        .iter()
        .all(|r| r.student_id != selected && r.student_id != rejected));
}

#[tokio::test]
async fn deleting_a_job_keeps_other_applications_of_its_students() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let closing = seed_job(&state, company).await;
    let other = seed_job(&state, company).await;
    let student = seed_student(&state).await;
    application_at(&state, student, closing, A::Rejected).await;
    application_at(&state, student, other, A::Pending).await;

    state.job_service.delete(closing).await.expect("delete");

    let s = state.student_service.get_by_id(student).await.unwrap();
    assert_eq!(s.status, StudentStatus::Applied);
}

#[tokio::test]
async fn company_with_only_decided_applications_is_deactivated() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let selected = seed_student(&state).await;
    let rejected = seed_student(&state).await;
    application_at(&state, selected, job, A::Selected).await;
    application_at(&state, rejected, job, A::Rejected).await;

    let closed = state.company_service.delete(company, &actor).await.expect("delete");
    assert_eq!(closed, 1);

    let job_row = state.job_service.get_by_id(job).await.unwrap();
    assert_eq!(job_row.status, JobStatus::Closed);
    // the selection still backs the student, so nothing drifts
    let s = state.student_service.get_by_id(selected).await.unwrap();
    assert_eq!(s.status, StudentStatus::Selected);
    let r = state.student_service.get_by_id(rejected).await.unwrap();
    assert_eq!(r.status, StudentStatus::Available);
    let repairs = state.engine.reconcile_students().await.unwrap();
    assert!(repairs
        .iter()
        .all(|r| r.student_id != selected && r.student_id != rejected));
}

#[tokio::test]
async fn company_delete_waits_for_an_in_flight_submission() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;

    // the same locks a submission holds until it commits
    let mut tx = state.pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM jobs WHERE id = $1 FOR SHARE")
        .bind(job)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("INSERT INTO applications (student_id, job_id) VALUES ($1, $2)")
        .bind(student)
        .bind(job)
        .execute(&mut *tx)
        .await
        .unwrap();

    let companies = state.company_service.clone();
    let delete = tokio::spawn(async move { companies.delete(company, &staff()).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    let err = delete.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
    let company_row = state.company_service.get_by_id(company).await.unwrap();
    assert!(company_row.is_active);
}

#[tokio::test]
async fn replaying_an_applied_transition_is_refused() {
    let Some(state) = setup().await else { return };
    let actor = staff();
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;
    let id = application_at(&state, student, job, A::Pending).await;

    let step = || Transition::new(id, A::UnderReview).expecting(A::Pending);
    state
        .engine
        .transition_application(step(), &actor)
        .await
        .expect("first attempt");
    let err = state
        .engine
        .transition_application(step(), &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::ConcurrentModification { .. }));

    let history = state
        .history_service
        .for_entity(EntityKind::Application, id)
        .await
        .unwrap();
    let reviews = history
        .iter()
        .filter(|h| h.to_status == "Under Review")
        .count();
    assert_eq!(reviews, 1);
}

#[tokio::test]
async fn timed_out_transition_is_rolled_back() {
    let Some(state) = setup().await else { return };
    let company = seed_company(&state).await;
    let job = seed_job(&state, company).await;
    let student = seed_student(&state).await;
    let id = application_at(&state, student, job, A::Pending).await;

    let mut config = test_config(state.config.database_url.clone());
    config.transition_timeout = Duration::ZERO;
    let hurried = AppState::new(state.pool.clone(), config).unwrap();

    let err = hurried
        .engine
        .transition_application(Transition::new(id, A::UnderReview).expecting(A::Pending), &staff())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::Timeout(_)));
    assert!(Error::from(err).is_retriable());

    let app = state.application_service.get_by_id(id).await.unwrap();
    assert_eq!(app.status, A::Pending);
}
