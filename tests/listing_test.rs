mod common;

use common::{seed_company, seed_student, setup, student_payload, unique};
use placement_backend::{
    dto::{
        company_dto::CompanyListQuery,
        notification_dto::{CreateNotificationPayload, NotificationListQuery, ReadAllQuery},
        student_dto::{StudentListQuery, UpdateStudentPayload},
    },
    engine::Actor,
    error::Error,
};

#[tokio::test]
async fn filters_apply_to_items_and_total() {
    let Some(state) = setup().await else { return };
    let city = unique("City");
    for _ in 0..3 {
        state
            .student_service
            .create(student_payload(&city))
            .await
            .unwrap();
    }
    state
        .student_service
        .create(student_payload("Samarkand"))
        .await
        .unwrap();

    let page = state
        .student_service
        .list(StudentListQuery {
            city: Some(city.clone()),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.pages, 2);
    assert!(page.items.iter().all(|s| s.city.as_deref() == Some(city.as_str())));

    let last = state
        .student_service
        .list(StudentListQuery {
            city: Some(city),
            limit: Some(2),
            page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.pagination.total, 3);
}

#[tokio::test]
async fn update_changes_only_patched_fields() {
    let Some(state) = setup().await else { return };
    let input = student_payload("Bukhara");
    let id = state.student_service.create(input.clone()).await.unwrap();

    let created = state.student_service.get_by_id(id).await.unwrap();
    assert_eq!(created.email, input.email);
    assert_eq!(created.city.as_deref(), Some("Bukhara"));

    state
        .student_service
        .update(
            id,
            UpdateStudentPayload {
                city: Some("Khiva".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let updated = state.student_service.get_by_id(id).await.unwrap();
    assert_eq!(updated.city.as_deref(), Some("Khiva"));
    assert_eq!(updated.first_name, created.first_name);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.age, created.age);
}

#[tokio::test]
async fn duplicate_student_email_is_a_conflict() {
    let Some(state) = setup().await else { return };
    let input = student_payload("Tashkent");
    state.student_service.create(input.clone()).await.unwrap();
    let err = state.student_service.create(input).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn deactivated_company_drops_out_of_the_default_list() {
    let Some(state) = setup().await else { return };
    let id = seed_company(&state).await;
    let name = state.company_service.get_by_id(id).await.unwrap().name;

    let search = |active: Option<bool>| CompanyListQuery {
        search: Some(name.clone()),
        is_active: active,
        ..Default::default()
    };
    let page = state.company_service.list(search(None)).await.unwrap();
    assert_eq!(page.pagination.total, 1);

    state.company_service.delete(id, &Actor::System).await.unwrap();
    let page = state.company_service.list(search(None)).await.unwrap();
    assert_eq!(page.pagination.total, 0);
    let page = state.company_service.list(search(Some(false))).await.unwrap();
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn notifications_are_marked_read_singly_and_in_bulk() {
    let Some(state) = setup().await else { return };
    let student = seed_student(&state).await;
    let mut ids = Vec::new();
    for title in ["Interview scheduled", "Application received", "Offer"] {
        let id = state
            .notification_service
            .create(CreateNotificationPayload {
                student_id: Some(student),
                admin_id: None,
                title: title.to_string(),
                message: "See your dashboard for details.".to_string(),
                notification_type: None,
            })
            .await
            .unwrap();
        ids.push(id);
    }

    state.notification_service.mark_read(ids[0]).await.unwrap();
    let first = state.notification_service.get_by_id(ids[0]).await.unwrap();
    assert!(first.is_read);
    let stamped = first.read_at;
    assert!(stamped.is_some());
    // marking again keeps the first read time
    state.notification_service.mark_read(ids[0]).await.unwrap();
    let again = state.notification_service.get_by_id(ids[0]).await.unwrap();
    assert_eq!(again.read_at, stamped);

    let marked = state
        .notification_service
        .mark_all_read(ReadAllQuery {
            student_id: Some(student),
            admin_id: None,
        })
        .await
        .unwrap();
    assert_eq!(marked, 2);

    let unread = state
        .notification_service
        .list(NotificationListQuery {
            student_id: Some(student),
            is_read: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unread.pagination.total, 0);

    let err = state
        .notification_service
        .mark_read(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = state
        .notification_service
        .mark_all_read(ReadAllQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}
