use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    dto::application_dto::ApplicationListQuery,
    error::Result,
    routes::extract::AppQuery,
    services::export_service::ExportService,
    utils::time::now,
    AppState,
};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Same filters as the application list, without pagination.
#[axum::debug_handler]
pub async fn applications_report(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applications = state.application_service.list_all(&query).await?;
    let buffer = ExportService::applications_xlsx(&applications)?;
    let disposition = format!(
        "attachment; filename=\"applications_{}.xlsx\"",
        now().format("%Y%m%d")
    );
    tracing::info!(rows = applications.len(), "applications report exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
