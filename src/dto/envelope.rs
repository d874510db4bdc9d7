use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::services::listing::{Page, Pagination};

/// `{success, data?, pagination?, message?, warnings?}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Created {
    pub id: Uuid,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: None,
            message: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    pub fn page(page: Page<T>) -> Self {
        Self {
            success: true,
            data: Some(page.items),
            pagination: Some(page.pagination),
            message: None,
            warnings: Vec::new(),
        }
    }
}

impl Envelope<Created> {
    pub fn created(id: Uuid) -> Self {
        Self::data(Created { id })
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            pagination: None,
            message: Some(message.into()),
            warnings: Vec::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::listing::PageRequest;
    use serde_json::json;

    #[test]
    fn page_envelope_carries_pagination() {
        let page = Page {
            items: vec![1, 2],
            pagination: Pagination::new(PageRequest::new(Some(2), Some(2)), 5),
        };
        let value = serde_json::to_value(Envelope::page(page)).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "data": [1, 2],
                "pagination": {"page": 2, "limit": 2, "total": 5, "pages": 3}
            })
        );
    }

    #[test]
    fn message_envelope_omits_data() {
        let value = serde_json::to_value(Envelope::message("Student updated")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "Student updated"}));
    }

    #[test]
    fn warnings_are_listed_when_present() {
        let id = Uuid::nil();
        let value = serde_json::to_value(
            Envelope::created(id).with_warnings(vec!["Email could not be sent to a@b.io".into()]),
        )
        .unwrap();
        assert_eq!(value["data"]["id"], json!(id));
        assert_eq!(value["warnings"][0], "Email could not be sent to a@b.io");
    }
}
