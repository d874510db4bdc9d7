use reqwest::Client;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::notification::NotificationType;

/// One message to a student or admin: stored as a notification row and,
/// when a relay is configured and an address is known, emailed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub student_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub email: Option<String>,
    pub recipient_name: Option<String>,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
}

#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    pool: PgPool,
    client: Client,
    relay_url: Option<String>,
    from: String,
}

impl Dispatcher {
    pub fn new(pool: PgPool, client: Client, relay_url: Option<String>, from: String) -> Self {
        Self {
            pool,
            client,
            relay_url,
            from,
        }
    }

    /// Best effort. Failures come back as human-readable warnings.
    pub async fn dispatch(&self, notice: &Notice) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = self.store(notice).await {
            tracing::warn!(error = %e, title = %notice.title, "failed to store notification");
            warnings.push(format!("Notification could not be saved: {}", notice.title));
        }

        if let (Some(url), Some(to)) = (self.relay_url.as_deref(), notice.email.as_deref()) {
            if let Err(e) = self.send_mail(url, to, notice).await {
                tracing::warn!(error = %e, to = %to, "failed to send email");
                warnings.push(format!("Email could not be sent to {}", to));
            }
        }

        warnings
    }

    async fn store(&self, notice: &Notice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (student_id, admin_id, title, message, notification_type)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notice.student_id)
        .bind(notice.admin_id)
        .bind(&notice.title)
        .bind(&notice.message)
        .bind(notice.kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn send_mail(&self, url: &str, to: &str, notice: &Notice) -> Result<()> {
        let body = match &notice.recipient_name {
            Some(name) => format!("Dear {},\n\n{}", name, notice.message),
            None => notice.message.clone(),
        };
        let mail = MailMessage {
            from: &self.from,
            to,
            subject: &notice.title,
            body,
        };
        self.client
            .post(url)
            .json(&mail)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::Dependency(format!("Mail relay: {}", e)))?;
        Ok(())
    }
}
