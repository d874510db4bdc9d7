use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::EntityKind;
use crate::error::Result;
use crate::models::status_change::StatusChange;

#[derive(Clone)]
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Oldest first.
    pub async fn for_entity(&self, entity: EntityKind, id: Uuid) -> Result<Vec<StatusChange>> {
        let rows = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT id, entity_type, entity_id, from_status, to_status, actor, note, changed_at
            FROM status_changes
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY changed_at, id
            "#,
        )
        .bind(entity.as_str())
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
