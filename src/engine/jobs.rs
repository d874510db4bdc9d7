use sqlx::PgConnection;
use uuid::Uuid;

use crate::engine::{
    check_transition, ensure_edge, fetch_record, lock_status, record_change, write_status, Actor,
    EntityKind, Lifecycle, Outcome, Transition, TransitionEngine, TransitionError,
};
use crate::models::job::{Job, JobStatus};
use crate::services::job_service::JOB_SELECT;

/// Closes every open job of a company inside the caller's transaction.
pub(crate) async fn close_company_jobs(
    conn: &mut PgConnection,
    company_id: Uuid,
    actor: &Actor,
) -> Result<usize, TransitionError> {
    let rows: Vec<(Uuid, String, i32)> = sqlx::query_as(
        "SELECT id, status, version FROM jobs WHERE company_id = $1 AND status <> 'Closed' ORDER BY id FOR UPDATE",
    )
    .bind(company_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut closed = 0;
    for (id, raw, version) in rows {
        let current: JobStatus = raw.parse()?;
        check_transition(id, current, current, JobStatus::Closed, actor)?;
        write_status(conn, id, JobStatus::Closed, version).await?;
        record_change(
            conn,
            EntityKind::Job,
            id,
            Some(current.label()),
            JobStatus::Closed.label(),
            actor,
            Some("company deactivated"),
        )
        .await?;
        closed += 1;
    }
    Ok(closed)
}

impl TransitionEngine {
    pub async fn transition_job(
        &self,
        transition: Transition<JobStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Job>, TransitionError> {
        let from = self.resolve_from(transition.id, transition.from).await?;
        ensure_edge(from, transition.to, actor)?;
        let record = self
            .bounded(self.transition_job_unit(&transition, from, actor))
            .await?;
        tracing::info!(
            entity = "job",
            id = %record.id,
            from = %from,
            to = %record.status,
            actor = %actor,
            "status changed"
        );
        Ok(Outcome {
            record,
            warnings: Vec::new(),
        })
    }

    async fn transition_job_unit(
        &self,
        transition: &Transition<JobStatus>,
        from: JobStatus,
        actor: &Actor,
    ) -> Result<Job, TransitionError> {
        let id = transition.id;
        let to = transition.to;
        let mut tx = self.pool.begin().await?;

        let (current, version) = lock_status::<JobStatus>(&mut tx, id).await?;
        check_transition(id, current, from, to, actor)?;

        if to == JobStatus::Active {
            let (company_active, expired): (bool, bool) = sqlx::query_as(
                "SELECT c.is_active, j.deadline < CURRENT_DATE FROM jobs j \
                 JOIN companies c ON c.id = j.company_id WHERE j.id = $1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if !company_active {
                return Err(TransitionError::PreconditionFailed(
                    "Company is inactive and cannot reopen jobs".to_string(),
                ));
            }
            if expired {
                return Err(TransitionError::PreconditionFailed(
                    "Job deadline has passed; extend it before reactivating".to_string(),
                ));
            }
        }

        write_status(&mut tx, id, to, version).await?;
        record_change(
            &mut tx,
            EntityKind::Job,
            id,
            Some(from.label()),
            to.label(),
            actor,
            transition.note.as_deref(),
        )
        .await?;

        let record: Job = fetch_record(&mut tx, JOB_SELECT, "j.id", id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Closes Active and Inactive jobs whose deadline has passed.
    pub async fn close_expired_jobs(&self) -> Result<usize, TransitionError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM jobs WHERE status <> 'Closed' AND deadline < CURRENT_DATE ORDER BY deadline, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut closed = 0;
        for id in ids {
            match self.bounded(self.expire_job(id)).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "failed to close expired job");
                }
            }
        }
        if closed > 0 {
            tracing::info!(closed, "expired jobs closed");
        }
        Ok(closed)
    }

    async fn expire_job(&self, id: Uuid) -> Result<bool, TransitionError> {
        let mut tx = self.pool.begin().await?;
        let (current, version) = lock_status::<JobStatus>(&mut tx, id).await?;
        if !current.can_transition(JobStatus::Closed, &Actor::System) {
            return Ok(false);
        }
        write_status(&mut tx, id, JobStatus::Closed, version).await?;
        record_change(
            &mut tx,
            EntityKind::Job,
            id,
            Some(current.label()),
            JobStatus::Closed.label(),
            &Actor::System,
            Some("deadline passed"),
        )
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}
