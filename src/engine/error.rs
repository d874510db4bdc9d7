use std::time::Duration;

use uuid::Uuid;

use crate::engine::status::EntityKind;
use crate::error::Error;
use crate::models::UnknownVariant;

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: EntityKind,
        from: String,
        to: String,
    },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{entity} {id} was modified concurrently ({detail})")]
    ConcurrentModification {
        entity: EntityKind,
        id: Uuid,
        detail: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("{0}")]
    Conflict(String),

    #[error("transition did not finish within {0:?}; it may still have been applied")]
    Timeout(Duration),

    #[error("stored status is not recognised: {0}")]
    CorruptState(#[from] UnknownVariant),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<TransitionError> for Error {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { .. } => Error::InvalidTransition(err.to_string()),
            TransitionError::PreconditionFailed(msg) => Error::PreconditionFailed(msg),
            TransitionError::ConcurrentModification { .. } => {
                Error::ConcurrentModification(err.to_string())
            }
            TransitionError::NotFound { .. } => Error::NotFound(err.to_string()),
            TransitionError::Conflict(msg) => Error::Conflict(msg),
            TransitionError::Timeout(_) => Error::Timeout(err.to_string()),
            TransitionError::CorruptState(inner) => Error::Internal(inner.to_string()),
            TransitionError::Storage(inner) => Error::from(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_http_taxonomy() {
        let id = Uuid::new_v4();
        let err: Error = TransitionError::InvalidTransition {
            entity: EntityKind::Application,
            from: "Selected".into(),
            to: "Pending".into(),
        }
        .into();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(err.to_string(), "Invalid transition: application cannot move from Selected to Pending");

        let err: Error = TransitionError::ConcurrentModification {
            entity: EntityKind::Job,
            id,
            detail: "status is now Closed".into(),
        }
        .into();
        assert!(err.is_retriable());

        let err: Error = TransitionError::NotFound { entity: EntityKind::Task, id }.into();
        assert_eq!(err.code(), "NOT_FOUND");

        let err: Error = TransitionError::Timeout(Duration::from_secs(1)).into();
        assert_eq!(err.code(), "TIMEOUT");
        assert!(err.is_retriable());
        assert!(err.to_string().contains("may still have been applied"));
    }

    #[test]
    fn storage_errors_reuse_database_mapping() {
        let err: Error = TransitionError::Storage(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
    }
}
