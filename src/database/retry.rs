use std::future::Future;

use crate::error::{Error, Result};

/// Failures worth one more attempt on an idempotent read.
pub fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
}

/// Runs a read, retrying once on pool exhaustion or I/O failure. A second
/// failure surfaces through the normal mapping (`Dependency`).
pub async fn read<T, F, Fut>(op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(err) if is_transient(&err) => {
            tracing::warn!(error = %err, "transient storage error, retrying once");
            op().await.map_err(Error::from)
        }
        Err(err) => Err(Error::from(err)),
    }
}

/// Writes only retry when the connection was never acquired.
pub async fn write<T, F, Fut>(op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(sqlx::Error::PoolTimedOut) => {
            tracing::warn!("pool timed out on write, retrying once");
            op().await.map_err(Error::from)
        }
        Err(err) => Err(Error::from(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn transient_read_is_retried_once() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let out = read(|| async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_failure_is_dependency_error() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let err = read(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(sqlx::Error::PoolTimedOut)
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let err = read(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(sqlx::Error::RowNotFound)
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn writes_retry_only_on_pool_timeout() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let err = tokio_test::block_on(write(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "reset")))
        }))
        .unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
