use std::{future::Future, time::Duration};

use sea_orm::DbErr;

const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF_MS: u64 = 50;
const MAX_BACKOFF_MS: u64 = 1_000;

/// Errors that may carry store lock contention worth retrying.
pub trait Contended {
    fn is_contention(&self) -> bool;
}

impl Contended for DbErr {
    fn is_contention(&self) -> bool {
        is_busy_message(&self.to_string())
    }
}

/// Runs `op` again while it fails with contention, up to `MAX_RETRIES` times.
/// `op` must be a complete transaction so a retry never observes partial work.
pub async fn retry_on_contention<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    E: Contended + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_contention() && attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::debug!(attempt, error = %err, "Store contention, retrying");
                tokio::time::sleep(backoff).await;
                let next_ms = u64::try_from(backoff.as_millis())
                    .unwrap_or(MAX_BACKOFF_MS)
                    .saturating_mul(2)
                    .min(MAX_BACKOFF_MS);
                backoff = Duration::from_millis(next_ms);
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_busy_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    // SQLite lock errors, then PostgreSQL serialization failures and deadlocks.
    message.contains("database is locked")
        || message.contains("database is busy")
        || message.contains("database table is locked")
        || message.contains("could not serialize access")
        || message.contains("deadlock detected")
}
