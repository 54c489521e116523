//! The `sync_progress` singleton row.
//!
//! Long pulls report progress through one well-known row (`id = 1`) and poll
//! the same row for a cancellation flag between batches. There is never more
//! than one full pull in flight, so a singleton is all the coordination the
//! job needs.

use sqlx::PgPool;

use crate::DbError;

/// One progress heartbeat written between batches.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub site: String,
    /// `running`, `completed`, `failed`, or `cancelled`.
    pub status: String,
    pub current: i64,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    pub message: Option<String>,
}

/// Write the current progress heartbeat.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn upsert_progress(pool: &PgPool, update: &ProgressUpdate) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sync_progress \
             (id, site, status, current, total, success, failed, message) \
         VALUES (1, $1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (id) DO UPDATE SET \
             site       = EXCLUDED.site, \
             status     = EXCLUDED.status, \
             current    = EXCLUDED.current, \
             total      = EXCLUDED.total, \
             success    = EXCLUDED.success, \
             failed     = EXCLUDED.failed, \
             message    = EXCLUDED.message, \
             updated_at = NOW()",
    )
    .bind(&update.site)
    .bind(&update.status)
    .bind(update.current)
    .bind(update.total)
    .bind(update.success)
    .bind(update.failed)
    .bind(&update.message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether an operator has asked the running pull to stop.
///
/// Absence of the row means no cancellation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn is_cancelled(pool: &PgPool) -> Result<bool, DbError> {
    let flag = sqlx::query_scalar::<_, bool>(
        "SELECT cancel_requested FROM sync_progress WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(flag.unwrap_or(false))
}

/// Raise the cancellation flag for the running pull.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn request_cancel(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sync_progress (id, site, status, cancel_requested) \
         VALUES (1, '', 'cancelled', TRUE) \
         ON CONFLICT (id) DO UPDATE SET \
             cancel_requested = TRUE, \
             updated_at       = NOW()",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Reset the row to idle and drop any pending cancellation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn clear_progress(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE sync_progress SET \
             status           = 'idle', \
             cancel_requested = FALSE, \
             message          = NULL, \
             updated_at       = NOW() \
         WHERE id = 1",
    )
    .execute(pool)
    .await?;

    Ok(())
}
