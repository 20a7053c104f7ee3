//! Transaction helpers shared by the Postgres repositories.

use std::future::Future;

use crate::error::AppError;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

/// Begin a transaction; finish it with [`commit_transaction`] or
/// [`rollback_transaction`].
pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

/// Undo everything written since [`begin_transaction`].
pub async fn rollback_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.rollback()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

/// Awaits `rollback` after a failed write and returns the write's error.
///
/// A failing rollback is logged; the caller still sees `cause`.
pub async fn rollback_after<F>(rollback: F, cause: AppError) -> AppError
where
    F: Future<Output = Result<(), AppError>>,
{
    if let Err(rollback_err) = rollback.await {
        tracing::error!(error = %rollback_err, cause = %cause, "Transaction rollback failed");
    }
    cause
}
