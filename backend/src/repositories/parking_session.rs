//! Session store: parking session rows and the payment transaction.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{parking_record::ParkingRecord, parking_session::ParkingSession, PageRequest};
use crate::repositories::transaction::{
    begin_transaction, commit_transaction, rollback_after, rollback_transaction,
};
use crate::types::{ParkingSessionId, UserId};

const SESSION_COLUMNS: &str = "id, user_id, vehicle_id, parking_lot_id, spot_code, spot_type, \
     start_time, end_time, status, fee_rate, extra_hour_rate, fee_current, next_billing_time, \
     next_fee_amount, current_billing_cycle, pricing_rule, navigation_status, \
     remaining_distance_m, estimated_minutes, total_distance_m, destination_lat, \
     destination_lon, user_position_lat, user_position_lon, progress_to_destination_percent, \
     version, created_at, updated_at";

pub const VERSION_CONFLICT_MESSAGE: &str = "Parking session was modified concurrently";

/// Storage operations the session lifecycle needs.
///
/// `update` and `end_with_record` are optimistic: they only apply when the
/// stored `version` still equals `session.version`, and return the written
/// row with its bumped version. A lost race is reported as
/// [`AppError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParkingSessionRepositoryTrait: Send + Sync {
    async fn find_active_by_user(&self, user_id: UserId)
        -> Result<Option<ParkingSession>, AppError>;

    async fn find_by_id_and_user(
        &self,
        id: ParkingSessionId,
        user_id: UserId,
    ) -> Result<Option<ParkingSession>, AppError>;

    /// Ended sessions, newest start first.
    async fn list_ended_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<ParkingSession>, AppError>;

    async fn count_ended_by_user(&self, user_id: UserId) -> Result<i64, AppError>;

    /// Inserts a new session; a second active session for the same user is a
    /// conflict.
    async fn create(&self, session: &ParkingSession) -> Result<ParkingSession, AppError>;

    async fn update(&self, session: &ParkingSession) -> Result<ParkingSession, AppError>;

    /// Persists the ended session and its receipt atomically.
    async fn end_with_record(
        &self,
        session: &ParkingSession,
        record: &ParkingRecord,
    ) -> Result<ParkingSession, AppError>;
}

#[derive(Clone)]
pub struct ParkingSessionRepository {
    pool: PgPool,
}

impl ParkingSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn update_sql() -> String {
    format!(
        "UPDATE parking_sessions SET \
            end_time = $3, status = $4, fee_current = $5, next_billing_time = $6, \
            next_fee_amount = $7, current_billing_cycle = $8, navigation_status = $9, \
            remaining_distance_m = $10, estimated_minutes = $11, user_position_lat = $12, \
            user_position_lon = $13, progress_to_destination_percent = $14, \
            version = version + 1, updated_at = NOW() \
         WHERE id = $1 AND version = $2 \
         RETURNING {SESSION_COLUMNS}"
    )
}

async fn apply_update<'e, E>(executor: E, session: &ParkingSession) -> Result<ParkingSession, AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let sql = update_sql();
    sqlx::query_as::<_, ParkingSession>(&sql)
        .bind(session.id)
        .bind(session.version)
        .bind(session.end_time)
        .bind(session.status)
        .bind(session.fee_current)
        .bind(session.next_billing_time)
        .bind(session.next_fee_amount)
        .bind(session.current_billing_cycle)
        .bind(session.navigation_status)
        .bind(session.remaining_distance_m)
        .bind(session.estimated_minutes)
        .bind(session.user_position_lat)
        .bind(session.user_position_lon)
        .bind(session.progress_to_destination_percent)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::Conflict(VERSION_CONFLICT_MESSAGE.into()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl ParkingSessionRepositoryTrait for ParkingSessionRepository {
    async fn find_active_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ParkingSession>, AppError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM parking_sessions \
             WHERE user_id = $1 AND status = 'active' \
             ORDER BY start_time DESC LIMIT 1"
        );
        let session = sqlx::query_as::<_, ParkingSession>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_by_id_and_user(
        &self,
        id: ParkingSessionId,
        user_id: UserId,
    ) -> Result<Option<ParkingSession>, AppError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM parking_sessions WHERE id = $1 AND user_id = $2"
        );
        let session = sqlx::query_as::<_, ParkingSession>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn list_ended_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<ParkingSession>, AppError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM parking_sessions \
             WHERE user_id = $1 AND status = 'ended' \
             ORDER BY start_time DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let sessions = sqlx::query_as::<_, ParkingSession>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    async fn count_ended_by_user(&self, user_id: UserId) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM parking_sessions WHERE user_id = $1 AND status = 'ended'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn create(&self, session: &ParkingSession) -> Result<ParkingSession, AppError> {
        let sql = format!(
            "INSERT INTO parking_sessions ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28) \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSession>(&sql)
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.vehicle_id)
            .bind(session.parking_lot_id)
            .bind(&session.spot_code)
            .bind(session.spot_type)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.status)
            .bind(session.fee_rate)
            .bind(session.extra_hour_rate)
            .bind(session.fee_current)
            .bind(session.next_billing_time)
            .bind(session.next_fee_amount)
            .bind(session.current_billing_cycle)
            .bind(&session.pricing_rule)
            .bind(session.navigation_status)
            .bind(session.remaining_distance_m)
            .bind(session.estimated_minutes)
            .bind(session.total_distance_m)
            .bind(session.destination_lat)
            .bind(session.destination_lon)
            .bind(session.user_position_lat)
            .bind(session.user_position_lon)
            .bind(session.progress_to_destination_percent)
            .bind(session.version)
            .bind(session.created_at)
            .bind(session.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AppError::Conflict("User already has an active parking session".into())
                } else {
                    AppError::from(err)
                }
            })
    }

    async fn update(&self, session: &ParkingSession) -> Result<ParkingSession, AppError> {
        apply_update(&self.pool, session).await
    }

    async fn end_with_record(
        &self,
        session: &ParkingSession,
        record: &ParkingRecord,
    ) -> Result<ParkingSession, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let ended = match apply_update(&mut *tx, session).await {
            Ok(ended) => ended,
            Err(err) => return Err(rollback_after(rollback_transaction(tx), err).await),
        };

        let inserted = sqlx::query(
            "INSERT INTO parking_records \
                (id, session_id, user_id, vehicle_id, parking_lot_id, spot_code, spot_type, \
                 start_time, end_time, fee, duration_hours, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.id)
        .bind(record.session_id)
        .bind(record.user_id)
        .bind(record.vehicle_id)
        .bind(record.parking_lot_id)
        .bind(&record.spot_code)
        .bind(record.spot_type)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.fee)
        .bind(record.duration_hours)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            tracing::error!(session_id = %session.id, error = %err, "Failed to write parking record");
            let cause = AppError::InternalServerError(err.into());
            return Err(rollback_after(rollback_transaction(tx), cause).await);
        }

        commit_transaction(tx).await?;
        Ok(ended)
    }
}
