//! Vehicles and parking lots: the records sessions point at.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{parking_lot::ParkingLot, vehicle::Vehicle};
use crate::repositories::transaction::{
    begin_transaction, commit_transaction, rollback_after, rollback_transaction,
};
use crate::types::{ParkingLotId, UserId, VehicleId};

const VEHICLE_COLUMNS: &str =
    "id, user_id, plate_number, brand, model, color, is_default, is_active, created_at";

const PARKING_LOT_COLUMNS: &str = "id, name, address, latitude, longitude, floor, area, \
     first_hour_fee, extra_hour_rate, is_active, created_at";

pub const DUPLICATE_PLATE_MESSAGE: &str = "Plate number is already registered";

/// Vehicle and parking lot storage.
///
/// `find_vehicle` also returns removed vehicles so that past sessions keep
/// their plate; callers that need a usable vehicle check `is_active`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParkingDirectoryTrait: Send + Sync {
    async fn find_vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, AppError>;

    async fn find_parking_lot(&self, id: ParkingLotId) -> Result<Option<ParkingLot>, AppError>;

    /// Registered vehicles of `user_id`, default first, then newest.
    async fn list_vehicles(&self, user_id: UserId) -> Result<Vec<Vehicle>, AppError>;

    /// Registers a vehicle. The user's first registered vehicle becomes the
    /// default; a plate registered by anyone is a conflict.
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError>;

    /// Makes `id` the user's only default. `false` when the user has no such
    /// registered vehicle.
    async fn set_default_vehicle(&self, user_id: UserId, id: VehicleId) -> Result<bool, AppError>;

    /// Unregisters a vehicle, handing the default over to the newest remaining
    /// one. `false` when the user has no such registered vehicle.
    async fn remove_vehicle(&self, user_id: UserId, id: VehicleId) -> Result<bool, AppError>;

    async fn create_parking_lot(&self, lot: &ParkingLot) -> Result<ParkingLot, AppError>;
}

#[derive(Clone)]
pub struct ParkingDirectory {
    pool: PgPool,
}

impl ParkingDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate_plate(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(DUPLICATE_PLATE_MESSAGE.into())
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl ParkingDirectoryTrait for ParkingDirectory {
    async fn find_vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, AppError> {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn find_parking_lot(&self, id: ParkingLotId) -> Result<Option<ParkingLot>, AppError> {
        let sql = format!("SELECT {PARKING_LOT_COLUMNS} FROM parking_lots WHERE id = $1");
        let lot = sqlx::query_as::<_, ParkingLot>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lot)
    }

    async fn list_vehicles(&self, user_id: UserId) -> Result<Vec<Vehicle>, AppError> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles \
             WHERE user_id = $1 AND is_active \
             ORDER BY is_default DESC, created_at DESC, id DESC"
        );
        let vehicles = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(vehicles)
    }

    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let sql = format!(
            "INSERT INTO vehicles ({VEHICLE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                     NOT EXISTS (SELECT 1 FROM vehicles WHERE user_id = $2 AND is_active), \
                     TRUE, $7) \
             RETURNING {VEHICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(vehicle.id)
            .bind(vehicle.user_id)
            .bind(&vehicle.plate_number)
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(&vehicle.color)
            .bind(vehicle.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(duplicate_plate)
    }

    async fn set_default_vehicle(&self, user_id: UserId, id: VehicleId) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE vehicles SET is_default = (id = $2) \
             WHERE user_id = $1 AND is_active \
               AND EXISTS (SELECT 1 FROM vehicles WHERE id = $2 AND user_id = $1 AND is_active)",
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_vehicle(&self, user_id: UserId, id: VehicleId) -> Result<bool, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let removed = sqlx::query_scalar::<_, bool>(
            "WITH target AS ( \
                 SELECT id, is_default FROM vehicles \
                 WHERE id = $1 AND user_id = $2 AND is_active FOR UPDATE) \
             UPDATE vehicles v SET is_active = FALSE, is_default = FALSE \
             FROM target WHERE v.id = target.id \
             RETURNING target.is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await;

        let was_default = match removed {
            Ok(Some(was_default)) => was_default,
            Ok(None) => {
                rollback_transaction(tx).await?;
                return Ok(false);
            }
            Err(err) => return Err(rollback_after(rollback_transaction(tx), err.into()).await),
        };

        if was_default {
            let promoted = sqlx::query(
                "UPDATE vehicles SET is_default = TRUE \
                 WHERE id = (SELECT id FROM vehicles WHERE user_id = $1 AND is_active \
                             ORDER BY created_at DESC, id DESC LIMIT 1)",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await;
            if let Err(err) = promoted {
                return Err(rollback_after(rollback_transaction(tx), err.into()).await);
            }
        }

        commit_transaction(tx).await?;
        Ok(true)
    }

    async fn create_parking_lot(&self, lot: &ParkingLot) -> Result<ParkingLot, AppError> {
        let sql = format!(
            "INSERT INTO parking_lots ({PARKING_LOT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PARKING_LOT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, ParkingLot>(&sql)
            .bind(lot.id)
            .bind(&lot.name)
            .bind(&lot.address)
            .bind(lot.latitude)
            .bind(lot.longitude)
            .bind(&lot.floor)
            .bind(&lot.area)
            .bind(lot.first_hour_fee)
            .bind(lot.extra_hour_rate)
            .bind(lot.is_active)
            .bind(lot.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }
}
