//! Driver vehicles and public parking lot details.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{
    parking_lot::ParkingLot,
    vehicle::{CreateVehicleRequest, Vehicle},
};
use crate::repositories::{ParkingDirectoryTrait, ParkingSessionRepositoryTrait};
use crate::types::{ParkingLotId, UserId, VehicleId};

const VEHICLE_NOT_FOUND: &str = "Vehicle not found";

#[derive(Clone)]
pub struct DirectoryService {
    directory: Arc<dyn ParkingDirectoryTrait>,
    sessions: Arc<dyn ParkingSessionRepositoryTrait>,
}

impl DirectoryService {
    pub fn new(
        directory: Arc<dyn ParkingDirectoryTrait>,
        sessions: Arc<dyn ParkingSessionRepositoryTrait>,
    ) -> Self {
        Self {
            directory,
            sessions,
        }
    }

    pub async fn list_vehicles(&self, user_id: UserId) -> Result<Vec<Vehicle>, AppError> {
        self.directory.list_vehicles(user_id).await
    }

    pub async fn register_vehicle(
        &self,
        user_id: UserId,
        request: CreateVehicleRequest,
        now: DateTime<Utc>,
    ) -> Result<Vehicle, AppError> {
        let vehicle = request.into_vehicle(user_id, now);
        let created = self.directory.create_vehicle(&vehicle).await?;
        tracing::info!(
            vehicle_id = %created.id,
            user_id = %user_id,
            is_default = created.is_default,
            "Vehicle registered"
        );
        Ok(created)
    }

    pub async fn set_default_vehicle(
        &self,
        user_id: UserId,
        vehicle_id: VehicleId,
    ) -> Result<(), AppError> {
        if !self.directory.set_default_vehicle(user_id, vehicle_id).await? {
            return Err(AppError::NotFound(VEHICLE_NOT_FOUND.into()));
        }
        tracing::info!(vehicle_id = %vehicle_id, user_id = %user_id, "Default vehicle changed");
        Ok(())
    }

    /// Unregisters a vehicle that is not parked in the user's active session.
    pub async fn remove_vehicle(
        &self,
        user_id: UserId,
        vehicle_id: VehicleId,
    ) -> Result<(), AppError> {
        let in_use = self
            .sessions
            .find_active_by_user(user_id)
            .await?
            .is_some_and(|session| session.vehicle_id == vehicle_id);
        if in_use {
            return Err(AppError::Conflict(
                "Vehicle is used by the active parking session".into(),
            ));
        }

        if !self.directory.remove_vehicle(user_id, vehicle_id).await? {
            return Err(AppError::NotFound(VEHICLE_NOT_FOUND.into()));
        }
        tracing::info!(vehicle_id = %vehicle_id, user_id = %user_id, "Vehicle removed");
        Ok(())
    }

    pub async fn parking_lot(&self, id: ParkingLotId) -> Result<ParkingLot, AppError> {
        self.directory
            .find_parking_lot(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parking lot not found".into()))
    }
}
