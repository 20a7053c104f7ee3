use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{UserId, VehicleId};
use crate::utils::time::format_local;
use crate::validation::rules::validate_plate_number;

/// Vehicle registered by a driver. Removal only clears `is_active` so that
/// past sessions keep their plate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: VehicleId,
    pub user_id: UserId,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(user_id: UserId, plate_number: String, brand: String, model: String) -> Self {
        Self {
            id: VehicleId::new(),
            user_id,
            plate_number,
            brand,
            model,
            color: String::new(),
            is_default: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Registered to `user_id` and not removed.
    pub fn is_usable_by(&self, user_id: UserId) -> bool {
        self.is_active && self.is_owned_by(user_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    #[validate(custom(function = "validate_plate_number"))]
    pub plate_number: String,
    #[validate(length(min = 1, max = 50))]
    pub brand: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(length(max = 20))]
    pub color: Option<String>,
}

impl CreateVehicleRequest {
    pub fn into_vehicle(self, user_id: UserId, now: DateTime<Utc>) -> Vehicle {
        Vehicle {
            color: self.color.map(|c| c.trim().to_string()).unwrap_or_default(),
            created_at: now,
            ..Vehicle::new(
                user_id,
                self.plate_number.trim().to_uppercase(),
                self.brand.trim().to_string(),
                self.model.trim().to_string(),
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VehicleView {
    #[schema(value_type = String, format = Uuid)]
    pub id: VehicleId,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub is_default: bool,
    pub created_at: String,
}

impl VehicleView {
    pub fn build(vehicle: &Vehicle, tz: &Tz) -> Self {
        Self {
            id: vehicle.id,
            plate_number: vehicle.plate_number.clone(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            color: vehicle.color.clone(),
            is_default: vehicle.is_default,
            created_at: format_local(vehicle.created_at, tz),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleResponse {
    pub success: bool,
    pub data: VehicleView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleListResponse {
    pub success: bool,
    pub data: Vec<VehicleView>,
    pub count: usize,
}
