use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::Position;
use crate::services::billing::pricing_rule;
use crate::types::ParkingLotId;

/// Parking lot with the pricing that new sessions capture.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkingLot {
    pub id: ParkingLotId,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub floor: Option<String>,
    pub area: Option<String>,
    /// Flat fee for the first started hour.
    pub first_hour_fee: f64,
    /// Fee for every further started hour.
    pub extra_hour_rate: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ParkingLot {
    pub fn new(
        name: String,
        address: String,
        position: Position,
        first_hour_fee: f64,
        extra_hour_rate: f64,
    ) -> Self {
        Self {
            id: ParkingLotId::new(),
            name,
            address,
            latitude: position.lat,
            longitude: position.lon,
            floor: None,
            area: None,
            first_hour_fee,
            extra_hour_rate,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn position(&self) -> Position {
        Position {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

/// Public lot details, including the pricing new sessions will capture.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParkingLotView {
    #[schema(value_type = String, format = Uuid)]
    pub id: ParkingLotId,
    pub name: String,
    pub address: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub first_hour_fee: f64,
    pub extra_hour_rate: f64,
    pub pricing_rule: String,
    pub is_active: bool,
}

impl From<ParkingLot> for ParkingLotView {
    fn from(lot: ParkingLot) -> Self {
        Self {
            id: lot.id,
            position: lot.position(),
            pricing_rule: pricing_rule(lot.first_hour_fee, lot.extra_hour_rate),
            name: lot.name,
            address: lot.address,
            floor: lot.floor,
            area: lot.area,
            first_hour_fee: lot.first_hour_fee,
            extra_hour_rate: lot.extra_hour_rate,
            is_active: lot.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParkingLotResponse {
    pub success: bool,
    pub data: ParkingLotView,
}
