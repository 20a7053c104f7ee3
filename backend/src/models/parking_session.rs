//! Parking session rows, lifecycle enums and their API representations.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{parking_lot::ParkingLot, vehicle::Vehicle, Position};
use crate::services::billing::BillingSnapshot;
use crate::types::{ParkingLotId, ParkingSessionId, UserId, VehicleId};
use crate::utils::time::format_local;
use crate::validation::rules::validate_spot_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

text_enum!(SessionStatus, "session status", {
    Active => "active",
    Ended => "ended",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpotType {
    #[default]
    Normal,
    Charging,
    Disabled,
    Vip,
}

text_enum!(SpotType, "spot type", {
    Normal => "normal",
    Charging => "charging",
    Disabled => "disabled",
    Vip => "vip",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStatus {
    EnRoute,
    InGarage,
    Parked,
}

text_enum!(NavigationStatus, "navigation status", {
    EnRoute => "en_route",
    InGarage => "in_garage",
    Parked => "parked",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParkingSession {
    pub id: ParkingSessionId,
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub parking_lot_id: ParkingLotId,
    pub spot_code: String,
    pub spot_type: SpotType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    /// Fee charged for the first started hour.
    pub fee_rate: f64,
    /// Fee charged for every further started hour.
    pub extra_hour_rate: f64,
    pub fee_current: f64,
    pub next_billing_time: Option<DateTime<Utc>>,
    pub next_fee_amount: Option<f64>,
    pub current_billing_cycle: i32,
    pub pricing_rule: String,
    pub navigation_status: NavigationStatus,
    pub remaining_distance_m: i32,
    pub estimated_minutes: i32,
    /// Trip length captured at creation; progress is measured against it.
    pub total_distance_m: i32,
    pub destination_lat: f64,
    pub destination_lon: f64,
    pub user_position_lat: Option<f64>,
    pub user_position_lon: Option<f64>,
    pub progress_to_destination_percent: i32,
    /// Optimistic concurrency token, bumped on every successful write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn destination(&self) -> Position {
        Position {
            lat: self.destination_lat,
            lon: self.destination_lon,
        }
    }

    pub fn user_position(&self) -> Option<Position> {
        match (self.user_position_lat, self.user_position_lon) {
            (Some(lat), Some(lon)) => Some(Position { lat, lon }),
            _ => None,
        }
    }

    /// Whole minutes between start and `until` (or the end time once ended).
    pub fn duration_minutes(&self, until: DateTime<Utc>) -> i64 {
        let end = self.end_time.unwrap_or(until);
        (end - self.start_time).num_minutes().max(0)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StartSessionRequest {
    #[schema(value_type = String, format = Uuid)]
    pub vehicle_id: VehicleId,
    #[schema(value_type = String, format = Uuid)]
    pub parking_lot_id: ParkingLotId,
    #[validate(custom(function = "validate_spot_code"))]
    pub spot_code: String,
    #[serde(default)]
    pub spot_type: SpotType,
    /// Vehicle already occupies the spot; navigation starts as `parked`.
    #[serde(default)]
    pub already_parked: bool,
    pub user_position: Option<Position>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExtendSessionRequest {
    #[validate(range(min = 1))]
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParkingLotInfo {
    #[schema(value_type = String, format = Uuid)]
    pub id: ParkingLotId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NavigationView {
    pub status: NavigationStatus,
    pub remaining_distance_m: i32,
    pub estimated_minutes: i32,
    pub destination: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_position: Option<Position>,
    pub progress_to_destination_percent: i32,
}

impl From<&ParkingSession> for NavigationView {
    fn from(session: &ParkingSession) -> Self {
        Self {
            status: session.navigation_status,
            remaining_distance_m: session.remaining_distance_m,
            estimated_minutes: session.estimated_minutes,
            destination: session.destination(),
            user_position: session.user_position(),
            progress_to_destination_percent: session.progress_to_destination_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    #[schema(value_type = String, format = Uuid)]
    pub id: ParkingSessionId,
    pub vehicle_plate: String,
    pub parking_lot: ParkingLotInfo,
    pub spot_code: String,
    pub spot_type: SpotType,
    pub start_time: String,
    pub duration_minutes: i64,
    pub fee_current: f64,
    /// What paying right now would charge; follows extensions. Display only.
    pub estimated_fee: f64,
    pub next_billing_time: Option<String>,
    pub next_fee_amount: Option<f64>,
    pub billing_progress_percent: i32,
    pub remaining_minutes_to_next_billing: i32,
    pub current_billing_cycle: i32,
    pub pricing_rule: String,
    pub navigation: NavigationView,
    pub status: SessionStatus,
}

impl SessionView {
    pub fn build(
        session: &ParkingSession,
        billing: &BillingSnapshot,
        vehicle: Option<&Vehicle>,
        lot: Option<&ParkingLot>,
        tz: &Tz,
    ) -> Self {
        Self {
            id: session.id,
            vehicle_plate: vehicle
                .map(|v| v.plate_number.clone())
                .unwrap_or_default(),
            parking_lot: ParkingLotInfo {
                id: session.parking_lot_id,
                name: lot.map(|l| l.name.clone()).unwrap_or_default(),
                floor: lot.and_then(|l| l.floor.clone()),
                area: lot.and_then(|l| l.area.clone()),
            },
            spot_code: session.spot_code.clone(),
            spot_type: session.spot_type,
            start_time: format_local(session.start_time, tz),
            duration_minutes: billing.elapsed_minutes,
            fee_current: billing.fee_current,
            estimated_fee: billing.estimated_fee,
            next_billing_time: session.next_billing_time.map(|t| format_local(t, tz)),
            next_fee_amount: session.next_fee_amount,
            billing_progress_percent: billing.billing_progress_percent,
            remaining_minutes_to_next_billing: billing.remaining_minutes_to_next_billing,
            current_billing_cycle: billing.current_billing_cycle,
            pricing_rule: session.pricing_rule.clone(),
            navigation: NavigationView::from(session),
            status: session.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    #[schema(value_type = String, format = Uuid)]
    pub id: ParkingSessionId,
    pub parking_lot_name: String,
    pub spot_type: SpotType,
    pub start_time: String,
    pub end_time: Option<String>,
    pub total_fee: f64,
    pub duration_minutes: Option<i64>,
}

impl HistoryItem {
    pub fn build(session: &ParkingSession, lot_name: String, tz: &Tz) -> Self {
        Self {
            id: session.id,
            parking_lot_name: lot_name,
            spot_type: session.spot_type,
            start_time: format_local(session.start_time, tz),
            end_time: session.end_time.map(|t| format_local(t, tz)),
            total_fee: session.fee_current,
            duration_minutes: session
                .end_time
                .map(|end| (end - session.start_time).num_minutes().max(0)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentSessionResponse {
    pub success: bool,
    pub data: Option<SessionView>,
    pub server_time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub data: SessionView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<HistoryItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NavigationResponse {
    pub success: bool,
    pub data: NavigationView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
