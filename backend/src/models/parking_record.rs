use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::parking_session::{ParkingSession, SpotType};
use crate::types::{ParkingLotId, ParkingRecordId, ParkingSessionId, UserId, VehicleId};

/// Immutable receipt written together with the payment of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParkingRecord {
    pub id: ParkingRecordId,
    pub session_id: ParkingSessionId,
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub parking_lot_id: ParkingLotId,
    pub spot_code: String,
    pub spot_type: SpotType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub fee: f64,
    pub duration_hours: f64,
    pub created_at: DateTime<Utc>,
}

impl ParkingRecord {
    /// Receipt for a session that ends at `end_time` with its settled fee.
    pub fn for_session(session: &ParkingSession, end_time: DateTime<Utc>) -> Self {
        let duration_hours = (end_time - session.start_time).num_seconds().max(0) as f64 / 3600.0;
        Self {
            id: ParkingRecordId::new(),
            session_id: session.id,
            user_id: session.user_id,
            vehicle_id: session.vehicle_id,
            parking_lot_id: session.parking_lot_id,
            spot_code: session.spot_code.clone(),
            spot_type: session.spot_type,
            start_time: session.start_time,
            end_time,
            fee: session.fee_current,
            duration_hours,
            created_at: end_time,
        }
    }
}
