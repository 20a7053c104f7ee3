//! Pull-based navigation simulator.
//!
//! Nothing here ticks on its own; a session only moves closer to its spot
//! when a caller asks for a refresh.

use serde::{Deserialize, Serialize};

use crate::models::parking_session::{NavigationStatus, ParkingSession};

pub const DEFAULT_TOTAL_DISTANCE_M: i32 = 2000;
pub const DEFAULT_STEP_M: i32 = 50;
/// At or below this remaining distance the vehicle is inside the garage.
pub const ARRIVAL_THRESHOLD_M: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationSettings {
    pub total_distance_m: i32,
    pub step_m: i32,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            total_distance_m: DEFAULT_TOTAL_DISTANCE_M,
            step_m: DEFAULT_STEP_M,
        }
    }
}

impl NavigationSettings {
    pub fn new(total_distance_m: i32, step_m: i32) -> Self {
        Self {
            total_distance_m: total_distance_m.max(0),
            step_m: step_m.max(1),
        }
    }

    pub fn initial_estimated_minutes(&self) -> i32 {
        let total = self.total_distance_m.max(0);
        (total + self.step_m - 1) / self.step_m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Navigation already left `en_route`; the session was not touched.
    Unchanged,
    Advanced,
    /// This step brought the vehicle inside the garage.
    Arrived,
}

impl RefreshOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, RefreshOutcome::Unchanged)
    }
}

pub fn progress_percent(total_distance_m: i32, remaining_distance_m: i32) -> i32 {
    if total_distance_m <= 0 {
        return 100;
    }
    let travelled = i64::from(total_distance_m) - i64::from(remaining_distance_m.max(0));
    (travelled * 100 / i64::from(total_distance_m)).clamp(0, 100) as i32
}

/// Navigation fields for a freshly created session.
///
/// A trip that already starts within [`ARRIVAL_THRESHOLD_M`] begins
/// `in_garage`.
pub fn initialize(session: &mut ParkingSession, settings: &NavigationSettings, already_parked: bool) {
    session.total_distance_m = settings.total_distance_m;
    if already_parked || settings.total_distance_m <= ARRIVAL_THRESHOLD_M {
        session.navigation_status = if already_parked {
            NavigationStatus::Parked
        } else {
            NavigationStatus::InGarage
        };
        session.remaining_distance_m = 0;
        session.estimated_minutes = 0;
        session.progress_to_destination_percent = 100;
    } else {
        session.navigation_status = NavigationStatus::EnRoute;
        session.remaining_distance_m = settings.total_distance_m;
        session.estimated_minutes = settings.initial_estimated_minutes();
        session.progress_to_destination_percent =
            progress_percent(session.total_distance_m, session.remaining_distance_m);
    }
}

/// Advances an `en_route` session by one step.
pub fn refresh(session: &mut ParkingSession, step_m: i32) -> RefreshOutcome {
    if session.navigation_status != NavigationStatus::EnRoute {
        return RefreshOutcome::Unchanged;
    }

    session.remaining_distance_m = session.remaining_distance_m.saturating_sub(step_m.max(1)).max(0);
    session.estimated_minutes = session.estimated_minutes.saturating_sub(1).max(0);

    let progress = progress_percent(session.total_distance_m, session.remaining_distance_m);
    session.progress_to_destination_percent = progress.max(session.progress_to_destination_percent);

    if session.remaining_distance_m <= ARRIVAL_THRESHOLD_M {
        session.navigation_status = NavigationStatus::InGarage;
        RefreshOutcome::Arrived
    } else {
        RefreshOutcome::Advanced
    }
}
