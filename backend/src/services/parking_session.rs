//! Session lifecycle controller.
//!
//! Loads sessions through the injected store, applies the billing engine and
//! the navigation simulator, and writes the result back under optimistic
//! concurrency. Every operation takes `now` explicitly so time only moves
//! when a caller asks.

use std::{collections::HashMap, future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::AppError;
use crate::models::{
    parking_lot::ParkingLot,
    parking_record::ParkingRecord,
    parking_session::{
        HistoryItem, NavigationStatus, ParkingSession, SessionStatus, SessionView,
        StartSessionRequest,
    },
    vehicle::Vehicle,
    PageRequest,
};
use crate::repositories::{
    parking_session::VERSION_CONFLICT_MESSAGE, ParkingDirectoryTrait,
    ParkingSessionRepositoryTrait,
};
use crate::services::billing::{self, BillingError, BillingSnapshot};
use crate::services::navigation::{self, NavigationSettings};
use crate::types::{ParkingLotId, ParkingSessionId, UserId};

/// Attempts per read-modify-write before a version conflict reaches the caller.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

const SESSION_NOT_FOUND: &str = "Parking session not found";

/// Active or ended session with everything the session view displays.
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub session: ParkingSession,
    pub billing: BillingSnapshot,
    pub vehicle: Option<Vehicle>,
    pub parking_lot: Option<ParkingLot>,
}

impl SessionDetails {
    pub fn view(&self, tz: &Tz) -> SessionView {
        SessionView::build(
            &self.session,
            &self.billing,
            self.vehicle.as_ref(),
            self.parking_lot.as_ref(),
            tz,
        )
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub session: ParkingSession,
    pub parking_lot_name: String,
}

#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: i64,
    pub page: PageRequest,
}

impl HistoryPage {
    pub fn items(&self, tz: &Tz) -> Vec<HistoryItem> {
        self.entries
            .iter()
            .map(|entry| HistoryItem::build(&entry.session, entry.parking_lot_name.clone(), tz))
            .collect()
    }
}

#[derive(Clone)]
pub struct ParkingSessionService {
    sessions: Arc<dyn ParkingSessionRepositoryTrait>,
    directory: Arc<dyn ParkingDirectoryTrait>,
    navigation: NavigationSettings,
}

fn billing_failure(err: BillingError) -> AppError {
    AppError::InternalServerError(err.into())
}

fn is_version_conflict(err: &AppError) -> bool {
    matches!(err, AppError::Conflict(msg) if msg == VERSION_CONFLICT_MESSAGE)
}

async fn with_write_retry<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(err) if is_version_conflict(&err) && tries < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(operation, attempt = tries, "Session version conflict, retrying");
            }
            Err(err) if is_version_conflict(&err) => {
                tracing::warn!(operation, attempts = tries, "Giving up after repeated version conflicts");
                return Err(err);
            }
            result => return result,
        }
    }
}

impl ParkingSessionService {
    pub fn new(
        sessions: Arc<dyn ParkingSessionRepositoryTrait>,
        directory: Arc<dyn ParkingDirectoryTrait>,
        navigation: NavigationSettings,
    ) -> Self {
        Self {
            sessions,
            directory,
            navigation,
        }
    }

    pub async fn start_session(
        &self,
        user_id: UserId,
        request: StartSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<SessionDetails, AppError> {
        let vehicle = self
            .directory
            .find_vehicle(request.vehicle_id)
            .await?
            .filter(|vehicle| vehicle.is_usable_by(user_id))
            .ok_or_else(|| AppError::NotFound("Vehicle not found".into()))?;

        let lot = self
            .directory
            .find_parking_lot(request.parking_lot_id)
            .await?
            .filter(|lot| lot.is_active)
            .ok_or_else(|| AppError::NotFound("Parking lot not found".into()))?;

        if self.sessions.find_active_by_user(user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User already has an active parking session".into(),
            ));
        }

        let position = request.user_position;
        let mut session = ParkingSession {
            id: ParkingSessionId::new(),
            user_id,
            vehicle_id: vehicle.id,
            parking_lot_id: lot.id,
            spot_code: request.spot_code.trim().to_string(),
            spot_type: request.spot_type,
            start_time: now,
            end_time: None,
            status: SessionStatus::Active,
            fee_rate: lot.first_hour_fee,
            extra_hour_rate: lot.extra_hour_rate,
            fee_current: 0.0,
            next_billing_time: None,
            next_fee_amount: None,
            current_billing_cycle: 0,
            pricing_rule: String::new(),
            navigation_status: NavigationStatus::EnRoute,
            remaining_distance_m: 0,
            estimated_minutes: 0,
            total_distance_m: 0,
            destination_lat: lot.latitude,
            destination_lon: lot.longitude,
            user_position_lat: position.map(|p| p.lat),
            user_position_lon: position.map(|p| p.lon),
            progress_to_destination_percent: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        billing::initialize(&mut session, now);
        navigation::initialize(&mut session, &self.navigation, request.already_parked);

        let created = self.sessions.create(&session).await?;
        tracing::info!(
            session_id = %created.id,
            user_id = %user_id,
            parking_lot_id = %lot.id,
            navigation_status = %created.navigation_status,
            "Parking session started"
        );

        let billing = billing::compute_billing_snapshot(&created, now).map_err(billing_failure)?;
        Ok(SessionDetails {
            session: created,
            billing,
            vehicle: Some(vehicle),
            parking_lot: Some(lot),
        })
    }

    /// The caller's active session, billed up to `now`.
    pub async fn get_current_session(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionDetails>, AppError> {
        let session =
            with_write_retry("get_current_session", || self.checkpoint_active(user_id, now))
                .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let billing = billing::compute_billing_snapshot(&session, now).map_err(billing_failure)?;
        let vehicle = self.directory.find_vehicle(session.vehicle_id).await?;
        let parking_lot = self.directory.find_parking_lot(session.parking_lot_id).await?;
        Ok(Some(SessionDetails {
            session,
            billing,
            vehicle,
            parking_lot,
        }))
    }

    pub async fn get_session_history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<HistoryPage, AppError> {
        let sessions = self.sessions.list_ended_by_user(user_id, page).await?;
        let total = self.sessions.count_ended_by_user(user_id).await?;

        let mut lot_names: HashMap<ParkingLotId, String> = HashMap::new();
        let mut entries = Vec::with_capacity(sessions.len());
        for session in sessions {
            let parking_lot_name = match lot_names.get(&session.parking_lot_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .directory
                        .find_parking_lot(session.parking_lot_id)
                        .await?
                        .map(|lot| lot.name)
                        .unwrap_or_default();
                    lot_names.insert(session.parking_lot_id, name.clone());
                    name
                }
            };
            entries.push(HistoryEntry {
                session,
                parking_lot_name,
            });
        }

        Ok(HistoryPage {
            entries,
            total,
            page,
        })
    }

    /// Advances navigation by one step; a no-op once the session left `en_route`.
    pub async fn refresh_navigation(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
    ) -> Result<ParkingSession, AppError> {
        with_write_retry("refresh_navigation", || self.refresh_once(user_id, session_id)).await
    }

    /// Ends the session at `now` and writes its receipt in one transaction.
    pub async fn pay_current_fee(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
        now: DateTime<Utc>,
    ) -> Result<ParkingRecord, AppError> {
        with_write_retry("pay_current_fee", || self.pay_once(user_id, session_id, now)).await
    }

    /// Delays the next billing boundary. Returns whether anything changed.
    pub async fn extend_session(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
        minutes: i64,
    ) -> Result<bool, AppError> {
        if minutes < 1 {
            return Err(AppError::BadRequest(
                "minutes must be a positive integer".into(),
            ));
        }
        with_write_retry("extend_session", || {
            self.extend_once(user_id, session_id, minutes)
        })
        .await
    }

    async fn checkpoint_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ParkingSession>, AppError> {
        let Some(mut session) = self.sessions.find_active_by_user(user_id).await? else {
            return Ok(None);
        };
        let cycles = billing::roll_forward(&mut session, now).map_err(billing_failure)?;
        if cycles == 0 {
            return Ok(Some(session));
        }
        let saved = self.sessions.update(&session).await?;
        tracing::info!(
            session_id = %saved.id,
            cycles,
            fee_current = saved.fee_current,
            "Billing rolled forward"
        );
        Ok(Some(saved))
    }

    async fn refresh_once(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
    ) -> Result<ParkingSession, AppError> {
        let mut session = self.load_owned(user_id, session_id).await?;
        let outcome = navigation::refresh(&mut session, self.navigation.step_m);
        if !outcome.changed() {
            return Ok(session);
        }
        let saved = self.sessions.update(&session).await?;
        tracing::debug!(
            session_id = %saved.id,
            remaining_distance_m = saved.remaining_distance_m,
            navigation_status = %saved.navigation_status,
            "Navigation refreshed"
        );
        Ok(saved)
    }

    async fn pay_once(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
        now: DateTime<Utc>,
    ) -> Result<ParkingRecord, AppError> {
        let mut session = self.load_owned(user_id, session_id).await?;
        if !session.is_active() {
            return Err(AppError::BadRequest("Parking session already ended".into()));
        }

        billing::settle(&mut session, now).map_err(billing_failure)?;
        session.end_time = Some(now);
        session.status = SessionStatus::Ended;
        let record = ParkingRecord::for_session(&session, now);

        let ended = self.sessions.end_with_record(&session, &record).await?;
        tracing::info!(
            session_id = %ended.id,
            user_id = %user_id,
            fee = record.fee,
            "Parking session paid"
        );
        Ok(record)
    }

    async fn extend_once(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
        minutes: i64,
    ) -> Result<bool, AppError> {
        let mut session = self.load_owned(user_id, session_id).await?;
        let changed = billing::extend(&mut session, minutes)
            .ok_or_else(|| AppError::BadRequest("minutes is out of range".into()))?;
        if !changed {
            return Ok(false);
        }
        let saved = self.sessions.update(&session).await?;
        tracing::info!(
            session_id = %saved.id,
            minutes,
            next_billing_time = ?saved.next_billing_time,
            "Parking session extended"
        );
        Ok(true)
    }

    async fn load_owned(
        &self,
        user_id: UserId,
        session_id: ParkingSessionId,
    ) -> Result<ParkingSession, AppError> {
        self.sessions
            .find_by_id_and_user(session_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.into()))
    }
}
