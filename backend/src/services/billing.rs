//! Billing engine.
//!
//! Whole-hour ceiling pricing: the first started hour costs the session's
//! `fee_rate`, every further started hour costs `extra_hour_rate`. The stored
//! `fee_current` only moves at checkpoints ([`roll_forward`] and [`settle`]);
//! [`compute_billing_snapshot`] is a pure read.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::parking_session::ParkingSession;

pub const BILLING_CYCLE_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("current time {now} precedes session start {start}")]
    ClockBeforeStart {
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

/// Caller-visible billing state of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BillingSnapshot {
    pub fee_current: f64,
    pub estimated_fee: f64,
    pub billing_progress_percent: i32,
    pub remaining_minutes_to_next_billing: i32,
    pub current_billing_cycle: i32,
    pub elapsed_minutes: i64,
}

fn cycle() -> Duration {
    Duration::minutes(BILLING_CYCLE_MINUTES)
}

fn ensure_started(session: &ParkingSession, now: DateTime<Utc>) -> Result<(), BillingError> {
    if now < session.start_time {
        return Err(BillingError::ClockBeforeStart {
            start: session.start_time,
            now,
        });
    }
    Ok(())
}

/// Cycles started within `span`: a span of exactly `n` cycles is `n`, any
/// remainder (down to a nanosecond) starts one more.
fn started_cycles(span: Duration) -> i64 {
    if span <= Duration::zero() {
        return 0;
    }
    let cycle_ms = BILLING_CYCLE_MINUTES * 60_000;
    let whole = span.num_milliseconds() / cycle_ms;
    if span > Duration::milliseconds(whole * cycle_ms) {
        whole + 1
    } else {
        whole
    }
}

/// Cycles a persisted schedule owes at `now`. The boundary instant itself
/// still belongs to the cycle that ends there.
fn cycles_due(next_billing_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    started_cycles(now - next_billing_time)
}

/// Number of started hours in `elapsed`, never less than one.
pub fn billed_hours(elapsed: Duration) -> i64 {
    started_cycles(elapsed).max(1)
}

/// Fee owed after `elapsed` under the first-hour-then-hourly rule.
pub fn estimate_fee(fee_rate: f64, extra_hour_rate: f64, elapsed: Duration) -> f64 {
    fee_rate + (billed_hours(elapsed) - 1) as f64 * extra_hour_rate
}

/// Display text describing the pricing rule.
pub fn pricing_rule(fee_rate: f64, extra_hour_rate: f64) -> String {
    format!(
        "首小时{}元，后续每小时{}元",
        format_amount(fee_rate),
        format_amount(extra_hour_rate)
    )
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

pub fn compute_billing_snapshot(
    session: &ParkingSession,
    now: DateTime<Utc>,
) -> Result<BillingSnapshot, BillingError> {
    ensure_started(session, now)?;

    let until = session.end_time.unwrap_or(now);
    let elapsed = until - session.start_time;

    let (remaining_minutes, progress_percent) = match session.next_billing_time {
        Some(next) => {
            let remaining = (next - now).num_minutes().max(0);
            let progress = ((BILLING_CYCLE_MINUTES - remaining) * 100)
                .div_euclid(BILLING_CYCLE_MINUTES)
                .clamp(0, 100);
            (remaining, progress)
        }
        None => (0, 0),
    };

    // What settling at `now` would charge; follows extensions of the schedule.
    let estimated_fee = match session.next_billing_time {
        Some(next) if session.is_active() => {
            session.fee_current + cycles_due(next, now) as f64 * session.extra_hour_rate
        }
        _ => session.fee_current,
    };

    Ok(BillingSnapshot {
        fee_current: session.fee_current,
        estimated_fee,
        billing_progress_percent: progress_percent as i32,
        remaining_minutes_to_next_billing: i32::try_from(remaining_minutes).unwrap_or(i32::MAX),
        current_billing_cycle: session.current_billing_cycle,
        elapsed_minutes: elapsed.num_minutes().max(0),
    })
}

/// Billing fields for a session created at `start`.
pub fn initialize(session: &mut ParkingSession, start: DateTime<Utc>) {
    session.fee_current = session.fee_rate;
    session.next_billing_time = Some(start + cycle());
    session.next_fee_amount = Some(session.extra_hour_rate);
    session.current_billing_cycle = 0;
    session.pricing_rule = pricing_rule(session.fee_rate, session.extra_hour_rate);
}

/// Charges every billing boundary that `now` has moved past.
///
/// Returns the number of cycles charged; zero means nothing changed.
pub fn roll_forward(session: &mut ParkingSession, now: DateTime<Utc>) -> Result<i64, BillingError> {
    ensure_started(session, now)?;

    let Some(next) = session.next_billing_time else {
        return Ok(0);
    };
    let cycles = cycles_due(next, now);
    if cycles == 0 {
        return Ok(0);
    }

    let cycles_i32 = i32::try_from(cycles).unwrap_or(i32::MAX);
    session.fee_current += cycles as f64 * session.extra_hour_rate;
    session.current_billing_cycle = session.current_billing_cycle.saturating_add(cycles_i32);
    session.next_billing_time = Some(next + Duration::minutes(BILLING_CYCLE_MINUTES * cycles));
    Ok(cycles)
}

/// Final checkpoint at `end_time`: charges due cycles and closes the schedule.
pub fn settle(session: &mut ParkingSession, end_time: DateTime<Utc>) -> Result<f64, BillingError> {
    roll_forward(session, end_time)?;
    session.next_billing_time = None;
    session.next_fee_amount = None;
    Ok(session.fee_current)
}

/// Delays the next billing boundary by `minutes`.
///
/// Sessions without a pending boundary are left untouched; returns whether
/// anything changed.
pub fn extend(session: &mut ParkingSession, minutes: i64) -> Option<bool> {
    let Some(next) = session.next_billing_time else {
        return Some(false);
    };
    let shift = Duration::try_minutes(minutes)?;
    session.next_billing_time = Some(next.checked_add_signed(shift)?);
    Some(true)
}
