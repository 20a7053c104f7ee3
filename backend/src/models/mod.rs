//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_HISTORY_PAGE_SIZE: i64 = 5;
pub const MAX_HISTORY_PAGE_SIZE: i64 = 50;

/// Query parameters for the parking history endpoint.
///
/// Values are kept as raw strings so that unparseable input falls back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// 1-based page number (default: 1).
    pub page: Option<String>,
    /// Items per page (default: 5, clamped to 1..=50).
    pub page_size: Option<String>,
}

impl HistoryQuery {
    pub fn page_request(&self) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        PageRequest::new(page, page_size)
    }
}

/// Normalized page/page size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_HISTORY_PAGE_SIZE)
                .clamp(1, MAX_HISTORY_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

pub mod parking_lot;
pub mod parking_record;
pub mod parking_session;
pub mod user;
pub mod vehicle;
