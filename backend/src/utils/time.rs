use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Display format used by every timestamp in API responses.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Renders a UTC instant as local wall-clock text in `tz`.
pub fn format_local(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Server clock rendered for the `server_time` response field.
pub fn server_time(tz: &Tz) -> String {
    now_in_timezone(tz).format(DISPLAY_FORMAT).to_string()
}
