use chrono::DateTime;
use chrono::Utc;

/// return second
pub(crate) fn get_now_as_u64() -> u64 {
    unix_seconds(Utc::now())
}

/// Seconds since the epoch, clamped to zero for pre-1970 clocks.
pub(crate) fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

/// `YYYY-MM-DD` of the given instant in UTC
pub(crate) fn utc_date_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
