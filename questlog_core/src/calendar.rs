//! Logical calendar: maps instants to the day a log counts toward.
//!
//! Habits are often logged late at night. A fixed day-start offset (4 hours
//! by default) keeps post-midnight activity attributed to the same logical
//! day: with a 4-hour offset, a new day starts at 04:00, so 03:59 activity
//! still belongs to the previous date.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

/// Logical date of an instant in the prevailing local time zone
///
/// Subtracts `offset_hours` from the instant, then truncates to a calendar
/// date. Pure and total: `None` in, `None` out (callers use the sentinel to
/// special-case first-ever logs).
pub fn logical_date(instant: Option<DateTime<Utc>>, offset_hours: i64) -> Option<NaiveDate> {
    logical_date_in(instant, offset_hours, &Local)
}

/// Logical date against an explicit time zone
///
/// Same contract as [`logical_date`]; the zone parameter keeps day-boundary
/// behavior testable without depending on the host's local zone.
pub fn logical_date_in<Tz: TimeZone>(
    instant: Option<DateTime<Utc>>,
    offset_hours: i64,
    tz: &Tz,
) -> Option<NaiveDate> {
    let instant = instant?;
    let shifted = instant - Duration::hours(offset_hours);
    Some(shifted.with_timezone(tz).date_naive())
}
