//! Timestamp handling for the `Date` header.
//!
//! The header carries an ISO 8601 timestamp in UTC with millisecond precision and a literal `Z`
//! suffix, e.g. `2024-01-02T03:04:05.678Z`. This is what JavaScript's `Date.toISOString()`
//! produces, and the verifier on the other end expects exactly this shape.

use {
    crate::{constants::ISO8601_MILLIS_FORMAT, SignatureError},
    chrono::{
        naive::{NaiveDate, NaiveDateTime, NaiveTime},
        DateTime, Utc,
    },
    lazy_static::lazy_static,
    regex::Regex,
    std::str::FromStr,
};

lazy_static! {
    /// ISO 8601 timestamp with millisecond precision in UTC.
    static ref ISO_8601_MILLIS_REGEX: Regex = Regex::new(
        r"(?x)^
        (?P<year>\d{4})-
        (?P<month>0[1-9]|1[0-2])-
        (?P<day>0[1-9]|[12][0-9]|3[01])
        T
        (?P<hour>[01][0-9]|2[0-3]):
        (?P<minute>[0-5][0-9]):
        (?P<second>[0-5][0-9])
        \.(?P<millis>\d{3})
        Z$").unwrap();
}

/// Format a timestamp for the `Date` header.
///
/// Sub-millisecond precision is truncated, never rounded, so the value never claims a time later
/// than the one that was read.
pub(crate) fn format_request_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(ISO8601_MILLIS_FORMAT).to_string()
}

/// Parse the value of a `Date` header produced by [`format_request_timestamp`].
pub(crate) fn parse_request_timestamp(s: &str) -> Result<DateTime<Utc>, SignatureError> {
    let invalid = || {
        SignatureError::MalformedHeader(format!(
            "Date must be in ISO-8601 format with milliseconds, e.g. '2024-01-02T03:04:05.678Z'. Got '{}'.",
            s
        ))
    };

    let cap = ISO_8601_MILLIS_REGEX.captures(s).ok_or_else(invalid)?;
    // The regex guarantees every group is present and numeric.
    let field = |name: &str| u32::from_str(&cap[name]).map_err(|_| invalid());

    let year = i32::from_str(&cap["year"]).map_err(|_| invalid())?;
    let naive_date = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?).ok_or_else(invalid)?;
    let naive_time =
        NaiveTime::from_hms_milli_opt(field("hour")?, field("minute")?, field("second")?, field("millis")?)
            .ok_or_else(invalid)?;

    Ok(DateTime::from_naive_utc_and_offset(NaiveDateTime::new(naive_date, naive_time), Utc))
}
