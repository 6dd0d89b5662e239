//! Time sources and timestamp formatting for the `Timestamp` query parameter.
use {
    crate::{constants::TIMESTAMP_FORMAT, SignatureError},
    chrono::{
        naive::{NaiveDate, NaiveDateTime, NaiveTime},
        DateTime, Duration, FixedOffset, TimeZone, Utc,
    },
    lazy_static::lazy_static,
    regex::{Captures, Regex},
    std::str::FromStr,
};

lazy_static! {
    /// ISO 8601 timestamp format, with optional separators, fractional seconds, and offset.
    static ref ISO_8601_REGEX: Regex = Regex::new(
        r"(?x)^
        (?P<year>\d{4})-?
        (?P<month>0[1-9]|1[0-2])-?
        (?P<day>0[1-9]|[12][0-9]|3[01])
        T
        (?P<hour>[01][0-9]|2[0-3]):?
        (?P<minute>[0-5][0-9]):?
        (?P<second>[0-5][0-9])
        (?:\.(?P<fraction>\d{1,9}))?
        (?P<offset>[-+][01][0-9]:?[0-5][0-9]|Z)$").unwrap();
}

/// A source of the current time.
///
/// The signer asks its clock for the time only when the caller did not supply a `Timestamp`
/// parameter.
pub trait Clock {
    /// Return the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// A [Clock] that reads the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [Clock] that always returns the same instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Render a timestamp in the `YYYY-MM-DDTHH:MM:SSZ` form used by the `Timestamp` parameter.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO 8601 timestamp, converting it to UTC.
///
/// Both the extended (`2024-01-01T00:00:00Z`) and basic (`20240101T000000Z`) forms are accepted,
/// as are numeric offsets (`+09:00`) and fractional seconds.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SignatureError> {
    let invalid = || SignatureError::Encoding(format!("Timestamp must be in ISO-8601 format. Got '{}'", s));
    let cap = ISO_8601_REGEX.captures(s).ok_or_else(invalid)?;

    let naive_date =
        NaiveDate::from_ymd_opt(capture(&cap, "year")?, capture(&cap, "month")?, capture(&cap, "day")?)
            .ok_or_else(invalid)?;

    let nanos = match cap.name("fraction") {
        // Right-pad to nanoseconds: ".5" is 500 ms, not 5 ns.
        Some(m) => u32::from_str(&format!("{:0<9}", m.as_str())).map_err(|_| invalid())?,
        None => 0,
    };

    let naive_time = NaiveTime::from_hms_nano_opt(
        capture(&cap, "hour")?,
        capture(&cap, "minute")?,
        capture(&cap, "second")?,
        nanos,
    )
    .ok_or_else(invalid)?;

    let naive_dt = NaiveDateTime::new(naive_date, naive_time);

    let offset_str = cap.name("offset").map(|m| m.as_str()).unwrap_or("Z");
    let offset_secs = if offset_str == "Z" {
        0
    } else {
        // Must be [+-]HHMM once the colon is removed.
        let offset_condensed = offset_str.replace(':', "");
        let (sign_str, hm) = offset_condensed.split_at(1);
        let (hour_off_str, minute_off_str) = hm.split_at(2);
        let sign = if sign_str == "-" {
            -1
        } else {
            1
        };
        let hour = i32::from_str(hour_off_str).map_err(|_| invalid())?;
        let min = i32::from_str(minute_off_str).map_err(|_| invalid())?;
        sign * (hour * 3600 + min * 60)
    };

    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(invalid)?;
    let local = offset.from_local_datetime(&naive_dt).single().ok_or_else(invalid)?;
    Ok(local.with_timezone(&Utc))
}

/// Render a duration the way AWS error messages do, e.g. `15 min`.
pub(crate) fn duration_to_string(duration: Duration) -> String {
    let secs = duration.num_seconds();
    if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} sec", secs)
    }
}

fn capture<T: FromStr>(cap: &Captures, name: &str) -> Result<T, SignatureError> {
    cap.name(name)
        .and_then(|m| T::from_str(m.as_str()).ok())
        .ok_or_else(|| SignatureError::Encoding(format!("Timestamp is missing its {} component", name)))
}
