//! Duration parsing utilities for human-readable timeouts like "2s", "500ms".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Parse a duration string like "500ms", "2s", "1m", "1h".
///
/// Supported units:
/// - `ms` - milliseconds
/// - `s` - seconds
/// - `m` - minutes
/// - `h` - hours
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use cosmoscope::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, unit_ms) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, MS_PER_SECOND)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, MS_PER_MINUTE)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, MS_PER_HOUR)
    } else {
        anyhow::bail!("Duration must end with ms, s, m, or h");
    };

    let num: u64 = num.parse().with_context(|| "Invalid number in duration")?;
    let millis = num.checked_mul(unit_ms).context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Format a duration using the largest unit that divides it evenly.
///
/// # Examples
///
/// ```
/// use cosmoscope::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(3)), "3s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
/// assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
/// ```
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis() as u64;

    if ms >= MS_PER_HOUR && ms % MS_PER_HOUR == 0 {
        format!("{}h", ms / MS_PER_HOUR)
    } else if ms >= MS_PER_MINUTE && ms % MS_PER_MINUTE == 0 {
        format!("{}m", ms / MS_PER_MINUTE)
    } else if ms >= MS_PER_SECOND && ms % MS_PER_SECOND == 0 {
        format!("{}s", ms / MS_PER_SECOND)
    } else {
        format!("{ms}ms")
    }
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Serde serializer producing the same format [`parse_duration`] accepts.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
