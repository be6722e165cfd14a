// Duration parsing and formatting for configuration values

use crate::{MonitorError, Result};
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Parse a duration string
///
/// Supported formats:
/// - "30s", "5m", "1h", "2d" - single unit
/// - "1h30m", "2m30s", "1500ms" - compound segments
/// - "3600" - plain number of seconds
///
/// Units: `ns`, `us`, `ms`, `s`, `m`, `h`, `d`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();

    if let Ok(seconds) = input.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    if input.is_empty() {
        return Err(invalid(input, "empty duration"));
    }

    let lowered = input.to_lowercase();
    let mut rest = lowered.as_str();
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| invalid(input, "missing unit (use ns, us, ms, s, m, h or d)"))?;
        if digits_end == 0 {
            return Err(invalid(input, "expected a number before the unit"));
        }

        let value: f64 = rest[..digits_end]
            .parse()
            .map_err(|e| invalid(input, &format!("invalid number: {}", e)))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let unit_seconds = match unit {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86400.0,
            _ => {
                return Err(invalid(
                    input,
                    &format!("unknown unit {:?} (use ns, us, ms, s, m, h or d)", unit),
                ));
            }
        };

        let segment = Duration::try_from_secs_f64(value * unit_seconds)
            .map_err(|e| invalid(input, &e.to_string()))?;
        total = total
            .checked_add(segment)
            .ok_or_else(|| invalid(input, "duration overflow"))?;
    }

    Ok(total)
}

/// Format a duration using the largest units that divide it evenly
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let nanos = duration.subsec_nanos();

    if secs == 0 && nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }

    if nanos == 0 {
        if secs > 0 {
            out.push_str(&format!("{}s", secs));
        }
    } else if nanos % 1_000_000 == 0 {
        out.push_str(&format!("{}ms", secs * 1000 + u64::from(nanos / 1_000_000)));
    } else {
        out.push_str(&format!("{}ns", secs * 1_000_000_000 + u64::from(nanos)));
    }

    out
}

fn invalid(input: &str, reason: &str) -> MonitorError {
    MonitorError::Config {
        message: format!("Invalid duration {:?}: {}", input, reason),
    }
}

/// Serde adapter for `Duration` fields written as duration strings
pub mod serde_duration {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}
