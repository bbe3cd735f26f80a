//! Time encoding helpers: ISO 8601 durations and H:M:S strings

use crate::{HoloCoreError, Result};
use chrono::{DateTime, TimeDelta, Utc};

/// Parse an RFC 3339 timestamp (`2023-04-01T12:00:00Z`) into UTC, dropping sub-second precision
pub fn parse_rfc3339(timestamp: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(timestamp.trim())
        .map_err(|_| HoloCoreError::InvalidTimestamp(timestamp.to_string()))?;
    DateTime::from_timestamp(parsed.timestamp(), 0)
        .ok_or_else(|| HoloCoreError::InvalidTimestamp(timestamp.to_string()))
}

/// Parse an ISO 8601 duration as returned by the YouTube Data API (`PT1H2M3S`, `P1DT2H`, `P0D`)
pub fn parse_iso8601_duration(duration_str: &str) -> Result<TimeDelta> {
    let invalid = || HoloCoreError::InvalidDuration(duration_str.to_string());

    let body = duration_str.trim().strip_prefix('P').ok_or_else(invalid)?;
    if body.is_empty() {
        return Err(invalid());
    }

    let mut total_millis: i64 = 0;
    let mut current_number = String::new();
    let mut in_time_part = false;
    let mut saw_component = false;

    for ch in body.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
            continue;
        }

        if ch == 'T' {
            if in_time_part || !current_number.is_empty() {
                return Err(invalid());
            }
            in_time_part = true;
            continue;
        }

        if current_number.is_empty() {
            return Err(invalid());
        }

        let seconds_per_unit: f64 = match (ch, in_time_part) {
            ('W', false) => 7.0 * 86_400.0,
            ('D', false) => 86_400.0,
            ('H', true) => 3_600.0,
            ('M', true) => 60.0,
            ('S', true) => 1.0,
            _ => return Err(invalid()),
        };

        // Fractions are only meaningful on seconds
        if ch != 'S' && current_number.contains('.') {
            return Err(invalid());
        }

        let value: f64 = current_number.parse().map_err(|_| invalid())?;
        let millis = (value * seconds_per_unit * 1000.0).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 {
            return Err(invalid());
        }
        total_millis = total_millis.checked_add(millis as i64).ok_or_else(invalid)?;
        current_number.clear();
        saw_component = true;
    }

    if !current_number.is_empty() || !saw_component {
        return Err(invalid());
    }

    TimeDelta::try_milliseconds(total_millis).ok_or_else(invalid)
}

/// Format a duration as `HH:MM:SS`, folding days into the hour count
pub fn format_hms(duration: TimeDelta) -> String {
    let total_seconds = duration.num_seconds();
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.abs();

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
}

/// Parse an `H:M:S` string produced by [`format_hms`]
pub fn parse_hms(hms: &str) -> Result<TimeDelta> {
    let invalid = || HoloCoreError::InvalidDuration(hms.to_string());

    let trimmed = hms.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let hours: i64 = parts[0].parse().map_err(|_| invalid())?;
    let minutes: i64 = parts[1].parse().map_err(|_| invalid())?;
    let seconds: i64 = parts[2].parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 || hours < 0 || minutes < 0 || seconds < 0 {
        return Err(invalid());
    }

    let total = hours * 3600 + minutes * 60 + seconds;
    Ok(TimeDelta::seconds(if negative { -total } else { total }))
}

/// Serde adapter storing an optional duration as an `HH:MM:SS` cell (empty when absent)
pub mod hms_option {
    use super::{format_hms, parse_hms};
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&format_hms(*duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<TimeDelta>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.trim().is_empty() => parse_hms(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_youtube_durations() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S").unwrap(), TimeDelta::seconds(3723));
        assert_eq!(parse_iso8601_duration("PT59S").unwrap(), TimeDelta::seconds(59));
        assert_eq!(parse_iso8601_duration("PT10M").unwrap(), TimeDelta::seconds(600));
        assert_eq!(parse_iso8601_duration("P1DT2H").unwrap(), TimeDelta::seconds(93_600));
        assert_eq!(parse_iso8601_duration("P0D").unwrap(), TimeDelta::zero());
        assert_eq!(parse_iso8601_duration("PT1.5S").unwrap(), TimeDelta::milliseconds(1500));
    }

    #[test]
    fn test_reject_malformed_durations() {
        for bad in ["", "P", "PT", "1H", "PT5", "PTM", "P1M", "PT1.5M", "PT1HT2M"] {
            assert!(parse_iso8601_duration(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_reject_overflowing_durations() {
        for huge in [
            "P9999999999999999999DT9999999999999999999S",
            "PT9223372036854775807S",
            "P106751991167DT23H",
        ] {
            assert!(matches!(
                parse_iso8601_duration(huge),
                Err(HoloCoreError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_hms_round_trip() {
        let duration = TimeDelta::seconds(26 * 3600 + 5 * 60 + 9);
        let hms = format_hms(duration);
        assert_eq!(hms, "26:05:09");
        assert_eq!(parse_hms(&hms).unwrap(), duration);

        let negative = TimeDelta::seconds(-75);
        assert_eq!(format_hms(negative), "-00:01:15");
        assert_eq!(parse_hms("-00:01:15").unwrap(), negative);
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_rfc3339("2023-04-01T21:00:00.250+09:00").unwrap();
        assert_eq!(parsed, "2023-04-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(parse_rfc3339("yesterday").is_err());
    }

    #[test]
    fn test_parse_hms_rejects_garbage() {
        assert!(parse_hms("1:2").is_err());
        assert!(parse_hms("00:61:00").is_err());
        assert!(parse_hms("aa:bb:cc").is_err());
    }
}
