//! Date and datetime wire formats used by the Wahoo API.
//!
//! Timestamps (`created_at`, `updated_at`, `starts`) travel as
//! `2019-02-11T20:46:27.000Z`; birth dates travel as `1985-06-15`. Form
//! encoders and tolerant decoders both go through this module so the two
//! directions cannot drift apart.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Date-only format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a full timestamp. Accepts any RFC 3339 value, which covers the
/// millisecond `Z`-suffixed shape the API emits.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp with millisecond precision and a `Z` suffix.
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}

pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn parses_api_timestamp() {
        let dt = parse_datetime("2019-02-11T20:46:27.000Z").unwrap();
        assert_eq!(dt.year(), 2019);
        assert_eq!(dt.month(), 2);
        assert_eq!(dt.hour(), 20);
        assert_eq!(dt.second(), 27);
    }

    #[test]
    fn formats_timestamp_with_millis() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_datetime(dt), "2020-01-02T03:04:05.000Z");
    }

    #[test]
    fn date_only_round_trips() {
        let date = parse_date("1985-06-15").unwrap();
        assert_eq!(format_date(date), "1985-06-15");
    }

    #[test]
    fn rejects_datetime_for_date_only() {
        assert!(parse_date("1985-06-15T00:00:00.000Z").is_err());
        assert!(parse_datetime("1985-06-15").is_err());
    }
}
