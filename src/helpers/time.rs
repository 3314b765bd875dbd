use chrono::{DateTime, NaiveDateTime, Utc};

const ECOBEE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an ecobee `YYYY-MM-DD HH:MM:SS` timestamp. Returns `None` on any
/// malformed input; callers skip the affected metrics rather than guessing.
pub fn parse_ecobee_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, ECOBEE_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_timestamp() {
        let parsed = parse_ecobee_time("2024-03-01 12:05:00").unwrap();
        assert_eq!(parsed.timestamp(), 1709294700);
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(parse_ecobee_time("not a timestamp").is_none());
        assert!(parse_ecobee_time("2024-03-01T12:05:00Z").is_none());
    }
}
