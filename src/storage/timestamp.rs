//! Capture timestamps used as log document keys.

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Key format, e.g. `2024-05-01 13:45:12.004521`.
pub const KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current local time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Format a capture time as a document key.
pub fn format_key(at: NaiveDateTime) -> String {
    at.format(KEY_FORMAT).to_string()
}

/// First key at or after `at` (in microsecond steps) rejected by `taken`.
pub fn unique_key(at: NaiveDateTime, taken: impl Fn(&str) -> bool) -> String {
    let mut at = at;
    loop {
        let key = format_key(at);
        if !taken(&key) {
            return key;
        }
        at += TimeDelta::microseconds(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(13, 45, 12, 4521)
            .unwrap()
    }

    #[test]
    fn test_key_has_microsecond_precision() {
        assert_eq!(format_key(sample()), "2024-05-01 13:45:12.004521");
    }

    #[test]
    fn test_parse_back_with_same_format() {
        let key = format_key(sample());
        let parsed = NaiveDateTime::parse_from_str(&key, KEY_FORMAT).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_unique_key_skips_taken_keys() {
        let taken = ["2024-05-01 13:45:12.004521", "2024-05-01 13:45:12.004522"];
        let key = unique_key(sample(), |k| taken.contains(&k));
        assert_eq!(key, "2024-05-01 13:45:12.004523");
    }
}
