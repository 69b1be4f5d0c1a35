//! Date parsing into `YYYY-MM-DD`.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date in any accepted format. Time components are dropped.
pub fn parse(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Canonical text form of a date.
pub fn format(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Canonical form, or `None` if the value is not a date.
pub fn clean(raw: &str) -> Option<String> {
    parse(raw).map(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 14).unwrap();
        for raw in [
            "2023-03-14",
            " 2023/03/14 ",
            "03/14/2023",
            "14.03.2023",
            "2023-03-14 09:30:00",
            "2023-03-14T09:30:00",
        ] {
            assert_eq!(parse(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_rejects_invalid_dates() {
        assert_eq!(parse("2023-02-30"), None);
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean("03/14/2023").unwrap();
        assert_eq!(once, "2023-03-14");
        assert_eq!(clean(&once).unwrap(), once);
    }
}
