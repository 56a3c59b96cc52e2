use std::ops::Index;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ISO_STAMP: Regex = Regex::new(
        r#"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2})(?::([0-9]{2}))?(?:Z|[+-][0-9]{2}:[0-9]{2})?$"#
    ).unwrap();
    static ref UTC_OFFSET: Regex = Regex::new(r#"^([+-])([0-9]{2}):?([0-9]{2})$"#).unwrap();
}

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Zone used to read calendar fields out of timestamps that are not strict ISO.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackZone {
    Local,
    Fixed(FixedOffset),
}

impl FallbackZone {
    fn wall_clock(&self, instant: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            FallbackZone::Local => instant.with_timezone(&Local).naive_local(),
            FallbackZone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }
}

/// Calendar fields copied verbatim out of the timestamp text.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalStamp {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
}

impl LexicalStamp {
    pub fn file_stem(&self) -> String {
        format!("{}{}{}-{}{}", self.year, self.month, self.day, self.hour, self.minute)
    }
}

/// Matches `YYYY-MM-DDTHH:MM[:SS][Z|±HH:MM]` and keeps the fields as written,
/// without any timezone conversion.
pub fn parse_iso_lexical(buf: &str) -> Option<LexicalStamp> {
    let caps = ISO_STAMP.captures(buf.trim())?;

    Some(LexicalStamp {
        year: caps.index(1).to_string(),
        month: caps.index(2).to_string(),
        day: caps.index(3).to_string(),
        hour: caps.index(4).to_string(),
        minute: caps.index(5).to_string(),
    })
}

fn normalize_zulu(buf: &str) -> String {
    match buf.strip_suffix('Z').or_else(|| buf.strip_suffix('z')) {
        Some(rest) => format!("{}+00:00", rest),
        None => buf.to_string(),
    }
}

/// Lenient parser for anything that is not strict ISO. Returns the wall-clock time in `zone`.
///
/// Timestamps carrying an offset are converted into `zone`. Naive timestamps are taken as
/// wall-clock time already in `zone`. A bare `YYYY-MM-DD` is midnight UTC.
pub fn parse_general(buf: &str, zone: &FallbackZone) -> Option<NaiveDateTime> {
    let buf = buf.trim();
    if buf.is_empty() {
        return None;
    }

    let normalized = normalize_zulu(buf);
    for fmt in OFFSET_FORMATS.iter() {
        if let Ok(instant) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(zone.wall_clock(&instant));
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc2822(buf) {
        return Some(zone.wall_clock(&instant));
    }

    for fmt in NAIVE_FORMATS.iter() {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(buf, fmt) {
            return Some(date_time);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(buf, "%Y-%m-%d") {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        return Some(zone.wall_clock(&midnight.fixed_offset()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(buf, "%Y/%m/%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }

    None
}

pub fn format_file_stem(date_time: &NaiveDateTime) -> String {
    date_time.format("%Y%m%d-%H%M").to_string()
}

/// Parses `+09:00`, `-0330`, `Z` or `UTC`.
pub fn parse_utc_offset(buf: &str) -> Result<FixedOffset, String> {
    let buf = buf.trim();
    if buf == "Z" || buf.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| format!("Invalid UTC offset {}", buf));
    }

    let Some(caps) = UTC_OFFSET.captures(buf) else {
        return Err(format!("Unable to parse UTC offset {}", buf));
    };

    let hours: i32 = caps.index(2).parse().map_err(|_| format!("Invalid hours in offset {}", buf))?;
    let minutes: i32 = caps.index(3).parse().map_err(|_| format!("Invalid minutes in offset {}", buf))?;
    let seconds = hours * 3600 + minutes * 60;
    let offset = match caps.index(1) {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    };

    offset.ok_or_else(|| format!("UTC offset out of range: {}", buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo() -> FallbackZone {
        FallbackZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap())
    }

    #[test]
    fn test_parse_iso_lexical() {
        let stamp = parse_iso_lexical("2025-08-19T13:30:00+09:00").unwrap();
        assert_eq!(stamp.file_stem(), "20250819-1330");

        let stamp = parse_iso_lexical("  2025-08-19T13:30Z ").unwrap();
        assert_eq!(stamp.file_stem(), "20250819-1330");

        let stamp = parse_iso_lexical("2025-12-31T23:59").unwrap();
        assert_eq!(stamp.year, "2025");
        assert_eq!(stamp.minute, "59");
    }

    #[test]
    fn test_parse_iso_lexical_rejects_non_strict() {
        assert!(parse_iso_lexical("2025-08-19T13:30:00.000Z").is_none());
        assert!(parse_iso_lexical("2025-08-19 13:30").is_none());
        assert!(parse_iso_lexical("2025-08-19").is_none());
        assert!(parse_iso_lexical("yesterday").is_none());
    }

    #[test]
    fn test_parse_iso_lexical_ascii_digits_only() {
        // Full-width and Arabic-Indic digits are not ISO 8601
        assert!(parse_iso_lexical("２０２５-０８-１９T１３:３０").is_none());
        assert!(parse_iso_lexical("٢٠٢٥-٠٨-١٩T١٣:٣٠").is_none());
        assert!(parse_iso_lexical("2025-08-19T13:30+０９:００").is_none());
        assert!(parse_general("２０２５-０８-１９T１３:３０", &tokyo()).is_none());
        assert!(parse_utc_offset("+０９:００").is_err());
    }

    #[test]
    fn test_parse_general_converts_offsets() {
        let zone = tokyo();
        let date_time = parse_general("2025-08-19T04:30:00.000Z", &zone).unwrap();
        assert_eq!(format_file_stem(&date_time), "20250819-1330");

        let date_time = parse_general("Tue, 19 Aug 2025 06:30:00 +0200", &zone).unwrap();
        assert_eq!(format_file_stem(&date_time), "20250819-1330");
    }

    #[test]
    fn test_parse_general_naive_and_date_only() {
        let zone = tokyo();
        let date_time = parse_general("2025-08-19 13:30:15", &zone).unwrap();
        assert_eq!(format_file_stem(&date_time), "20250819-1330");

        let date_time = parse_general("2025/08/19 07:05", &zone).unwrap();
        assert_eq!(format_file_stem(&date_time), "20250819-0705");

        // Date only is midnight UTC, which is 09:00 in Tokyo
        let date_time = parse_general("2025-08-19", &zone).unwrap();
        assert_eq!(format_file_stem(&date_time), "20250819-0900");
    }

    #[test]
    fn test_parse_general_garbage() {
        assert!(parse_general("", &tokyo()).is_none());
        assert!(parse_general("not a date", &tokyo()).is_none());
        assert!(parse_general("2025-13-45 10:00", &tokyo()).is_none());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+09:00").unwrap(), FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(parse_utc_offset("-0330").unwrap(), FixedOffset::west_opt(3 * 3600 + 1800).unwrap());
        assert_eq!(parse_utc_offset("UTC").unwrap(), FixedOffset::east_opt(0).unwrap());
        assert!(parse_utc_offset("Tokyo").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
    }
}
