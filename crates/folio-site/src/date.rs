//! Publication date parsing and localized formatting.

use chrono::{DateTime, Locale, NaiveDate};

/// Parse a front matter date.
///
/// Accepts a calendar date (`2024-01-15`) or an RFC 3339 timestamp, whose
/// date part is used as written.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Format a date for display in the given locale.
#[must_use]
pub fn format_date(date: NaiveDate, locale: Locale) -> String {
    date.format_localized(display_pattern(locale), locale).to_string()
}

/// Long date pattern for a locale. Day-first unless the locale is known to
/// write the month first.
fn display_pattern(locale: Locale) -> &'static str {
    match locale {
        Locale::en_US | Locale::en_CA | Locale::en_PH => "%B %-d, %Y",
        Locale::de_DE
        | Locale::de_AT
        | Locale::de_CH
        | Locale::da_DK
        | Locale::fi_FI
        | Locale::nb_NO
        | Locale::cs_CZ => "%-d. %B %Y",
        Locale::es_ES | Locale::es_MX | Locale::pt_BR | Locale::pt_PT => "%-d de %B de %Y",
        Locale::ja_JP | Locale::zh_CN | Locale::zh_TW => "%Y年%-m月%-d日",
        Locale::ko_KR => "%Y년 %-m월 %-d일",
        _ => "%-d %B %Y",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_calendar_date() {
        assert_eq!(parse_date("2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_date(" 2024-01-15 "), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_parse_timestamp_uses_local_date() {
        assert_eq!(
            parse_date("2024-03-01T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_format_en_us() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        assert_eq!(format_date(date, Locale::en_US), "January 5, 2024");
    }

    #[test]
    fn test_format_localized() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(format_date(date, Locale::fr_FR), "9 mars 2024");
        assert_eq!(format_date(date, Locale::en_GB), "9 March 2024");
        assert_eq!(format_date(date, Locale::de_DE), "9. März 2024");
        assert_eq!(format_date(date, Locale::ja_JP), "2024年3月9日");
    }
}
