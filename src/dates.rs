use chrono::{DateTime, Days, NaiveDate};

use crate::models::Cell;

const SERIAL_THRESHOLD: f64 = 30_000.0;
// 9999-12-31 in spreadsheet serial days.
const SERIAL_CEILING: f64 = 2_958_466.0;

type Strategy = fn(&str) -> Option<NaiveDate>;

/// Tried in order; the first `Some` wins. Ambiguous day/month input is settled
/// by this order: `03/04/2025` is March 4th, `13/04/2025` falls through to the
/// day-first fallback.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("serial", serial_text),
    ("year_first_slash", year_first_slash),
    ("day_first_dash", day_first_dash),
    ("month_first_slash", month_first_slash),
    ("fallback", fallback),
];

const FALLBACK_TOKEN_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y%m%d"];

const FALLBACK_FULL_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

pub fn parse_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Number(value) => from_serial(*value).or_else(|| parse_str(&cell.as_text()?)),
        Cell::Text(text) => parse_str(text),
    }
}

pub fn parse_str(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let parsed = strategy(value);
        if parsed.is_some() {
            tracing::trace!(value, strategy = *name, "parsed date");
        }
        parsed
    })
}

pub fn from_serial(value: f64) -> Option<NaiveDate> {
    if !(value > SERIAL_THRESHOLD && value < SERIAL_CEILING) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(value.floor() as u64))
}

/// Calendar part of a value that may carry a time of day.
fn date_token(value: &str) -> &str {
    value
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(value)
}

fn serial_text(value: &str) -> Option<NaiveDate> {
    value.parse::<f64>().ok().and_then(from_serial)
}

fn year_first_slash(value: &str) -> Option<NaiveDate> {
    let token = date_token(value);
    let parts: Vec<&str> = token.split('/').collect();
    if parts.len() != 3 || parts[0].len() != 4 {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y/%m/%d").ok()
}

fn day_first_dash(value: &str) -> Option<NaiveDate> {
    let token = date_token(value);
    let parts: Vec<&str> = token.split('-').collect();
    if parts.len() != 3 || parts[2].len() != 4 || parts[0].len() > 2 {
        return None;
    }
    NaiveDate::parse_from_str(token, "%d-%m-%Y").ok()
}

fn month_first_slash(value: &str) -> Option<NaiveDate> {
    let token = date_token(value);
    let parts: Vec<&str> = token.split('/').collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    NaiveDate::parse_from_str(token, "%m/%d/%Y").ok()
}

fn fallback(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    let token = date_token(value);
    FALLBACK_TOKEN_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
        .or_else(|| {
            FALLBACK_FULL_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_spreadsheet_serials() {
        assert_eq!(parse_cell(&Cell::Number(45719.0)), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_cell(&Cell::Number(45719.75)), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("45719"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_cell(&Cell::Number(1200.0)), None);
    }

    #[test]
    fn large_integers_are_not_serials() {
        assert_eq!(parse_cell(&Cell::Number(20250303.0)), Some(ymd(2025, 3, 3)));
    }

    #[test]
    fn explicit_patterns() {
        assert_eq!(parse_str("2025/03/04"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_str("04-03-2025"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_str("03/04/2025"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_str("3/4/2025"), Some(ymd(2025, 3, 4)));
    }

    #[test]
    fn ambiguous_slash_dates_prefer_month_first() {
        assert_eq!(parse_str("03/04/2025"), Some(ymd(2025, 3, 4)));
        assert_eq!(parse_str("13/04/2025"), Some(ymd(2025, 4, 13)));
    }

    #[test]
    fn time_of_day_is_discarded() {
        assert_eq!(parse_str("2025-03-03 17:45:00"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("2025-03-03T08:00:00"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("2025-03-03T23:30:00-03:00"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("2025/03/03 10:12"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("03-03-2025 10:12:00"), Some(ymd(2025, 3, 3)));
    }

    #[test]
    fn fallback_formats() {
        assert_eq!(parse_str("2025-03-03"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("03.03.2025"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("March 3, 2025"), Some(ymd(2025, 3, 3)));
        assert_eq!(parse_str("3 Mar 2025"), Some(ymd(2025, 3, 3)));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_str(""), None);
        assert_eq!(parse_str("not a date"), None);
        assert_eq!(parse_str("2025/13/40"), None);
        assert_eq!(parse_cell(&Cell::Empty), None);
    }
}
