use chrono::NaiveDate;

use crate::dates;
use crate::error::{ConsolidateError, Result};
use crate::models::RawTable;

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ConsolidateError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// Keeps rows whose `date_column` parses to a date inside `range`.
/// Without that column there is nothing to constrain on and the table is
/// returned as is.
pub fn filter(table: &RawTable, date_column: &str, range: &DateRange) -> RawTable {
    let Some(index) = table.column_index(date_column) else {
        return table.clone();
    };

    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| {
            dates::parse_cell(RawTable::cell(row, Some(index)))
                .is_some_and(|date| range.contains(date))
        })
        .cloned()
        .collect();

    let dropped = table.len() - rows.len();
    if dropped > 0 {
        tracing::debug!(column = date_column, dropped, "rows outside range or undated");
    }

    RawTable::new(table.headers.clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated_table(values: &[&str]) -> RawTable {
        RawTable::new(
            vec!["date".to_string(), "agent_email".to_string()],
            values
                .iter()
                .map(|v| vec![Cell::text(*v), Cell::text("a@x.com")])
                .collect(),
        )
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(ymd(2025, 3, 10), ymd(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ConsolidateError::InvalidRange { .. }));
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(ymd(2025, 3, 1), ymd(2025, 3, 31)).unwrap();
        let table = dated_table(&["2025-02-28", "2025-03-01", "2025-03-15", "2025-03-31", "2025-04-01"]);
        let filtered = filter(&table, "date", &range);
        let kept: Vec<_> = filtered.rows.iter().map(|r| r[0].as_text().unwrap()).collect();
        assert_eq!(kept, vec!["2025-03-01", "2025-03-15", "2025-03-31"]);
    }

    #[test]
    fn unparseable_dates_are_dropped() {
        let range = DateRange::new(ymd(2025, 3, 1), ymd(2025, 3, 31)).unwrap();
        let table = dated_table(&["soon", "", "2025-03-02"]);
        assert_eq!(filter(&table, "date", &range).len(), 1);
    }

    #[test]
    fn missing_column_returns_input() {
        let range = DateRange::new(ymd(2025, 3, 1), ymd(2025, 3, 31)).unwrap();
        let table = dated_table(&["2024-01-01"]);
        assert_eq!(filter(&table, "reference_date", &range), table);
    }

    #[test]
    fn single_day_range() {
        let range = DateRange::new(ymd(2025, 3, 3), ymd(2025, 3, 3)).unwrap();
        assert_eq!(range.days(), 1);
        assert!(range.contains(ymd(2025, 3, 3)));
        assert!(!range.contains(ymd(2025, 3, 2)));
    }
}
