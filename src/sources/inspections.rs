use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::models::{Metric, Metrics, RawTable, SourceBatch, SourceKind, SourceRecord};
use crate::range::{self, DateRange};
use crate::sources::{coerce_number, emails_in, optional_column, present, require_column};

const SOURCE: SourceKind = SourceKind::Inspections;
pub const DATE_COLUMN: &str = "date";
pub const AGENT_COLUMN: &str = "agent_email";

pub fn agent_emails(table: Option<&RawTable>) -> Vec<String> {
    emails_in(table, &[AGENT_COLUMN])
}

pub fn adapt(
    table: Option<&RawTable>,
    range: &DateRange,
    resolver: &IdentityResolver,
) -> Result<SourceBatch> {
    let Some(table) = present(table, SOURCE) else {
        return Ok(SourceBatch::empty(SOURCE));
    };
    let agent_index = require_column(table, SOURCE, AGENT_COLUMN)?;
    let date_index = optional_column(table, SOURCE, DATE_COLUMN);
    let count_index = optional_column(table, SOURCE, "inspection_count");
    let table = range::filter(table, DATE_COLUMN, range);

    let mut groups: BTreeMap<(String, NaiveDate), f64> = BTreeMap::new();
    for row in &table.rows {
        let Some(date) = dates::parse_cell(RawTable::cell(row, date_index)) else {
            continue;
        };
        let Some(agent) = RawTable::cell(row, Some(agent_index))
            .as_text()
            .and_then(|a| resolver.resolve(&a))
        else {
            continue;
        };
        let count = coerce_number(RawTable::cell(row, count_index)).unwrap_or(0.0);
        *groups.entry((agent, date)).or_default() += count;
    }

    let records: Vec<SourceRecord> = groups
        .into_iter()
        .map(|((agent, date), count)| SourceRecord {
            agent,
            date,
            metrics: Metrics::default().with(Metric::Inspections, count),
        })
        .collect();

    tracing::info!(rows = table.len(), records = records.len(), "inspections adapted");
    Ok(SourceBatch {
        source: SOURCE,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    #[test]
    fn sums_counts_per_agent_and_day() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap();
        let table = RawTable::new(
            vec![
                "date".to_string(),
                "agent_email".to_string(),
                "inspection_count".to_string(),
            ],
            vec![
                vec![Cell::text("03-03-2025"), Cell::text("c@x.com"), Cell::Number(2.0)],
                vec![Cell::text("03-03-2025"), Cell::text("c@x.com"), Cell::text("3")],
                vec![Cell::text("03-03-2025"), Cell::text("c@x.com"), Cell::text("?")],
            ],
        );
        let batch = adapt(Some(&table), &range, &IdentityResolver::default()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].metrics.get(Metric::Inspections), Some(5.0));
    }

    #[test]
    fn absent_inspections_are_fine() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
        .unwrap();
        let batch = adapt(None, &range, &IdentityResolver::default()).unwrap();
        assert!(batch.records.is_empty());
    }
}
