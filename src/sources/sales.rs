use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::dates;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::models::{Cell, Metric, Metrics, RawTable, SourceBatch, SourceKind, SourceRecord};
use crate::range::{self, DateRange};
use crate::sources::{coerce_amount, emails_in, optional_column, present, require_column};

const SOURCE: SourceKind = SourceKind::Sales;
pub const DATE_COLUMN: &str = "date";
pub const AGENT_COLUMN: &str = "agent_email";

struct SalesColumns {
    date: Option<usize>,
    agent: usize,
    price: Option<usize>,
    product: Option<usize>,
}

impl SalesColumns {
    fn bind(table: &RawTable) -> Result<Self> {
        Ok(Self {
            agent: require_column(table, SOURCE, AGENT_COLUMN)?,
            date: optional_column(table, SOURCE, DATE_COLUMN),
            price: optional_column(table, SOURCE, "price"),
            product: optional_column(table, SOURCE, "product_name"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductLine {
    Shared,
    Exclusive,
    Other,
}

struct SaleRow {
    date: Option<NaiveDate>,
    agent: Option<String>,
    amount: f64,
    line: ProductLine,
}

impl SaleRow {
    fn read(row: &[Cell], columns: &SalesColumns, config: &PipelineConfig) -> Self {
        let product = RawTable::cell(row, columns.product)
            .as_text()
            .map(|p| p.to_lowercase());
        let line = match product {
            Some(p) if p == config.shared_product.trim().to_lowercase() => ProductLine::Shared,
            Some(p) if p == config.exclusive_product.trim().to_lowercase() => ProductLine::Exclusive,
            _ => ProductLine::Other,
        };
        Self {
            date: dates::parse_cell(RawTable::cell(row, columns.date)),
            agent: RawTable::cell(row, Some(columns.agent)).as_text(),
            amount: coerce_amount(RawTable::cell(row, columns.price)),
            line,
        }
    }
}

#[derive(Debug, Default)]
struct SalesTotals {
    total: f64,
    shared: f64,
    exclusive: f64,
}

pub fn agent_emails(table: Option<&RawTable>) -> Vec<String> {
    emails_in(table, &[AGENT_COLUMN])
}

pub fn adapt(
    table: Option<&RawTable>,
    range: &DateRange,
    resolver: &IdentityResolver,
    config: &PipelineConfig,
) -> Result<SourceBatch> {
    let Some(table) = present(table, SOURCE) else {
        return Ok(SourceBatch::empty(SOURCE));
    };
    let columns = SalesColumns::bind(table)?;
    let table = range::filter(table, DATE_COLUMN, range);

    let mut groups: BTreeMap<(String, NaiveDate), SalesTotals> = BTreeMap::new();
    let mut unresolved = 0usize;
    for row in &table.rows {
        let sale = SaleRow::read(row, &columns, config);
        let Some(date) = sale.date else {
            continue;
        };
        let Some(agent) = sale.agent.as_deref().and_then(|a| resolver.resolve(a)) else {
            unresolved += 1;
            continue;
        };
        let totals = groups.entry((agent, date)).or_default();
        totals.total += sale.amount;
        match sale.line {
            ProductLine::Shared => totals.shared += sale.amount,
            ProductLine::Exclusive => totals.exclusive += sale.amount,
            ProductLine::Other => {}
        }
    }

    if unresolved > 0 {
        tracing::debug!(unresolved, "sales rows without a resolvable agent");
    }

    let records: Vec<SourceRecord> = groups
        .into_iter()
        .map(|((agent, date), totals)| SourceRecord {
            agent,
            date,
            metrics: Metrics::default()
                .with(Metric::SalesTotal, totals.total)
                .with(Metric::SalesShared, totals.shared)
                .with(Metric::SalesExclusive, totals.exclusive),
        })
        .collect();

    tracing::info!(rows = table.len(), records = records.len(), "sales adapted");
    Ok(SourceBatch {
        source: SOURCE,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsolidateError;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn table(rows: &[[&str; 4]]) -> RawTable {
        RawTable::new(
            ["date", "agent_email", "product_name", "price"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
                .collect(),
        )
    }

    #[test]
    fn splits_shared_and_exclusive_totals() {
        let sales = table(&[
            ["2025-03-03", "a@x.com", "van_exclusive", "$1,200"],
            ["2025-03-03", "A@X.com", "VAN_COMPARTIDA ", "$800"],
        ]);
        let batch = adapt(
            Some(&sales),
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(batch.records.len(), 1);
        let metrics = &batch.records[0].metrics;
        assert_eq!(batch.records[0].agent, "a@x.com");
        assert_eq!(metrics.get(Metric::SalesTotal), Some(2000.0));
        assert_eq!(metrics.get(Metric::SalesExclusive), Some(1200.0));
        assert_eq!(metrics.get(Metric::SalesShared), Some(800.0));
    }

    #[test]
    fn unmatched_products_count_toward_total_only() {
        let sales = table(&[["2025-03-04", "a@x.com", "airport_transfer", "500"]]);
        let batch = adapt(
            Some(&sales),
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap();
        let metrics = &batch.records[0].metrics;
        assert_eq!(metrics.get(Metric::SalesTotal), Some(500.0));
        assert_eq!(metrics.get(Metric::SalesShared), Some(0.0));
        assert_eq!(metrics.get(Metric::SalesExclusive), Some(0.0));
    }

    #[test]
    fn drops_out_of_range_and_undated_rows() {
        let sales = table(&[
            ["2025-02-28", "a@x.com", "van_exclusive", "100"],
            ["", "a@x.com", "van_exclusive", "100"],
            ["2025-03-31", "a@x.com", "van_exclusive", "100"],
        ]);
        let batch = adapt(
            Some(&sales),
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn missing_source_is_empty() {
        let batch = adapt(
            None,
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert!(batch.records.is_empty());
    }

    #[test]
    fn missing_agent_column_is_fatal() {
        let sales = RawTable::new(
            vec!["date".to_string()],
            vec![vec![Cell::text("2025-03-03")]],
        );
        let err = adapt(
            Some(&sales),
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConsolidateError::MissingColumn { column: "agent_email", .. }));
    }
}
