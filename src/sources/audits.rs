use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates;
use crate::error::Result;
use crate::identity::{canonical_email, is_email_like};
use crate::models::{Metric, Metrics, RawTable, SourceBatch, SourceKind, SourceRecord};
use crate::range::{self, DateRange};
use crate::reduce::Mean;
use crate::sources::{coerce_number, emails_in, optional_column, present, require_column};

const SOURCE: SourceKind = SourceKind::Audits;
pub const DATE_COLUMN: &str = "audit_date";
pub const AGENT_COLUMN: &str = "audited_agent";

#[derive(Debug, Default)]
struct AuditTotals {
    count: f64,
    score: Mean,
}

pub fn agent_emails(table: Option<&RawTable>) -> Vec<String> {
    emails_in(table, &[AGENT_COLUMN])
}

/// Only rows naming the audited agent by email are kept; placeholder names
/// such as `Unknown` never reach the matrix.
pub fn adapt(table: Option<&RawTable>, range: &DateRange) -> Result<SourceBatch> {
    let Some(table) = present(table, SOURCE) else {
        return Ok(SourceBatch::empty(SOURCE));
    };
    let agent_index = require_column(table, SOURCE, AGENT_COLUMN)?;
    let date_index = optional_column(table, SOURCE, DATE_COLUMN);
    let score_index = optional_column(table, SOURCE, "audit_score");
    let table = range::filter(table, DATE_COLUMN, range);

    let mut groups: BTreeMap<(String, NaiveDate), AuditTotals> = BTreeMap::new();
    let mut placeholders = 0usize;
    for row in &table.rows {
        let agent = RawTable::cell(row, Some(agent_index)).as_text();
        let Some(agent) = agent
            .filter(|a| is_email_like(a))
            .and_then(|a| canonical_email(&a))
        else {
            placeholders += 1;
            continue;
        };
        let Some(date) = dates::parse_cell(RawTable::cell(row, date_index)) else {
            continue;
        };
        let totals = groups.entry((agent, date)).or_default();
        totals.count += 1.0;
        totals.score.push(coerce_number(RawTable::cell(row, score_index)));
    }

    if placeholders > 0 {
        tracing::debug!(placeholders, "audit rows without an agent email");
    }

    let records: Vec<SourceRecord> = groups
        .into_iter()
        .map(|((agent, date), totals)| {
            let mut metrics = Metrics::default().with(Metric::Audits, totals.count);
            metrics.set(Metric::AuditScore, totals.score.value());
            SourceRecord {
                agent,
                date,
                metrics,
            }
        })
        .collect();

    tracing::info!(rows = table.len(), records = records.len(), "audits adapted");
    Ok(SourceBatch {
        source: SOURCE,
        records,
    })
}
