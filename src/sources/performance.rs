use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::dates;
use crate::error::{ConsolidateError, Result};
use crate::identity::IdentityResolver;
use crate::models::{Cell, Metric, Metrics, RawTable, SourceBatch, SourceKind, SourceRecord};
use crate::range::{self, DateRange};
use crate::reduce::Mean;
use crate::sources::{coerce_number, emails_in, optional_column, present};

const SOURCE: SourceKind = SourceKind::Performance;
pub const DATE_COLUMN: &str = "reference_date";
pub const EMAIL_COLUMN: &str = "assignee_email";
pub const NAME_COLUMN: &str = "assignee_name";

const RATE_COLUMNS: [(&str, Metric); 6] = [
    ("csat", Metric::Csat),
    ("nps", Metric::Nps),
    ("first_response_hours", Metric::FirstResponseHours),
    ("first_response_pct", Metric::FirstResponsePct),
    ("resolution_hours", Metric::ResolutionHours),
    ("resolution_pct", Metric::ResolutionPct),
];

struct PerformanceColumns {
    service_group: Option<usize>,
    date: Option<usize>,
    email: Option<usize>,
    name: Option<usize>,
    status: Option<usize>,
    reopens: Option<usize>,
    rates: [Option<usize>; 6],
}

impl PerformanceColumns {
    fn bind(table: &RawTable) -> Result<Self> {
        let email = table.column_index(EMAIL_COLUMN);
        let name = table.column_index(NAME_COLUMN);
        if email.is_none() && name.is_none() {
            return Err(ConsolidateError::MissingColumn {
                report: SOURCE,
                column: EMAIL_COLUMN,
            });
        }
        Ok(Self {
            service_group: optional_column(table, SOURCE, "service_group"),
            date: optional_column(table, SOURCE, DATE_COLUMN),
            email,
            name,
            status: optional_column(table, SOURCE, "status"),
            reopens: optional_column(table, SOURCE, "reopens"),
            rates: RATE_COLUMNS.map(|(column, _)| optional_column(table, SOURCE, column)),
        })
    }
}

struct TicketRow {
    service_group: Option<String>,
    date: Option<NaiveDate>,
    email: Option<String>,
    name: Option<String>,
    solved: bool,
    reopens: f64,
    rates: [Option<f64>; 6],
}

impl TicketRow {
    fn read(row: &[Cell], columns: &PerformanceColumns, config: &PipelineConfig) -> Self {
        let status = RawTable::cell(row, columns.status).as_text();
        Self {
            service_group: RawTable::cell(row, columns.service_group).as_text(),
            date: dates::parse_cell(RawTable::cell(row, columns.date)),
            email: RawTable::cell(row, columns.email).as_text(),
            name: RawTable::cell(row, columns.name).as_text(),
            solved: status.is_some_and(|s| s.eq_ignore_ascii_case(config.resolved_status.trim())),
            reopens: coerce_number(RawTable::cell(row, columns.reopens)).unwrap_or(0.0),
            rates: columns.rates.map(|index| coerce_number(RawTable::cell(row, index))),
        }
    }

    /// A survey was answered when either CSAT or NPS came back.
    fn has_survey(&self) -> bool {
        self.rates[0].is_some() || self.rates[1].is_some()
    }
}

#[derive(Debug, Default)]
struct TicketTotals {
    surveys: f64,
    tickets: f64,
    resolved: f64,
    reopens: f64,
    rates: [Mean; 6],
}

pub fn agent_emails(table: Option<&RawTable>) -> Vec<String> {
    emails_in(table, &[EMAIL_COLUMN])
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
    let columns = PerformanceColumns::bind(table)?;
    let table = range::filter(table, DATE_COLUMN, range);

    let mut groups: BTreeMap<(String, NaiveDate), TicketTotals> = BTreeMap::new();
    let mut other_groups = 0usize;
    let mut unresolved = 0usize;
    for row in &table.rows {
        let ticket = TicketRow::read(row, &columns, config);
        if ticket.service_group.as_deref() != Some(config.service_group.as_str()) {
            other_groups += 1;
            continue;
        }
        let Some(date) = ticket.date else {
            continue;
        };
        let Some(agent) = resolver.resolve_parts(ticket.email.as_deref(), ticket.name.as_deref())
        else {
            unresolved += 1;
            continue;
        };

        let totals = groups.entry((agent, date)).or_default();
        totals.tickets += 1.0;
        if ticket.has_survey() {
            totals.surveys += 1.0;
        }
        if ticket.solved {
            totals.resolved += 1.0;
        }
        totals.reopens += ticket.reopens;
        for (mean, value) in totals.rates.iter_mut().zip(ticket.rates) {
            mean.push(value);
        }
    }

    tracing::debug!(other_groups, unresolved, "performance rows dropped");

    let records: Vec<SourceRecord> = groups
        .into_iter()
        .map(|((agent, date), totals)| {
            let mut metrics = Metrics::default()
                .with(Metric::Surveys, totals.surveys)
                .with(Metric::Tickets, totals.tickets)
                .with(Metric::TicketsResolved, totals.resolved)
                .with(Metric::Reopens, totals.reopens);
            for ((_, metric), mean) in RATE_COLUMNS.iter().zip(totals.rates.iter()) {
                metrics.set(*metric, mean.value());
            }
            SourceRecord {
                agent,
                date,
                metrics,
            }
        })
        .collect();

    tracing::info!(rows = table.len(), records = records.len(), "performance adapted");
    Ok(SourceBatch {
        source: SOURCE,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 9] = [
        "service_group",
        "reference_date",
        "assignee_email",
        "assignee_name",
        "csat",
        "nps",
        "status",
        "reopens",
        "first_response_hours",
    ];

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn table(rows: &[[&str; 9]]) -> RawTable {
        RawTable::new(
            HEADERS.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
                .collect(),
        )
    }

    fn run(table: &RawTable, resolver: &IdentityResolver) -> SourceBatch {
        adapt(Some(table), &range(), resolver, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn aggregates_tickets_per_agent_and_day() {
        let perf = table(&[
            ["C_Ops Support", "2025-03-03", "a@x.com", "", "5", "9", "Solved", "0", "2"],
            ["C_Ops Support", "2025-03-03", "a@x.com", "", "3", "", "open", "1", "4"],
            ["C_Ops Support", "2025-03-03", "a@x.com", "", "", "", "SOLVED", "", ""],
        ]);
        let batch = run(&perf, &IdentityResolver::default());
        assert_eq!(batch.records.len(), 1);
        let m = &batch.records[0].metrics;
        assert_eq!(m.get(Metric::Tickets), Some(3.0));
        assert_eq!(m.get(Metric::Surveys), Some(2.0));
        assert_eq!(m.get(Metric::TicketsResolved), Some(2.0));
        assert_eq!(m.get(Metric::Reopens), Some(1.0));
        assert_eq!(m.get(Metric::Csat), Some(4.0));
        assert_eq!(m.get(Metric::Nps), Some(9.0));
        assert_eq!(m.get(Metric::FirstResponseHours), Some(3.0));
        assert_eq!(m.get(Metric::ResolutionPct), None);
    }

    #[test]
    fn other_service_groups_are_excluded() {
        let perf = table(&[["Other_Team", "2025-03-03", "a@x.com", "", "5", "9", "solved", "0", "1"]]);
        assert!(run(&perf, &IdentityResolver::default()).records.is_empty());
    }

    #[test]
    fn falls_back_to_name_resolution() {
        let perf = table(&[["C_Ops Support", "2025-03-03", "", "ANA PEREZ", "4", "", "solved", "0", ""]]);
        let resolver = IdentityResolver::from_emails(["ana.perez@x.com"]);
        let batch = run(&perf, &resolver);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].agent, "ana.perez@x.com");
    }

    #[test]
    fn unresolvable_names_are_dropped() {
        let perf = table(&[["C_Ops Support", "2025-03-03", "", "Nobody", "4", "", "solved", "0", ""]]);
        assert!(run(&perf, &IdentityResolver::default()).records.is_empty());
    }

    #[test]
    fn missing_rate_columns_degrade_to_null() {
        let perf = RawTable::new(
            vec![
                "service_group".to_string(),
                "reference_date".to_string(),
                "assignee_email".to_string(),
            ],
            vec![vec![
                Cell::text("C_Ops Support"),
                Cell::text("2025-03-05"),
                Cell::text("a@x.com"),
            ]],
        );
        let batch = run(&perf, &IdentityResolver::default());
        let m = &batch.records[0].metrics;
        assert_eq!(m.get(Metric::Tickets), Some(1.0));
        assert_eq!(m.get(Metric::Surveys), Some(0.0));
        assert_eq!(m.get(Metric::TicketsResolved), Some(0.0));
        assert_eq!(m.get(Metric::Csat), None);
    }

    #[test]
    fn missing_service_group_column_yields_nothing() {
        let perf = RawTable::new(
            vec!["reference_date".to_string(), "assignee_email".to_string()],
            vec![vec![Cell::text("2025-03-05"), Cell::text("a@x.com")]],
        );
        assert!(run(&perf, &IdentityResolver::default()).records.is_empty());
    }

    #[test]
    fn missing_identity_columns_are_fatal() {
        let perf = RawTable::new(
            vec!["service_group".to_string()],
            vec![vec![Cell::text("C_Ops Support")]],
        );
        let err = adapt(
            Some(&perf),
            &range(),
            &IdentityResolver::default(),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConsolidateError::MissingColumn { .. }));
    }
}
