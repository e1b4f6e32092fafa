use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Sales,
    Performance,
    Audits,
    Inspections,
    Roster,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sales => "sales",
            Self::Performance => "performance",
            Self::Audits => "audits",
            Self::Inspections => "inspections",
            Self::Roster => "roster",
        };
        f.write_str(name)
    }
}

/// A single cell as handed over by the I/O layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// Trimmed textual content, `None` for blanks.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            Self::Number(v) => Some(v.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Headers plus rows, exactly as decoded. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell<'a>(row: &'a [Cell], index: Option<usize>) -> &'a Cell {
        index.and_then(|i| row.get(i)).unwrap_or(&EMPTY_CELL)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricClass {
    /// Counts and amounts: zero-filled, summed.
    Additive,
    /// Averages: null-preserving, mean of the non-null values.
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Surveys,
    Nps,
    Csat,
    FirstResponseHours,
    FirstResponsePct,
    ResolutionHours,
    ResolutionPct,
    Reopens,
    Tickets,
    TicketsResolved,
    Audits,
    AuditScore,
    SalesTotal,
    SalesShared,
    SalesExclusive,
    Inspections,
}

pub const METRIC_COUNT: usize = 16;

impl Metric {
    /// Output column order.
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::Surveys,
        Metric::Nps,
        Metric::Csat,
        Metric::FirstResponseHours,
        Metric::FirstResponsePct,
        Metric::ResolutionHours,
        Metric::ResolutionPct,
        Metric::Reopens,
        Metric::Tickets,
        Metric::TicketsResolved,
        Metric::Audits,
        Metric::AuditScore,
        Metric::SalesTotal,
        Metric::SalesShared,
        Metric::SalesExclusive,
        Metric::Inspections,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn class(self) -> MetricClass {
        match self {
            Metric::Nps
            | Metric::Csat
            | Metric::FirstResponseHours
            | Metric::FirstResponsePct
            | Metric::ResolutionHours
            | Metric::ResolutionPct
            | Metric::AuditScore => MetricClass::Rate,
            _ => MetricClass::Additive,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Metric::Surveys => "surveys",
            Metric::Nps => "nps",
            Metric::Csat => "csat",
            Metric::FirstResponseHours => "first_response_hours",
            Metric::FirstResponsePct => "first_response_pct",
            Metric::ResolutionHours => "resolution_hours",
            Metric::ResolutionPct => "resolution_pct",
            Metric::Reopens => "reopens",
            Metric::Tickets => "tickets",
            Metric::TicketsResolved => "tickets_resolved",
            Metric::Audits => "audits",
            Metric::AuditScore => "audit_score",
            Metric::SalesTotal => "sales_total",
            Metric::SalesShared => "sales_shared",
            Metric::SalesExclusive => "sales_exclusive",
            Metric::Inspections => "inspections",
        }
    }
}

/// Metric values for one (agent, date). `None` means no source reported it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    values: [Option<f64>; METRIC_COUNT],
}

impl Metrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    /// Folds another source's contribution into this one.
    ///
    /// Additive values add up. Rate values keep the first reported value;
    /// sources report disjoint rate columns, so a rate is never reported twice.
    pub fn absorb(&mut self, other: &Metrics) {
        for metric in Metric::ALL {
            let mine = self.get(metric);
            let theirs = other.get(metric);
            let merged = match metric.class() {
                MetricClass::Additive => match (mine, theirs) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                },
                MetricClass::Rate => mine.or(theirs),
            };
            self.set(metric, merged);
        }
    }

    pub fn fill_additive(&mut self) {
        for metric in Metric::ALL {
            if metric.class() == MetricClass::Additive && self.get(metric).is_none() {
                self.set(metric, Some(0.0));
            }
        }
    }
}

/// Attributes of an agent as listed on the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    pub contract_type: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub supervisor: Option<String>,
    pub supervisor_email: Option<String>,
}

impl AgentProfile {
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.last_name, &self.second_last_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// One adapter's pre-aggregated contribution for an (agent, date).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub agent: String,
    pub date: NaiveDate,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: SourceKind,
    pub records: Vec<SourceRecord>,
}

impl SourceBatch {
    pub fn empty(source: SourceKind) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub agent: String,
    pub profile: Option<AgentProfile>,
    pub metrics: Metrics,
}

/// A reduced metric: a number, or nothing to average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Missing,
}

impl MetricValue {
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Missing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    values: [MetricValue; METRIC_COUNT],
}

impl MetricSummary {
    pub fn new(values: [MetricValue; METRIC_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, metric: Metric) -> MetricValue {
        self.values[metric.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeekBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentWeekRow {
    pub week: WeekBucket,
    pub agent: String,
    pub profile: Option<AgentProfile>,
    pub metrics: MetricSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorWeekRow {
    pub week: WeekBucket,
    pub supervisor: String,
    pub agent_count: usize,
    pub metrics: MetricSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummaryRow {
    pub agent: String,
    pub profile: Option<AgentProfile>,
    pub days_active: usize,
    pub metrics: MetricSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorSummaryRow {
    pub supervisor: String,
    pub agent_count: usize,
    pub metrics: MetricSummary,
}
