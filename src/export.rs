use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{AgentProfile, Metric, MetricSummary, MetricValue, Metrics};
use crate::pipeline::ProcessOutput;

const PROFILE_COLUMNS: [&str; 7] = [
    "first_name",
    "last_name",
    "second_last_name",
    "contract_type",
    "hire_date",
    "supervisor",
    "supervisor_email",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputCell {
    Text(String),
    Number(f64),
    Empty,
}

impl OutputCell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn optional(value: Option<&String>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.clone()))
    }

    fn date(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }

    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(v) if v.fract() == 0.0 => format!("{v:.0}"),
            Self::Number(v) => v.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// One sheet's worth of output, in its final column order.
#[derive(Debug, Clone, Serialize)]
pub struct OutputTable {
    pub name: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<OutputCell>>,
}

fn metric_columns() -> impl Iterator<Item = String> {
    Metric::ALL.into_iter().map(|m| m.column().to_string())
}

fn columns(leading: &[&str], with_profile: bool) -> Vec<String> {
    let mut out: Vec<String> = leading.iter().map(|c| c.to_string()).collect();
    if with_profile {
        out.extend(PROFILE_COLUMNS.iter().map(|c| c.to_string()));
    }
    out.extend(metric_columns());
    out
}

fn profile_cells(profile: Option<&AgentProfile>) -> Vec<OutputCell> {
    let Some(p) = profile else {
        return vec![OutputCell::Empty; PROFILE_COLUMNS.len()];
    };
    vec![
        OutputCell::optional(p.first_name.as_ref()),
        OutputCell::optional(p.last_name.as_ref()),
        OutputCell::optional(p.second_last_name.as_ref()),
        OutputCell::optional(p.contract_type.as_ref()),
        p.hire_date.map_or(OutputCell::Empty, OutputCell::date),
        OutputCell::optional(p.supervisor.as_ref()),
        OutputCell::optional(p.supervisor_email.as_ref()),
    ]
}

/// Daily rates stay empty when nothing was reported.
fn daily_metric_cells(metrics: &Metrics) -> impl Iterator<Item = OutputCell> + '_ {
    Metric::ALL
        .into_iter()
        .map(move |m| metrics.get(m).map_or(OutputCell::Empty, OutputCell::Number))
}

/// Reduced rates with nothing to average render as the sentinel.
fn summary_metric_cells<'a>(
    metrics: &'a MetricSummary,
    sentinel: &'a str,
) -> impl Iterator<Item = OutputCell> + 'a {
    Metric::ALL.into_iter().map(move |m| match metrics.get(m) {
        MetricValue::Number(v) => OutputCell::Number(v),
        MetricValue::Missing => OutputCell::text(sentinel),
    })
}

pub fn tables(output: &ProcessOutput, config: &PipelineConfig) -> Vec<OutputTable> {
    let with_profile = output.has_roster();
    let sentinel = config.missing_sentinel.as_str();
    let mut tables = Vec::with_capacity(5);

    tables.push(OutputTable {
        name: "daily",
        columns: columns(&["date", "agent"], with_profile),
        rows: output
            .daily
            .iter()
            .map(|row| {
                let mut cells = vec![OutputCell::date(row.date), OutputCell::text(&row.agent)];
                if with_profile {
                    cells.extend(profile_cells(row.profile.as_ref()));
                }
                cells.extend(daily_metric_cells(&row.metrics));
                cells
            })
            .collect(),
    });

    tables.push(OutputTable {
        name: "weekly",
        columns: columns(&["week", "week_start", "week_end", "agent"], with_profile),
        rows: output
            .weekly
            .iter()
            .map(|row| {
                let mut cells = vec![
                    OutputCell::text(&row.week.label),
                    OutputCell::date(row.week.start),
                    OutputCell::date(row.week.end),
                    OutputCell::text(&row.agent),
                ];
                if with_profile {
                    cells.extend(profile_cells(row.profile.as_ref()));
                }
                cells.extend(summary_metric_cells(&row.metrics, sentinel));
                cells
            })
            .collect(),
    });

    tables.push(OutputTable {
        name: "summary",
        columns: columns(&["agent", "days_active"], with_profile),
        rows: output
            .summary
            .iter()
            .map(|row| {
                let mut cells = vec![
                    OutputCell::text(&row.agent),
                    OutputCell::Number(row.days_active as f64),
                ];
                if with_profile {
                    cells.extend(profile_cells(row.profile.as_ref()));
                }
                cells.extend(summary_metric_cells(&row.metrics, sentinel));
                cells
            })
            .collect(),
    });

    if let Some(weekly) = &output.weekly_by_supervisor {
        tables.push(OutputTable {
            name: "weekly_by_supervisor",
            columns: columns(&["week", "week_start", "week_end", "supervisor", "agents"], false),
            rows: weekly
                .iter()
                .map(|row| {
                    let mut cells = vec![
                        OutputCell::text(&row.week.label),
                        OutputCell::date(row.week.start),
                        OutputCell::date(row.week.end),
                        OutputCell::text(&row.supervisor),
                        OutputCell::Number(row.agent_count as f64),
                    ];
                    cells.extend(summary_metric_cells(&row.metrics, sentinel));
                    cells
                })
                .collect(),
        });
    }

    if let Some(summary) = &output.summary_by_supervisor {
        tables.push(OutputTable {
            name: "summary_by_supervisor",
            columns: columns(&["supervisor", "agents"], false),
            rows: summary
                .iter()
                .map(|row| {
                    let mut cells = vec![
                        OutputCell::text(&row.supervisor),
                        OutputCell::Number(row.agent_count as f64),
                    ];
                    cells.extend(summary_metric_cells(&row.metrics, sentinel));
                    cells
                })
                .collect(),
        });
    }

    tables
}

pub fn file_stem(output: &ProcessOutput) -> String {
    format!("{}_to_{}", output.range.from(), output.range.to())
}

/// Writes `<stem>_<table>.csv` for every table and returns the paths.
pub fn write_csv_dir(tables: &[OutputTable], dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{stem}_{}.csv", table.name));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(OutputCell::render))?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), rows = table.rows.len(), "table written");
        written.push(path);
    }
    Ok(written)
}

pub fn write_json(tables: &[OutputTable], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), tables)?;
    Ok(())
}
