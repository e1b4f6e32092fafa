use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::config::LabelLanguage;
use crate::models::{AgentProfile, AgentWeekRow, DailyRow, SupervisorWeekRow, WeekBucket};
use crate::reduce::MetricAccumulator;

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_ES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
    "Octubre", "Noviembre", "Diciembre",
];

/// Seven-day buckets counted forward from the Monday on or before the first
/// observed date. Labels name the start and end day-of-month and the end
/// day's month; the year is appended only when the data crosses a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    anchor: NaiveDate,
    language: LabelLanguage,
    with_year: bool,
}

impl WeekCalendar {
    pub fn new(first: NaiveDate, last: NaiveDate, language: LabelLanguage) -> Self {
        Self {
            anchor: monday_on_or_before(first),
            language,
            with_year: first.year() != last.year(),
        }
    }

    pub fn for_rows(daily: &[DailyRow], language: LabelLanguage) -> Option<Self> {
        let first = daily.iter().map(|r| r.date).min()?;
        let last = daily.iter().map(|r| r.date).max()?;
        Some(Self::new(first, last, language))
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn bucket(&self, date: NaiveDate) -> WeekBucket {
        let offset = (date - self.anchor).num_days().div_euclid(7);
        let start = self.anchor + Duration::days(offset * 7);
        let end = start + Duration::days(6);
        WeekBucket {
            start,
            end,
            label: self.label(start, end),
        }
    }

    fn label(&self, start: NaiveDate, end: NaiveDate) -> String {
        let month = end.month0() as usize;
        let mut label = match self.language {
            LabelLanguage::English => {
                format!("Week {} to {} of {}", start.day(), end.day(), MONTHS_EN[month])
            }
            LabelLanguage::Spanish => {
                format!("Semana {} al {} de {}", start.day(), end.day(), MONTHS_ES[month])
            }
        };
        if self.with_year {
            match self.language {
                LabelLanguage::English => label.push_str(&format!(" {}", end.year())),
                LabelLanguage::Spanish => label.push_str(&format!(" de {}", end.year())),
            }
        }
        label
    }
}

pub fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub(crate) fn supervisor_name(profile: Option<&AgentProfile>, unassigned: &str) -> String {
    profile
        .and_then(|p| p.supervisor.clone())
        .unwrap_or_else(|| unassigned.to_string())
}

/// Groups by bucket start, not label text, so equal labels never merge.
pub fn build(daily: &[DailyRow], language: LabelLanguage) -> Vec<AgentWeekRow> {
    let Some(calendar) = WeekCalendar::for_rows(daily, language) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<(NaiveDate, &str), (WeekBucket, Option<&AgentProfile>, MetricAccumulator)> =
        BTreeMap::new();
    for row in daily {
        let week = calendar.bucket(row.date);
        let entry = groups
            .entry((week.start, row.agent.as_str()))
            .or_insert_with(|| (week, row.profile.as_ref(), MetricAccumulator::default()));
        entry.2.push(&row.metrics);
    }

    let rows: Vec<AgentWeekRow> = groups
        .into_iter()
        .map(|((_, agent), (week, profile, acc))| AgentWeekRow {
            week,
            agent: agent.to_string(),
            profile: profile.cloned(),
            metrics: acc.finish(),
        })
        .collect();
    tracing::info!(rows = rows.len(), anchor = %calendar.anchor(), "weekly matrix built");
    rows
}

pub fn build_by_supervisor(
    daily: &[DailyRow],
    language: LabelLanguage,
    unassigned: &str,
) -> Vec<SupervisorWeekRow> {
    let Some(calendar) = WeekCalendar::for_rows(daily, language) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<(NaiveDate, String), (WeekBucket, BTreeSet<&str>, MetricAccumulator)> =
        BTreeMap::new();
    for row in daily {
        let week = calendar.bucket(row.date);
        let supervisor = supervisor_name(row.profile.as_ref(), unassigned);
        let entry = groups
            .entry((week.start, supervisor))
            .or_insert_with(|| (week, BTreeSet::new(), MetricAccumulator::default()));
        entry.1.insert(row.agent.as_str());
        entry.2.push(&row.metrics);
    }

    groups
        .into_iter()
        .map(|((_, supervisor), (week, agents, acc))| SupervisorWeekRow {
            week,
            supervisor,
            agent_count: agents.len(),
            metrics: acc.finish(),
        })
        .collect()
}
