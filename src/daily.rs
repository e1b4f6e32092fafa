use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyRow, Metrics, SourceBatch};
use crate::roster::Roster;

/// Outer-joins every batch on (date, agent).
///
/// Batches are folded one at a time into a single accumulator, so each pair
/// comes out exactly once. With a roster, agents it does not list are dropped
/// and its attributes are attached to every remaining row.
pub fn build(batches: &[SourceBatch], roster: Option<&Roster>) -> Vec<DailyRow> {
    let mut merged: BTreeMap<(NaiveDate, String), Metrics> = BTreeMap::new();
    for batch in batches.iter().filter(|b| !b.records.is_empty()) {
        for record in &batch.records {
            merged
                .entry((record.date, record.agent.clone()))
                .or_default()
                .absorb(&record.metrics);
        }
        tracing::debug!(source = %batch.source, records = batch.records.len(), "merged");
    }

    let mut off_roster = 0usize;
    let mut rows = Vec::with_capacity(merged.len());
    for ((date, agent), mut metrics) in merged {
        let profile = match roster {
            Some(roster) => match roster.get(&agent) {
                Some(profile) => Some(profile.clone()),
                None => {
                    off_roster += 1;
                    continue;
                }
            },
            None => None,
        };
        metrics.fill_additive();
        rows.push(DailyRow {
            date,
            agent,
            profile,
            metrics,
        });
    }

    if off_roster > 0 {
        tracing::info!(off_roster, "daily rows dropped for agents not on the roster");
    }
    tracing::info!(rows = rows.len(), "daily matrix built");
    rows
}
