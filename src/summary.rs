use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AgentProfile, AgentSummaryRow, DailyRow, SupervisorSummaryRow};
use crate::reduce::MetricAccumulator;
use crate::weekly::supervisor_name;

pub fn build(daily: &[DailyRow]) -> Vec<AgentSummaryRow> {
    let mut groups: BTreeMap<&str, (Option<&AgentProfile>, MetricAccumulator)> = BTreeMap::new();
    for row in daily {
        let entry = groups
            .entry(row.agent.as_str())
            .or_insert_with(|| (row.profile.as_ref(), MetricAccumulator::default()));
        entry.1.push(&row.metrics);
    }

    let rows: Vec<AgentSummaryRow> = groups
        .into_iter()
        .map(|(agent, (profile, acc))| AgentSummaryRow {
            agent: agent.to_string(),
            profile: profile.cloned(),
            days_active: acc.rows(),
            metrics: acc.finish(),
        })
        .collect();
    tracing::info!(agents = rows.len(), "summary built");
    rows
}

pub fn build_by_supervisor(daily: &[DailyRow], unassigned: &str) -> Vec<SupervisorSummaryRow> {
    let mut groups: BTreeMap<String, (BTreeSet<&str>, MetricAccumulator)> = BTreeMap::new();
    for row in daily {
        let entry = groups
            .entry(supervisor_name(row.profile.as_ref(), unassigned))
            .or_default();
        entry.0.insert(row.agent.as_str());
        entry.1.push(&row.metrics);
    }

    groups
        .into_iter()
        .map(|(supervisor, (agents, acc))| SupervisorSummaryRow {
            supervisor,
            agent_count: agents.len(),
            metrics: acc.finish(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, MetricValue, Metrics};
    use chrono::NaiveDate;

    fn row(agent: &str, day: u32, supervisor: Option<&str>, metrics: Metrics) -> DailyRow {
        let mut metrics = metrics;
        metrics.fill_additive();
        DailyRow {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            agent: agent.to_string(),
            profile: supervisor.map(|s| AgentProfile {
                email: agent.to_string(),
                supervisor: Some(s.to_string()),
                ..AgentProfile::default()
            }),
            metrics,
        }
    }

    #[test]
    fn one_row_per_agent_over_the_whole_range() {
        let daily = vec![
            row("a@x.com", 3, None, Metrics::default().with(Metric::SalesTotal, 100.0)),
            row("a@x.com", 4, None, Metrics::default().with(Metric::AuditScore, 80.0)),
            row("a@x.com", 20, None, Metrics::default().with(Metric::AuditScore, 90.0)),
            row("b@x.com", 3, None, Metrics::default().with(Metric::Tickets, 2.0)),
        ];
        let summary = build(&daily);
        assert_eq!(summary.len(), 2);
        let a = &summary[0];
        assert_eq!(a.days_active, 3);
        assert_eq!(a.metrics.get(Metric::SalesTotal), MetricValue::Number(100.0));
        assert_eq!(a.metrics.get(Metric::AuditScore), MetricValue::Number(85.0));
        let b = &summary[1];
        assert_eq!(b.metrics.get(Metric::AuditScore), MetricValue::Missing);
        assert_eq!(b.metrics.get(Metric::Audits), MetricValue::Number(0.0));
    }

    #[test]
    fn supervisors_aggregate_their_agents() {
        let daily = vec![
            row("a@x.com", 3, Some("Laura"), Metrics::default().with(Metric::Tickets, 2.0)),
            row("b@x.com", 3, Some("Laura"), Metrics::default().with(Metric::Tickets, 5.0)),
            row("c@x.com", 3, None, Metrics::default().with(Metric::Tickets, 1.0)),
        ];
        let summary = build_by_supervisor(&daily, "Unassigned");
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].supervisor, "Laura");
        assert_eq!(summary[0].agent_count, 2);
        assert_eq!(summary[0].metrics.get(Metric::Tickets), MetricValue::Number(7.0));
        assert_eq!(summary[1].supervisor, "Unassigned");
    }
}
