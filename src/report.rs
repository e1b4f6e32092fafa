use std::fmt::Write;

use crate::config::PipelineConfig;
use crate::models::{AgentSummaryRow, Metric, MetricValue};
use crate::pipeline::ProcessOutput;

const TOP_AGENTS: usize = 10;

fn metric_number(row: &AgentSummaryRow, metric: Metric) -> f64 {
    row.metrics.get(metric).number().unwrap_or(0.0)
}

fn render_rate(value: MetricValue, sentinel: &str) -> String {
    match value {
        MetricValue::Number(v) => format!("{v:.2}"),
        MetricValue::Missing => sentinel.to_string(),
    }
}

pub fn rank_by(summary: &[AgentSummaryRow], metric: Metric) -> Vec<&AgentSummaryRow> {
    let mut ranked: Vec<&AgentSummaryRow> = summary
        .iter()
        .filter(|row| metric_number(row, metric) > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        metric_number(b, metric)
            .total_cmp(&metric_number(a, metric))
            .then_with(|| a.agent.cmp(&b.agent))
    });
    ranked
}

fn agent_label(row: &AgentSummaryRow) -> String {
    match row.profile.as_ref().and_then(|p| p.display_name()) {
        Some(name) => format!("{name} ({})", row.agent),
        None => row.agent.clone(),
    }
}

pub fn build_report(output: &ProcessOutput, config: &PipelineConfig) -> String {
    let sentinel = config.missing_sentinel.as_str();
    let mut report = String::new();

    let _ = writeln!(report, "# Support Operations Report");
    let _ = writeln!(
        report,
        "Activity from {} to {} ({} days)",
        output.range.from(),
        output.range.to(),
        output.range.days()
    );
    let _ = writeln!(report);
    let _ = writeln!(report, "## Coverage");
    let _ = writeln!(report, "- {} agents active", output.summary.len());
    let _ = writeln!(report, "- {} agent-days", output.daily.len());
    let weeks = output
        .weekly
        .iter()
        .map(|row| row.week.start)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    let _ = writeln!(report, "- {weeks} weeks");

    let _ = writeln!(report);
    let _ = writeln!(report, "## Busiest Agents");
    let by_tickets = rank_by(&output.summary, Metric::Tickets);
    if by_tickets.is_empty() {
        let _ = writeln!(report, "No tickets recorded for this range.");
    } else {
        for row in by_tickets.iter().take(TOP_AGENTS) {
            let _ = writeln!(
                report,
                "- {}: {:.0} tickets, {:.0} resolved, CSAT {}",
                agent_label(row),
                metric_number(row, Metric::Tickets),
                metric_number(row, Metric::TicketsResolved),
                render_rate(row.metrics.get(Metric::Csat), sentinel)
            );
        }
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Top Sellers");
    let by_sales = rank_by(&output.summary, Metric::SalesTotal);
    if by_sales.is_empty() {
        let _ = writeln!(report, "No sales recorded for this range.");
    } else {
        for row in by_sales.iter().take(TOP_AGENTS) {
            let _ = writeln!(
                report,
                "- {}: {:.2} total ({:.2} shared, {:.2} exclusive)",
                agent_label(row),
                metric_number(row, Metric::SalesTotal),
                metric_number(row, Metric::SalesShared),
                metric_number(row, Metric::SalesExclusive)
            );
        }
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "## Quality");
    let audited: Vec<&AgentSummaryRow> = output
        .summary
        .iter()
        .filter(|row| metric_number(row, Metric::Audits) > 0.0)
        .collect();
    let _ = writeln!(
        report,
        "- {} of {} agents audited",
        audited.len(),
        output.summary.len()
    );
    for row in audited.iter().take(TOP_AGENTS) {
        let _ = writeln!(
            report,
            "- {}: {:.0} audits, score {}",
            agent_label(row),
            metric_number(row, Metric::Audits),
            render_rate(row.metrics.get(Metric::AuditScore), sentinel)
        );
    }

    if let Some(supervisors) = &output.summary_by_supervisor {
        let _ = writeln!(report);
        let _ = writeln!(report, "## Supervisors");
        for row in supervisors {
            let _ = writeln!(
                report,
                "- {}: {} agents, {:.0} tickets, {:.2} in sales",
                row.supervisor,
                row.agent_count,
                row.metrics.get(Metric::Tickets).number().unwrap_or(0.0),
                row.metrics.get(Metric::SalesTotal).number().unwrap_or(0.0)
            );
        }
    }

    report
}
