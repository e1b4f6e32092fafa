use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::headers;
use crate::identity::IdentityResolver;
use crate::models::{
    AgentSummaryRow, AgentWeekRow, DailyRow, RawTable, SupervisorSummaryRow, SupervisorWeekRow,
};
use crate::range::DateRange;
use crate::roster::Roster;
use crate::sources::{audits, inspections, performance, sales};
use crate::{daily, summary, weekly};

/// Decoded reports for one run. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub sales: Option<RawTable>,
    pub performance: Option<RawTable>,
    pub audits: Option<RawTable>,
    pub roster: Option<RawTable>,
    pub inspections: Option<RawTable>,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub range: DateRange,
    pub daily: Vec<DailyRow>,
    pub weekly: Vec<AgentWeekRow>,
    pub summary: Vec<AgentSummaryRow>,
    /// Present only when a roster supplied supervisors.
    pub weekly_by_supervisor: Option<Vec<SupervisorWeekRow>>,
    pub summary_by_supervisor: Option<Vec<SupervisorSummaryRow>>,
}

impl ProcessOutput {
    pub fn has_roster(&self) -> bool {
        self.weekly_by_supervisor.is_some()
    }
}

#[tracing::instrument(
    skip_all,
    fields(run_id = %Uuid::new_v4(), from = %range.from(), to = %range.to())
)]
pub fn process(
    inputs: ReportInputs,
    range: DateRange,
    config: &PipelineConfig,
) -> Result<ProcessOutput> {
    let synonyms = config.header_synonym_table()?;
    let normalize = |table: Option<RawTable>| table.map(|t| headers::normalize(t, &synonyms));

    let sales_table = normalize(inputs.sales);
    let performance_table = normalize(inputs.performance);
    let audits_table = normalize(inputs.audits);
    let inspections_table = normalize(inputs.inspections);
    let roster = normalize(inputs.roster)
        .as_ref()
        .map(Roster::from_table)
        .transpose()?;

    let seen_emails = [
        sales::agent_emails(sales_table.as_ref()),
        performance::agent_emails(performance_table.as_ref()),
        audits::agent_emails(audits_table.as_ref()),
        inspections::agent_emails(inspections_table.as_ref()),
    ];
    let mut resolver = IdentityResolver::from_emails(seen_emails.iter().flatten());
    if let Some(roster) = &roster {
        resolver = resolver.with_roster(roster);
        tracing::info!(agents = roster.len(), "roster loaded");
    }
    tracing::debug!(names = resolver.len(), "identity index built");

    let batches = [
        sales::adapt(sales_table.as_ref(), &range, &resolver, config)?,
        performance::adapt(performance_table.as_ref(), &range, &resolver, config)?,
        audits::adapt(audits_table.as_ref(), &range)?,
        inspections::adapt(inspections_table.as_ref(), &range, &resolver)?,
    ];

    let daily = daily::build(&batches, roster.as_ref());
    let weekly = weekly::build(&daily, config.week_labels);
    let summary = summary::build(&daily);
    let (weekly_by_supervisor, summary_by_supervisor) = match roster {
        Some(_) => (
            Some(weekly::build_by_supervisor(
                &daily,
                config.week_labels,
                &config.unassigned_supervisor,
            )),
            Some(summary::build_by_supervisor(&daily, &config.unassigned_supervisor)),
        ),
        None => (None, None),
    };

    Ok(ProcessOutput {
        range,
        daily,
        weekly,
        summary,
        weekly_by_supervisor,
        summary_by_supervisor,
    })
}
