use std::collections::BTreeMap;

use crate::dates;
use crate::error::{ConsolidateError, Result};
use crate::identity::canonical_email;
use crate::models::{AgentProfile, RawTable, SourceKind};

const EMAIL_COLUMN: &str = "agent_email";

/// Authoritative agent list, keyed by canonical email.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    agents: BTreeMap<String, AgentProfile>,
}

impl Roster {
    /// Reads a header-normalized roster table. The email column is mandatory.
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let email = table
            .column_index(EMAIL_COLUMN)
            .ok_or(ConsolidateError::MissingColumn {
                report: SourceKind::Roster,
                column: EMAIL_COLUMN,
            })?;
        let first_name = table.column_index("first_name");
        let last_name = table.column_index("last_name");
        let second_last_name = table.column_index("second_last_name");
        let contract_type = table.column_index("contract_type");
        let hire_date = table.column_index("hire_date");
        let supervisor = table.column_index("supervisor");
        let supervisor_email = table.column_index("supervisor_email");

        let mut profiles = Vec::with_capacity(table.len());
        for row in &table.rows {
            let Some(agent_email) = RawTable::cell(row, Some(email))
                .as_text()
                .and_then(|e| canonical_email(&e))
            else {
                continue;
            };
            profiles.push(AgentProfile {
                email: agent_email,
                first_name: RawTable::cell(row, first_name).as_text(),
                last_name: RawTable::cell(row, last_name).as_text(),
                second_last_name: RawTable::cell(row, second_last_name).as_text(),
                contract_type: RawTable::cell(row, contract_type).as_text(),
                hire_date: dates::parse_cell(RawTable::cell(row, hire_date)),
                supervisor: RawTable::cell(row, supervisor).as_text(),
                supervisor_email: RawTable::cell(row, supervisor_email)
                    .as_text()
                    .and_then(|e| canonical_email(&e)),
            });
        }

        let skipped = table.len() - profiles.len();
        if skipped > 0 {
            tracing::warn!(skipped, "roster rows without a usable email");
        }
        Ok(Self::from_profiles(profiles))
    }

    /// First entry wins when an email is listed twice.
    pub fn from_profiles(profiles: Vec<AgentProfile>) -> Self {
        let mut agents = BTreeMap::new();
        for profile in profiles {
            if agents.contains_key(&profile.email) {
                tracing::warn!(email = %profile.email, "duplicate roster entry ignored");
                continue;
            }
            agents.insert(profile.email.clone(), profile);
        }
        Self { agents }
    }

    pub fn get(&self, email: &str) -> Option<&AgentProfile> {
        self.agents.get(email)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &AgentProfile> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use chrono::NaiveDate;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn reads_profiles_and_attributes() {
        let table = RawTable::new(
            headers(&["agent_email", "first_name", "last_name", "supervisor", "hire_date"]),
            vec![
                vec![
                    Cell::text(" Ana.Perez@X.com"),
                    Cell::text("Ana"),
                    Cell::text("Perez"),
                    Cell::text("Laura Soto"),
                    Cell::text("2024-05-02"),
                ],
                vec![Cell::Empty, Cell::text("Ghost")],
            ],
        );
        let roster = Roster::from_table(&table).unwrap();
        assert_eq!(roster.len(), 1);
        let ana = roster.get("ana.perez@x.com").unwrap();
        assert_eq!(ana.supervisor.as_deref(), Some("Laura Soto"));
        assert_eq!(ana.hire_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(ana.contract_type, None);
    }

    #[test]
    fn missing_email_column_is_fatal() {
        let table = RawTable::new(headers(&["first_name"]), vec![vec![Cell::text("Ana")]]);
        let err = Roster::from_table(&table).unwrap_err();
        assert!(matches!(
            err,
            ConsolidateError::MissingColumn {
                report: SourceKind::Roster,
                column: "agent_email"
            }
        ));
    }

    #[test]
    fn duplicate_emails_keep_first() {
        let roster = Roster::from_profiles(vec![
            AgentProfile {
                email: "a@x.com".to_string(),
                supervisor: Some("First".to_string()),
                ..AgentProfile::default()
            },
            AgentProfile {
                email: "a@x.com".to_string(),
                supervisor: Some("Second".to_string()),
                ..AgentProfile::default()
            },
        ]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("a@x.com").unwrap().supervisor.as_deref(), Some("First"));
    }
}
