//! Column-name canonicalization.
//!
//! Every report arrives with its own spelling of the same column: Spanish or
//! English, accents or not, stray BOMs, `%` prefixes, unit suffixes. Headers are
//! reduced to `snake_case` ASCII-ish keys, then mapped through [`HeaderSynonyms`].

use std::collections::BTreeMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{ConsolidateError, Result};
use crate::models::RawTable;

const INVISIBLE: [char; 5] = ['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    // sales
    ("ds_agent_email", "agent_email"),
    ("qt_price_local", "price"),
    ("price_local", "price"),
    ("precio", "price"),
    ("ds_product_name", "product_name"),
    ("product", "product_name"),
    ("producto", "product_name"),
    ("fecha", "date"),
    ("fecha_venta", "date"),
    // performance
    ("group_support_service", "service_group"),
    ("grupo_de_soporte", "service_group"),
    ("fecha_de_referencia", "reference_date"),
    ("fecha_referencia", "reference_date"),
    ("referencia_fecha", "reference_date"),
    ("assignee_fullname", "assignee_name"),
    ("assignee_full_name", "assignee_name"),
    ("nps_score", "nps"),
    ("firt_h", "first_response_hours"),
    ("firt", "first_response_pct"),
    ("pct_firt", "first_response_pct"),
    ("furt_h", "resolution_hours"),
    ("furt", "resolution_pct"),
    ("pct_furt", "resolution_pct"),
    ("estado", "status"),
    ("reopen", "reopens"),
    // audits
    ("date_time", "audit_date"),
    ("fecha_hora", "audit_date"),
    ("agente_auditado", "audited_agent"),
    ("total_audit_score", "audit_score"),
    ("nota_auditoria", "audit_score"),
    // inspections
    ("direccion_de_correo_electronico", "agent_email"),
    ("correo_electronico", "agent_email"),
    ("correo", "agent_email"),
    ("email", "agent_email"),
    ("email_address", "agent_email"),
    ("n_inspecciones", "inspection_count"),
    ("no_inspecciones", "inspection_count"),
    ("inspecciones", "inspection_count"),
    // roster
    ("nombre", "first_name"),
    ("nombres", "first_name"),
    ("apellido", "last_name"),
    ("apellido_paterno", "last_name"),
    ("apellido_materno", "second_last_name"),
    ("tipo_de_contrato", "contract_type"),
    ("contrato", "contract_type"),
    ("fecha_de_ingreso", "hire_date"),
    ("fecha_ingreso", "hire_date"),
    ("lider", "supervisor"),
    ("correo_supervisor", "supervisor_email"),
    ("email_supervisor", "supervisor_email"),
];

/// Immutable variant-spelling → canonical-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSynonyms {
    map: BTreeMap<String, String>,
}

impl Default for HeaderSynonyms {
    fn default() -> Self {
        let map = DEFAULT_SYNONYMS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { map }
    }
}

impl HeaderSynonyms {
    /// Defaults extended by caller-provided entries. Keys and targets are
    /// canonicalized first; a target that is itself remapped is rejected.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut synonyms = Self::default();
        for (from, to) in overrides {
            let from = canonical_form(from);
            let to = canonical_form(to);
            if from.is_empty() || to.is_empty() {
                return Err(ConsolidateError::Config(
                    "header synonyms cannot be blank".to_string(),
                ));
            }
            synonyms.map.insert(from, to);
        }
        synonyms.validate()?;
        Ok(synonyms)
    }

    fn validate(&self) -> Result<()> {
        for (from, to) in &self.map {
            if let Some(next) = self.map.get(to) {
                if next != to {
                    return Err(ConsolidateError::Config(format!(
                        "header synonym `{from}` -> `{to}` chains into `{next}`"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.map.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub fn canonical_form(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let folded: String = cleaned
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut pending_separator = false;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }
    out
}

pub fn normalize_header(raw: &str, synonyms: &HeaderSynonyms) -> String {
    let key = canonical_form(raw);
    synonyms.resolve(&key).to_string()
}

/// Rewrites column labels only; cells are untouched.
pub fn normalize(mut table: RawTable, synonyms: &HeaderSynonyms) -> RawTable {
    table.headers = table
        .headers
        .iter()
        .map(|h| normalize_header(h, synonyms))
        .collect();
    table
}
