//! Agent identity resolution.
//!
//! The canonical identity of an agent is their lowercased, trimmed email.
//! Reports that only carry a display name are matched through a name index
//! built from every email seen across the run (and, when present, the roster's
//! names): `ana.perez@x.com` is indexed as `ana perez`.

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::roster::Roster;

pub fn is_email_like(value: &str) -> bool {
    value.contains('@')
}

pub fn canonical_email(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    (is_email_like(&value) && !value.starts_with('@') && !value.ends_with('@')).then_some(value)
}

/// `Ana.Pérez ` → `ana perez`.
pub fn name_key(raw: &str) -> String {
    let folded: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == '.' { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn email_name_key(email: &str) -> Option<String> {
    let local = email.split('@').next()?;
    let key = name_key(local);
    (!key.is_empty()).then_some(key)
}

#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    by_name: BTreeMap<String, String>,
}

impl IdentityResolver {
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = emails
            .into_iter()
            .filter_map(|e| canonical_email(e.as_ref()))
            .collect();

        let mut resolver = Self::default();
        for email in unique {
            resolver.index(email_name_key(&email), email);
        }
        resolver
    }

    /// Adds roster emails and display names to the index.
    pub fn with_roster(mut self, roster: &Roster) -> Self {
        for profile in roster.profiles() {
            self.index(email_name_key(&profile.email), profile.email.clone());
            if let Some(name) = profile.display_name() {
                self.index(Some(name_key(&name)), profile.email.clone());
            }
            let short = [&profile.first_name, &profile.last_name]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            if !short.is_empty() {
                self.index(Some(name_key(&short)), profile.email.clone());
            }
        }
        self
    }

    fn index(&mut self, key: Option<String>, email: String) {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        match self.by_name.get(&key) {
            Some(existing) if *existing != email => {
                tracing::debug!(%key, kept = %existing, ignored = %email, "ambiguous name key");
            }
            Some(_) => {}
            None => {
                self.by_name.insert(key, email);
            }
        }
    }

    /// Canonical key for an email or display name, `None` when a name matches no email.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(email) = canonical_email(reference) {
            return Some(email);
        }
        let key = name_key(reference);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).cloned()
    }

    /// Email wins when present; otherwise the name is looked up.
    pub fn resolve_parts(&self, email: Option<&str>, name: Option<&str>) -> Option<String> {
        email
            .and_then(|e| self.resolve(e))
            .or_else(|| name.and_then(|n| self.resolve(n)))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
