//! Industry taxonomy: an ordered, validated, read-only table of entries.
//!
//! Entry order is significant. The classifier breaks score ties in favour of
//! the earlier entry, so documents are kept as sequences, never as maps.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::LeadError;
use crate::model::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub code: String,
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub compliance: BTreeSet<String>,
    #[serde(default)]
    pub tier: Tier,
}

#[derive(Debug, Deserialize)]
struct TaxonomyDocument {
    #[serde(rename = "industry", default)]
    industries: Vec<TaxonomyEntry>,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> Result<Self, LeadError> {
        let taxonomy = Self { entries };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Parse a TOML document of `[[industry]]` tables.
    pub fn from_toml(input: &str) -> Result<Self, LeadError> {
        let doc: TaxonomyDocument =
            toml::from_str(input).map_err(|e| LeadError::TaxonomyParse(e.to_string()))?;
        Self::from_entries(doc.industries)
    }

    /// Parse a JSON document shaped `{"industry": [ ... ]}`.
    pub fn from_json(input: &str) -> Result<Self, LeadError> {
        let doc: TaxonomyDocument =
            serde_json::from_str(input).map_err(|e| LeadError::TaxonomyParse(e.to_string()))?;
        Self::from_entries(doc.industries)
    }

    fn validate(&self) -> Result<(), LeadError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.code.trim().is_empty() {
                return Err(LeadError::TaxonomyValidation(
                    "industry code must not be empty".into(),
                ));
            }
            if !seen.insert(entry.code.as_str()) {
                return Err(LeadError::TaxonomyValidation(format!(
                    "duplicate industry code '{}'",
                    entry.code
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(LeadError::TaxonomyValidation(format!(
                    "industry '{}': name must not be empty",
                    entry.code
                )));
            }
            if entry.keywords.is_empty() {
                return Err(LeadError::TaxonomyValidation(format!(
                    "industry '{}': at least one keyword is required",
                    entry.code
                )));
            }
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(LeadError::TaxonomyValidation(format!(
                    "industry '{}': blank keyword",
                    entry.code
                )));
            }
        }
        Ok(())
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&TaxonomyEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }

    /// Keywords for `code`; empty for unknown codes.
    pub fn keywords_for(&self, code: &str) -> &[String] {
        self.get(code).map(|e| e.keywords.as_slice()).unwrap_or(&[])
    }

    /// Compliance tags for `code`; empty for unknown codes.
    pub fn compliance_for(&self, code: &str) -> BTreeSet<String> {
        self.get(code).map(|e| e.compliance.clone()).unwrap_or_default()
    }

    /// Entries listing `keyword` verbatim (case-insensitive), in order.
    pub fn by_keyword(&self, keyword: &str) -> Vec<&TaxonomyEntry> {
        let needle = keyword.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.keywords.iter().any(|k| k.to_lowercase() == needle))
            .collect()
    }
}
