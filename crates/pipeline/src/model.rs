use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

/// Display name used for leads the classifier could not place.
pub const UNKNOWN_INDUSTRY: &str = "Unknown";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single business record as delivered by one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Required for matching; blank or null names are rejected by the pipeline, not here.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub business_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_description: Option<String>,
    /// Provenance tag: the configured source name.
    #[serde(default)]
    pub source: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawRecord {
    pub fn new(source: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn has_business_name(&self) -> bool {
        !self.business_name.trim().is_empty()
    }

    /// Free text handed to the classifier: name, address and license description.
    pub fn classification_text(&self) -> String {
        let mut parts = vec![self.business_name.as_str()];
        if let Some(ref address) = self.address {
            parts.push(address);
        }
        if let Some(ref description) = self.license_description {
            parts.push(description);
        }
        parts.join(" ")
    }

    /// Explicit map link, or one derived from the coordinates when both are known.
    pub fn map_link(&self) -> Option<String> {
        if let Some(ref link) = self.maps_link {
            return Some(link.clone());
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(format!("https://www.google.com/maps?q={lat},{lng}")),
            _ => None,
        }
    }

    /// Field union of `self` and `other`; `other` wins wherever it carries a value.
    ///
    /// `business_name` and `source` always come from `other`. Optional fields
    /// that `other` leaves empty keep the value from `self`.
    pub fn overlay(&self, other: &RawRecord) -> RawRecord {
        RawRecord {
            business_name: other.business_name.clone(),
            address: other.address.clone().or_else(|| self.address.clone()),
            postal_code: other.postal_code.clone().or_else(|| self.postal_code.clone()),
            latitude: other.latitude.or(self.latitude),
            longitude: other.longitude.or(self.longitude),
            maps_link: other.maps_link.clone().or_else(|| self.maps_link.clone()),
            license_description: other
                .license_description
                .clone()
                .or_else(|| self.license_description.clone()),
            source: other.source.clone(),
        }
    }
}

/// Pre-loaded records keyed by source name.
#[derive(Debug, Clone, Default)]
pub struct LeadInput {
    pub records: HashMap<String, Vec<RawRecord>>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// A reconciled entity and the sources that corroborated it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedLead {
    pub record: RawRecord,
    pub sources: Vec<String>,
}

impl MergedLead {
    pub fn single(record: RawRecord) -> Self {
        let sources = vec![record.source.clone()];
        Self { record, sources }
    }

    pub fn merged(left: &RawRecord, right: &RawRecord) -> Self {
        Self {
            record: left.overlay(right),
            sources: vec![left.source.clone(), right.source.clone()],
        }
    }

    /// Number of sources that contributed to this entity (1 or 2).
    pub fn source_count(&self) -> u32 {
        self.sources.len() as u32
    }
}

/// Why a left-hand record did or did not merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeDecision {
    pub left_index: usize,
    /// Best unconsumed right-hand candidate, if any remained.
    pub best_right_index: Option<usize>,
    pub best_score: f64,
    pub merged: bool,
}

#[derive(Debug)]
pub struct MergeOutput {
    pub leads: Vec<MergedLead>,
    pub decisions: Vec<MergeDecision>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub naics_code: Option<String>,
    pub industry: String,
    pub compliance: BTreeSet<String>,
}

impl Classification {
    /// The `(None, "Unknown", {})` sentinel.
    pub fn unclassified() -> Self {
        Self {
            naics_code: None,
            industry: UNKNOWN_INDUSTRY.to_string(),
            compliance: BTreeSet::new(),
        }
    }

    pub fn is_classified(&self) -> bool {
        self.naics_code.is_some()
    }

    /// Compliance tags as one `", "`-delimited string (tag order is stable).
    pub fn compliance_label(&self) -> String {
        self.compliance.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::unclassified()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLead {
    pub merged: MergedLead,
    pub classification: Classification,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Qualitative account-value tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeadScore {
    pub compliance_score: u32,
    pub zone_density_score: u32,
    pub score: u32,
    pub awrv_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLead {
    pub classified: ClassifiedLead,
    pub score: LeadScore,
}

// ---------------------------------------------------------------------------
// Final lead + tabular view
// ---------------------------------------------------------------------------

/// Fully processed lead. Serializes as its flat [`LeadRow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "LeadRow")]
pub struct Lead {
    pub scored: ScoredLead,
    pub script: String,
}

impl Lead {
    pub fn record(&self) -> &RawRecord {
        &self.scored.classified.merged.record
    }

    pub fn merged(&self) -> &MergedLead {
        &self.scored.classified.merged
    }

    pub fn classification(&self) -> &Classification {
        &self.scored.classified.classification
    }

    pub fn score(&self) -> &LeadScore {
        &self.scored.score
    }

    pub fn row(&self) -> LeadRow {
        let record = self.record();
        let classification = self.classification();
        LeadRow {
            business_name: record.business_name.clone(),
            address: record.address.clone(),
            postal_code: record.postal_code.clone(),
            industry: classification.industry.clone(),
            compliance: classification.compliance_label(),
            naics_code: classification.naics_code.clone(),
            awrv_tier: self.score().awrv_tier,
            score: self.score().score,
            script: self.script.clone(),
            maps_link: record.map_link(),
        }
    }
}

/// The fixed output column set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRow {
    pub business_name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub industry: String,
    pub compliance: String,
    pub naics_code: Option<String>,
    pub awrv_tier: Tier,
    pub score: u32,
    pub script: String,
    pub maps_link: Option<String>,
}

impl From<Lead> for LeadRow {
    fn from(lead: Lead) -> Self {
        lead.row()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A raw record that never entered the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub source: String,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadSummary {
    pub total_leads: usize,
    pub merged: usize,
    pub single_source: usize,
    pub classified: usize,
    pub unclassified: usize,
    pub rejected: usize,
    pub tier_counts: BTreeMap<String, usize>,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadMeta {
    pub run_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub threshold: f64,
    pub left_source: String,
    pub right_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadReport {
    pub meta: LeadMeta,
    pub summary: LeadSummary,
    pub leads: Vec<Lead>,
    pub rejected: Vec<RejectedRecord>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
