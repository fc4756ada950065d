use crate::model::{ClassifiedLead, Classification, LeadScore, ScoredLead, Tier};
use crate::taxonomy::Taxonomy;

/// Compliance tag weights, matched as case-insensitive substrings of each tag.
pub const COMPLIANCE_WEIGHTS: [(&str, u32); 8] = [
    ("CSA Z96", 5),
    ("NFPA 2112", 5),
    ("NFPA 70E", 4),
    ("HACCP", 4),
    ("CFIA", 3),
    ("WHMIS", 3),
    ("GMP", 3),
    ("Unknown", 1),
];

/// Industry-name keyword to tier. First match wins.
pub const TIER_KEYWORDS: [(&str, Tier); 4] = [
    ("Auto Shop", Tier::Low),
    ("Food Processor", Tier::Medium),
    ("Electrical Contractor", Tier::High),
    ("Chemical Facility", Tier::High),
];

pub struct Scorer<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> Scorer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Score a classified lead. Pure: same lead and density, same result.
    ///
    /// `score = compliance_score * 2 + source_count + zone_density_score`
    pub fn score(&self, lead: ClassifiedLead, zone_density_score: u32) -> ScoredLead {
        let score = self.compute(&lead, zone_density_score);
        ScoredLead {
            classified: lead,
            score,
        }
    }

    pub fn compute(&self, lead: &ClassifiedLead, zone_density_score: u32) -> LeadScore {
        let classification = &lead.classification;
        let compliance_score = compliance_score(classification.compliance.iter().map(String::as_str));
        let awrv_tier = self.tier_for(classification);
        // Saturates so an out-of-range density cannot overflow
        let score = compliance_score
            .saturating_mul(2)
            .saturating_add(lead.merged.source_count())
            .saturating_add(zone_density_score);
        LeadScore {
            compliance_score,
            zone_density_score,
            score,
            awrv_tier,
        }
    }

    /// Keyword table first, then the taxonomy entry's own tier, then `Medium`.
    pub fn tier_for(&self, classification: &Classification) -> Tier {
        if let Some(tier) = tier_from_industry(&classification.industry) {
            return tier;
        }
        classification
            .naics_code
            .as_deref()
            .and_then(|code| self.taxonomy.get(code))
            .map(|entry| entry.tier)
            .unwrap_or_default()
    }
}

/// Maximum weight over all tags; 0 when no tag carries a known weight.
pub fn compliance_score<'t>(tags: impl IntoIterator<Item = &'t str>) -> u32 {
    tags.into_iter()
        .flat_map(|tag| {
            let tag = tag.to_lowercase();
            COMPLIANCE_WEIGHTS
                .iter()
                .filter(move |(key, _)| tag.contains(&key.to_lowercase()))
                .map(|(_, weight)| *weight)
        })
        .max()
        .unwrap_or(0)
}

pub fn tier_from_industry(industry: &str) -> Option<Tier> {
    let industry = industry.to_lowercase();
    TIER_KEYWORDS
        .iter()
        .find(|(keyword, _)| industry.contains(&keyword.to_lowercase()))
        .map(|(_, tier)| *tier)
}
