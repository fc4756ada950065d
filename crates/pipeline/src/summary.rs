use std::collections::BTreeMap;

use crate::model::{Lead, LeadSummary, RejectedRecord};

/// Compute summary statistics over the finished leads.
pub fn compute_summary(leads: &[Lead], rejected: &[RejectedRecord]) -> LeadSummary {
    let mut tier_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut merged = 0;
    let mut classified = 0;
    let mut total_score: u64 = 0;

    for lead in leads {
        *tier_counts.entry(lead.score().awrv_tier.to_string()).or_insert(0) += 1;
        if lead.merged().source_count() > 1 {
            merged += 1;
        }
        if lead.classification().is_classified() {
            classified += 1;
        }
        total_score += u64::from(lead.score().score);
    }

    let average_score = if leads.is_empty() {
        0.0
    } else {
        total_score as f64 / leads.len() as f64
    };

    LeadSummary {
        total_leads: leads.len(),
        merged,
        single_source: leads.len() - merged,
        classified,
        unclassified: leads.len() - classified,
        rejected: rejected.len(),
        tier_counts,
        average_score,
    }
}
