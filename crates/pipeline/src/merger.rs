use log::debug;

use crate::model::{MergeDecision, MergeOutput, MergedLead, RawRecord};
use crate::similarity::similarity;

pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Reconcile two record lists by business-name similarity.
///
/// Greedy, single pass: each left record takes its best unconsumed right
/// record when the score reaches `threshold`. On a merge the right record's
/// values override the left's (see [`RawRecord::overlay`]). Output is all
/// left-derived leads in left order, then leftover right records in right order.
pub fn merge(left: &[RawRecord], right: &[RawRecord], threshold: f64) -> Vec<MergedLead> {
    merge_with_decisions(left, right, threshold).leads
}

/// Same as [`merge`], also reporting the decision taken for each left record.
pub fn merge_with_decisions(left: &[RawRecord], right: &[RawRecord], threshold: f64) -> MergeOutput {
    let mut right_used = vec![false; right.len()];
    let mut leads = Vec::with_capacity(left.len() + right.len());
    let mut decisions = Vec::with_capacity(left.len());

    for (li, left_record) in left.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;

        for (ri, right_record) in right.iter().enumerate() {
            if right_used[ri] {
                continue;
            }
            let score = similarity(&left_record.business_name, &right_record.business_name);
            // Strict: first candidate wins ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((ri, score));
            }
        }

        let best_score = best.map_or(0.0, |(_, s)| s);
        let merged = match best {
            Some((ri, score)) if score >= threshold => {
                right_used[ri] = true;
                debug!(
                    "merged '{}' with '{}' (score {:.3})",
                    left_record.business_name, right[ri].business_name, score
                );
                leads.push(MergedLead::merged(left_record, &right[ri]));
                true
            }
            _ => {
                leads.push(MergedLead::single(left_record.clone()));
                false
            }
        };

        decisions.push(MergeDecision {
            left_index: li,
            best_right_index: best.map(|(ri, _)| ri),
            best_score,
            merged,
        });
    }

    leads.extend(
        right
            .iter()
            .enumerate()
            .filter(|(i, _)| !right_used[*i])
            .map(|(_, r)| MergedLead::single(r.clone())),
    );

    MergeOutput { leads, decisions }
}
