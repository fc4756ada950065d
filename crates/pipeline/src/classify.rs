use log::debug;

use crate::model::{Classification, ClassifiedLead, MergedLead};
use crate::taxonomy::Taxonomy;

/// Added to a keyword hit's length when it occurs as a whole word.
pub const WHOLE_WORD_BONUS: usize = 5;

/// Keyword-priority industry classifier over a borrowed taxonomy.
pub struct Classifier<'a> {
    taxonomy: &'a Taxonomy,
    /// (entry index, lower-cased keyword), in taxonomy then keyword order.
    keywords: Vec<(usize, String)>,
}

/// The winning keyword for a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHit {
    pub entry_index: usize,
    pub keyword: String,
    pub score: usize,
    pub whole_word: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        let keywords = taxonomy
            .entries()
            .iter()
            .enumerate()
            .flat_map(|(i, entry)| entry.keywords.iter().map(move |k| (i, k.to_lowercase())))
            .collect();
        Self { taxonomy, keywords }
    }

    /// Best taxonomy entry for `text`, or the unclassified sentinel.
    pub fn classify(&self, text: &str) -> Classification {
        match self.best_hit(text) {
            Some(hit) => {
                let entry = &self.taxonomy.entries()[hit.entry_index];
                Classification {
                    naics_code: Some(entry.code.clone()),
                    industry: entry.name.clone(),
                    compliance: entry.compliance.clone(),
                }
            }
            None => Classification::unclassified(),
        }
    }

    pub fn classify_lead(&self, lead: MergedLead) -> ClassifiedLead {
        let text = lead.record.classification_text();
        let classification = self.classify(&text);
        debug!(
            "classified '{}' as {} ({})",
            lead.record.business_name,
            classification.naics_code.as_deref().unwrap_or("-"),
            classification.industry
        );
        ClassifiedLead {
            merged: lead,
            classification,
        }
    }

    /// Highest-scoring keyword hit. Ties keep the first hit in taxonomy order.
    pub fn best_hit(&self, text: &str) -> Option<KeywordHit> {
        let haystack = text.to_lowercase();
        if haystack.trim().is_empty() {
            return None;
        }

        let mut best: Option<KeywordHit> = None;
        for (entry_index, keyword) in &self.keywords {
            if !haystack.contains(keyword.as_str()) {
                continue;
            }
            let whole_word = occurs_as_word(&haystack, keyword);
            let mut score = keyword.chars().count();
            if whole_word {
                score += WHOLE_WORD_BONUS;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(KeywordHit {
                    entry_index: *entry_index,
                    keyword: keyword.clone(),
                    score,
                    whole_word,
                });
            }
        }
        best
    }
}

/// True if some occurrence of `needle`, overlapping ones included, has
/// whitespace (or the text edge) on both sides.
fn occurs_as_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        if before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace) {
            return true;
        }
        // Step one char so overlapping occurrences are checked too
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawRecord, UNKNOWN_INDUSTRY};
    use crate::taxonomy::TaxonomyEntry;

    fn entry(code: &str, name: &str, keywords: &[&str], compliance: &[&str]) -> TaxonomyEntry {
        TaxonomyEntry {
            code: code.into(),
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            compliance: compliance.iter().map(|c| c.to_string()).collect(),
            tier: Default::default(),
        }
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_entries(vec![
            entry("238210", "Electrical Contractor", &["electrical contractor", "electric"], &["CSA Z96"]),
            entry("311611", "Food Processor", &["food processing", "meat"], &["HACCP", "CFIA"]),
            entry("811111", "Auto Shop", &["auto repair", "mechanic"], &["WHMIS"]),
            entry("332710", "Machine Shop", &["machining", "machine shop"], &["WHMIS"]),
        ])
        .unwrap()
    }

    #[test]
    fn food_processing_scenario() {
        let tax = taxonomy();
        let c = Classifier::new(&tax).classify("ABC Food Processing Inc, HACCP certified plant");
        assert_eq!(c.naics_code.as_deref(), Some("311611"));
        assert_eq!(c.industry, "Food Processor");
        assert!(c.compliance.contains("HACCP"));
        assert!(c.compliance.contains("CFIA"));
    }

    #[test]
    fn empty_and_unmatched_text_unclassified() {
        let tax = taxonomy();
        let classifier = Classifier::new(&tax);
        assert_eq!(classifier.classify(""), Classification::unclassified());
        assert_eq!(classifier.classify("   "), Classification::unclassified());
        let c = classifier.classify("no matching words at all");
        assert_eq!(c.naics_code, None);
        assert_eq!(c.industry, UNKNOWN_INDUSTRY);
        assert!(c.compliance.is_empty());
    }

    #[test]
    fn longer_keyword_outranks_shorter() {
        let tax = taxonomy();
        // "meat" (4+5) vs "electrical contractor" (21+5)
        let c = Classifier::new(&tax).classify("Meat & Electrical Contractor Supply");
        assert_eq!(c.naics_code.as_deref(), Some("238210"));
    }

    #[test]
    fn whole_word_bonus_applies() {
        let tax = taxonomy();
        let classifier = Classifier::new(&tax);

        let hit = classifier.best_hit("Bow Electric").unwrap();
        assert!(hit.whole_word);
        assert_eq!(hit.score, "electric".len() + WHOLE_WORD_BONUS);

        // Fragment of "electrical": no bonus
        let hit = classifier.best_hit("Electricals Depot").unwrap();
        assert_eq!(hit.keyword, "electric");
        assert!(!hit.whole_word);
        assert_eq!(hit.score, "electric".len());
    }

    #[test]
    fn whole_word_beats_longer_fragment() {
        let tax = Taxonomy::from_entries(vec![
            entry("1", "Fragment", &["fab weldin"], &[]),
            entry("2", "Word", &["welding"], &[]),
        ])
        .unwrap();
        let classifier = Classifier::new(&tax);
        // "fab weldin" is a fragment (10), "welding" a whole word (7 + 5)
        assert_eq!(classifier.classify("Steel Fab Welding").naics_code.as_deref(), Some("2"));
        // Both fragments: longer wins
        assert_eq!(classifier.classify("Steel Fab Weldings").naics_code.as_deref(), Some("1"));
    }

    #[test]
    fn only_whitespace_bounds_a_word() {
        assert!(occurs_as_word("joes mechanic ltd", "mechanic"));
        assert!(occurs_as_word("mechanic", "mechanic"));
        assert!(!occurs_as_word("mechanics", "mechanic"));
        assert!(occurs_as_word("mechanics and mechanic", "mechanic"));
        // Punctuation does not end a word
        assert!(!occurs_as_word("joe's mechanic, ltd", "mechanic"));
        assert!(!occurs_as_word("auto-repair", "auto"));
    }

    #[test]
    fn overlapping_occurrences_checked() {
        // First match at 1 is glued to "x"; the one at 3 stands alone
        assert!(occurs_as_word("xa a a", "a a"));
        assert!(!occurs_as_word("xa a ax", "a a"));
    }

    #[test]
    fn hyphenated_fragment_gets_no_bonus() {
        let tax = Taxonomy::from_entries(vec![
            entry("frag", "Fragment", &["auto-rep"], &[]),
            entry("word", "Word", &["auto"], &[]),
        ])
        .unwrap();
        let classifier = Classifier::new(&tax);
        let hit = classifier.best_hit("Joe's auto-repair").unwrap();
        // "auto-rep" (8) beats "auto" (4, no bonus inside "auto-repair")
        assert_eq!(hit.keyword, "auto-rep");
        assert_eq!(hit.score, 8);
        assert_eq!(classifier.classify("Joe's auto-repair").naics_code.as_deref(), Some("frag"));
        // Standalone "auto" earns the bonus
        assert_eq!(classifier.classify("Joe's auto shop").naics_code.as_deref(), Some("word"));
    }
}
