//! Keyword Matcher — scans normalized text against the pattern catalog.
//!
//! Two scan modes:
//! - `scan`: plain substring containment. Intentionally over-triggers to
//!   favor recall on short strings (domains, queries).
//! - `scan_word_bounded`: `\b`-anchored matching for the standalone
//!   text-analysis path, so "class" never trips on "ass".
//!
//! Category attribution is deterministic: strict match-count maximum wins,
//! ties resolve by `HarmCategory::PRIORITY` (nsfw > violence > suicide).

use std::sync::Arc;

use crate::catalog::PatternCatalog;
use crate::types::HarmCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub phrase: String,
    pub category: HarmCategory,
}

pub struct KeywordMatcher {
    catalog: Arc<PatternCatalog>,
}

impl KeywordMatcher {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    /// Substring scan over the active categories. A phrase is reported once
    /// even if it occurs multiple times in the blob.
    pub fn scan(&self, text: &str, active: &[HarmCategory]) -> Vec<KeywordMatch> {
        let blob = text.to_lowercase();
        let mut matches = Vec::new();
        for category in self.active_in_priority_order(active) {
            for phrase in self.catalog.phrases(category) {
                if blob.contains(phrase.as_str()) {
                    matches.push(KeywordMatch { phrase: phrase.clone(), category });
                }
            }
        }
        matches
    }

    /// Word-boundary scan over the active categories.
    pub fn scan_word_bounded(&self, text: &str, active: &[HarmCategory]) -> Vec<KeywordMatch> {
        let blob = text.to_lowercase();
        let mut matches = Vec::new();
        for category in self.active_in_priority_order(active) {
            let phrases = self.catalog.phrases(category);
            for (phrase, re) in phrases.iter().zip(self.catalog.word_bounded(category)) {
                if re.is_match(&blob) {
                    matches.push(KeywordMatch { phrase: phrase.clone(), category });
                }
            }
        }
        matches
    }

    /// Attribute a final merged evidence set to one category.
    ///
    /// Each evidence string counts toward the first priority-ordered
    /// category owning a phrase contained in it (exact catalog phrases hit
    /// their own category; remote object labels such as "graphic violence
    /// scene" attribute by containment). Strict maximum wins; a tie keeps
    /// the higher-priority category; no countable evidence means no
    /// attribution.
    pub fn dominant_category(&self, evidence: &[String]) -> Option<HarmCategory> {
        if evidence.is_empty() {
            return None;
        }

        let mut counts = [0usize; HarmCategory::PRIORITY.len()];
        for item in evidence {
            let item = item.to_lowercase();
            for (slot, category) in HarmCategory::PRIORITY.into_iter().enumerate() {
                let owned = self
                    .catalog
                    .phrases(category)
                    .iter()
                    .any(|p| item == *p || item.contains(p.as_str()));
                if owned {
                    counts[slot] += 1;
                    break;
                }
            }
        }

        let mut best: Option<(HarmCategory, usize)> = None;
        for (slot, category) in HarmCategory::PRIORITY.into_iter().enumerate() {
            if counts[slot] > best.map(|(_, n)| n).unwrap_or(0) {
                best = Some((category, counts[slot]));
            }
        }
        best.map(|(category, _)| category)
    }

    fn active_in_priority_order(&self, active: &[HarmCategory]) -> Vec<HarmCategory> {
        HarmCategory::PRIORITY
            .into_iter()
            .filter(|c| active.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(Arc::new(PatternCatalog::builtin()))
    }

    const ALL: [HarmCategory; 3] = HarmCategory::PRIORITY;

    #[test]
    fn substring_scan_is_case_insensitive() {
        let m = matcher();
        let upper = m.scan("Free PORN here", &ALL);
        let lower = m.scan("free porn here", &ALL);
        assert_eq!(upper, lower);
        assert!(upper.iter().any(|k| k.phrase == "porn"));
    }

    #[test]
    fn substring_scan_over_triggers_inside_words() {
        let m = matcher();
        let matches = m.scan("skill building exercises", &ALL);
        assert!(matches.iter().any(|k| k.phrase == "kill"), "recall over precision");
    }

    #[test]
    fn word_bounded_scan_ignores_embedded_substrings() {
        let m = matcher();
        assert!(m.scan_word_bounded("skill building exercises", &ALL).is_empty());
        let matches = m.scan_word_bounded("how to kill time", &ALL);
        assert!(matches.iter().any(|k| k.phrase == "kill"));
    }

    #[test]
    fn scan_respects_category_filter() {
        let m = matcher();
        let only_violence = m.scan("porn and gore", &[HarmCategory::Violence]);
        assert_eq!(only_violence.len(), 1);
        assert_eq!(only_violence[0].category, HarmCategory::Violence);
    }

    #[test]
    fn phrase_reported_once_per_scan() {
        let m = matcher();
        let matches = m.scan("porn porn porn", &ALL);
        assert_eq!(matches.iter().filter(|k| k.phrase == "porn").count(), 1);
    }

    #[test]
    fn dominant_category_counts_strict_maximum() {
        let m = matcher();
        let evidence = vec!["gore".into(), "murder".into(), "porn".into()];
        assert_eq!(m.dominant_category(&evidence), Some(HarmCategory::Violence));
    }

    #[test]
    fn dominant_category_tie_break_is_deterministic() {
        let m = matcher();
        let evidence = vec!["porn".into(), "gore".into()];
        for _ in 0..10 {
            assert_eq!(m.dominant_category(&evidence), Some(HarmCategory::Nsfw));
        }
        let evidence = vec!["gore".into(), "suicide".into()];
        assert_eq!(m.dominant_category(&evidence), Some(HarmCategory::Violence));
    }

    #[test]
    fn dominant_category_empty_evidence_is_none() {
        let m = matcher();
        assert_eq!(m.dominant_category(&[]), None);
        // Evidence no category owns (e.g. a denylist domain with no trigger
        // phrase inside) does not force an attribution either.
        assert_eq!(m.dominant_category(&["example.org".into()]), None);
    }

    #[test]
    fn dominant_category_attributes_labels_by_containment() {
        let m = matcher();
        let evidence = vec!["graphic violence scene".into()];
        assert_eq!(m.dominant_category(&evidence), Some(HarmCategory::Violence));
    }
}
