//! Pattern Catalog — the immutable trigger-phrase, educational-term, and
//! denylist tables every other component reads.
//!
//! Built once at process start and shared by reference; construction fails
//! fast on an empty category, a phrase claimed by two categories, or an
//! empty term table. Nothing here mutates after load.

use std::collections::HashMap;

use regex::Regex;

use crate::error::CatalogError;
use crate::types::HarmCategory;

// ── Built-in tables ────────────────────────────────────────────────────────

const NSFW_PATTERNS: &[&str] = &[
    "porn", "xxx", "nudity", "naked", "sex video", "adult content",
    "pornography", "erotic", "nsfw", "explicit", "onlyfans",
];

const VIOLENCE_PATTERNS: &[&str] = &[
    "violence", "gore", "blood", "kill", "murder", "dead body",
    "graphic violence", "brutal", "fight video", "torture", "death",
];

const SUICIDE_PATTERNS: &[&str] = &[
    "suicide", "kill myself", "self-harm", "how to die", "end my life",
    "suicide methods", "hanging myself", "painless suicide",
];

/// Educational-context indicators. Terms in [`STRONG_EDUCATIONAL_TERMS`]
/// weigh 2, everything else 1.
const EDUCATIONAL_TERMS: &[&str] = &[
    // General education terms
    "education", "research", "study", "information", "learn", "article",
    "report", "news", "medical", "health", "science", "history", "academic",
    // Academic and research terms
    "effects", "impact", "paper", "case study", "studies", "statistics",
    "psychological", "analysis", "assessment", "correlation", "comparison",
    "theory", "evidence", "data", "findings", "review", "journal", "bibliography",
    // Subject-specific terms
    "neurological", "psychology", "therapy", "counseling", "prevention",
    "awareness", "treatment", "mental health", "strategies", "recovery",
    "behavior", "cognitive", "development", "intervention", "methodology",
    // Educational roles and institutions
    "school", "university", "college", "classroom", "teacher", "student",
    "professor", "counselor", "program", "curriculum", "dissertation", "thesis",
    // Paper and document types
    "literature", "publication", "dissertation", "thesis", "journal",
    "proceedings", "textbook", "encyclopedia", "bibliography", "citation",
    "scholarly",
];

const STRONG_EDUCATIONAL_TERMS: &[&str] = &[
    "research", "study", "paper", "academic", "psychology",
    "education", "prevention", "awareness", "effects", "impact",
];

/// Domains blocked unconditionally, at any sensitivity. Matched by
/// substring containment against the checked domain.
const KNOWN_HARMFUL_DOMAINS: &[&str] = &[
    "pornhub.com", "xvideos.com", "xnxx.com",
    "bestgore.com", "liveleak.com",
    "suicidemethod.com", "howtokillmyself.com",
];

// ── Pattern Catalog ────────────────────────────────────────────────────────

/// Immutable mapping of harm category → ordered trigger phrases, plus the
/// fixed known-harmful-domain denylist. Word-boundary regexes for the
/// standalone text-analysis path are compiled once here.
pub struct PatternCatalog {
    phrases: HashMap<HarmCategory, Vec<String>>,
    word_bounded: HashMap<HarmCategory, Vec<Regex>>,
    denylist: Vec<String>,
}

impl PatternCatalog {
    /// Catalog with the built-in pattern tables. The tables are static and
    /// validated, so this cannot fail at runtime.
    pub fn builtin() -> Self {
        Self::from_tables(
            &[
                (HarmCategory::Nsfw, NSFW_PATTERNS),
                (HarmCategory::Violence, VIOLENCE_PATTERNS),
                (HarmCategory::Suicide, SUICIDE_PATTERNS),
            ],
            KNOWN_HARMFUL_DOMAINS,
        )
        .expect("built-in pattern tables are valid")
    }

    /// Build a catalog from explicit tables. Fails on an empty category, a
    /// phrase present in more than one category, or an empty denylist.
    pub fn from_tables(
        tables: &[(HarmCategory, &[&str])],
        denylist: &[&str],
    ) -> Result<Self, CatalogError> {
        let mut phrases: HashMap<HarmCategory, Vec<String>> = HashMap::new();
        let mut word_bounded: HashMap<HarmCategory, Vec<Regex>> = HashMap::new();
        let mut owner: HashMap<String, HarmCategory> = HashMap::new();

        for category in HarmCategory::PRIORITY {
            let table = tables
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, t)| *t)
                .unwrap_or(&[]);

            let mut list: Vec<String> = Vec::with_capacity(table.len());
            let mut regexes: Vec<Regex> = Vec::with_capacity(table.len());
            for raw in table {
                let phrase = raw.trim().to_lowercase();
                if phrase.is_empty() || list.contains(&phrase) {
                    continue;
                }
                if let Some(first) = owner.get(&phrase) {
                    return Err(CatalogError::DuplicatePhrase {
                        phrase,
                        first: *first,
                        second: category,
                    });
                }
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(&phrase))).map_err(
                    |e| CatalogError::InvalidPhrase {
                        phrase: phrase.clone(),
                        reason: e.to_string(),
                    },
                )?;
                owner.insert(phrase.clone(), category);
                list.push(phrase);
                regexes.push(re);
            }

            if list.is_empty() {
                return Err(CatalogError::EmptyCategory(category));
            }
            phrases.insert(category, list);
            word_bounded.insert(category, regexes);
        }

        if denylist.is_empty() {
            return Err(CatalogError::EmptyDenylist);
        }
        let denylist = denylist.iter().map(|d| d.trim().to_lowercase()).collect();

        Ok(Self { phrases, word_bounded, denylist })
    }

    /// Trigger phrases for one category, in catalog order.
    pub fn phrases(&self, category: HarmCategory) -> &[String] {
        self.phrases.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Word-boundary regexes paired 1:1 with [`Self::phrases`].
    pub fn word_bounded(&self, category: HarmCategory) -> &[Regex] {
        self.word_bounded.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Categories in canonical priority order.
    pub fn categories(&self) -> impl Iterator<Item = HarmCategory> {
        HarmCategory::PRIORITY.into_iter()
    }

    /// The unconditional known-harmful-domain denylist.
    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }

    /// Exact denylist membership (not substring).
    pub fn denylist_contains(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.denylist.iter().any(|d| *d == domain)
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.values().map(Vec::len).sum()
    }
}

// ── Educational Term Set ───────────────────────────────────────────────────

/// Immutable phrase → weight table for educational-context scoring.
/// Weight 2 marks a strong indicator; everything else weighs 1.
pub struct EducationalTermSet {
    terms: Vec<(String, u32)>,
}

impl EducationalTermSet {
    pub fn builtin() -> Self {
        Self::from_terms(EDUCATIONAL_TERMS, STRONG_EDUCATIONAL_TERMS)
            .expect("built-in educational terms are valid")
    }

    /// Build from a term list plus the strong (weight-2) subset. Duplicates
    /// collapse to their first occurrence.
    pub fn from_terms(terms: &[&str], strong: &[&str]) -> Result<Self, CatalogError> {
        let mut out: Vec<(String, u32)> = Vec::with_capacity(terms.len());
        for raw in terms {
            let term = raw.trim().to_lowercase();
            if term.is_empty() || out.iter().any(|(t, _)| *t == term) {
                continue;
            }
            let weight = if strong.contains(&term.as_str()) { 2 } else { 1 };
            out.push((term, weight));
        }
        if out.is_empty() {
            return Err(CatalogError::EmptyTermSet);
        }
        Ok(Self { terms: out })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.terms.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads_all_categories() {
        let catalog = PatternCatalog::builtin();
        for category in HarmCategory::PRIORITY {
            assert!(!catalog.phrases(category).is_empty(), "{category} must have phrases");
            assert_eq!(
                catalog.phrases(category).len(),
                catalog.word_bounded(category).len(),
            );
        }
        assert!(!catalog.denylist().is_empty());
    }

    #[test]
    fn empty_category_is_fatal() {
        let result = PatternCatalog::from_tables(
            &[
                (HarmCategory::Nsfw, &["porn"]),
                (HarmCategory::Violence, &["gore"]),
            ],
            &["bad.example"],
        );
        assert!(matches!(
            result,
            Err(CatalogError::EmptyCategory(HarmCategory::Suicide))
        ));
    }

    #[test]
    fn cross_category_duplicate_is_fatal() {
        let result = PatternCatalog::from_tables(
            &[
                (HarmCategory::Nsfw, &["porn"]),
                (HarmCategory::Violence, &["porn", "gore"]),
                (HarmCategory::Suicide, &["suicide"]),
            ],
            &["bad.example"],
        );
        assert!(matches!(result, Err(CatalogError::DuplicatePhrase { .. })));
    }

    #[test]
    fn phrases_are_normalized_lowercase() {
        let catalog = PatternCatalog::from_tables(
            &[
                (HarmCategory::Nsfw, &["PORN", " porn ", "xxx"]),
                (HarmCategory::Violence, &["gore"]),
                (HarmCategory::Suicide, &["suicide"]),
            ],
            &["Bad.Example"],
        )
        .unwrap();
        assert_eq!(catalog.phrases(HarmCategory::Nsfw).to_vec(), ["porn", "xxx"]);
        assert!(catalog.denylist_contains("bad.example"));
        assert!(!catalog.denylist_contains("good.example"));
    }

    #[test]
    fn term_set_weights_and_dedup() {
        let set = EducationalTermSet::builtin();
        let weights: std::collections::HashMap<&str, u32> = set.iter().collect();
        assert_eq!(weights["research"], 2);
        assert_eq!(weights["journal"], 1);
        // Table source listed a few terms twice; the set keeps one entry.
        assert_eq!(set.iter().filter(|(t, _)| *t == "thesis").count(), 1);
    }

    #[test]
    fn empty_term_set_is_fatal() {
        assert!(matches!(
            EducationalTermSet::from_terms(&[], &[]),
            Err(CatalogError::EmptyTermSet)
        ));
    }
}
