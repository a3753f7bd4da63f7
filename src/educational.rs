//! Educational Context Scorer — weighted evidence that a blob is
//! educational material rather than harmful content.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::EducationalTermSet;

/// Outcome of one scoring pass. `score` sums term weights (strong terms
/// weigh 2); `distinct_terms` counts how many different terms matched,
/// which is what the stricter image-path bar checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationalSignal {
    pub score: u32,
    pub distinct_terms: u32,
}

pub struct EducationalScorer {
    terms: Arc<EducationalTermSet>,
}

impl EducationalScorer {
    pub fn new(terms: Arc<EducationalTermSet>) -> Self {
        Self { terms }
    }

    /// Substring scan over the term table. A term contributes once no
    /// matter how often it appears.
    pub fn score(&self, text: &str) -> EducationalSignal {
        let blob = text.to_lowercase();
        let mut signal = EducationalSignal::default();
        for (term, weight) in self.terms.iter() {
            if blob.contains(term) {
                signal.score += weight;
                signal.distinct_terms += 1;
            }
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> EducationalScorer {
        EducationalScorer::new(Arc::new(EducationalTermSet::builtin()))
    }

    #[test]
    fn strong_terms_weigh_double() {
        let s = scorer();
        let strong = s.score("new research released");
        assert_eq!(strong, EducationalSignal { score: 2, distinct_terms: 1 });
        let weak = s.score("read this journal");
        assert_eq!(weak, EducationalSignal { score: 1, distinct_terms: 1 });
    }

    #[test]
    fn terms_contribute_once() {
        let s = scorer();
        let once = s.score("research");
        let thrice = s.score("research research research");
        assert_eq!(once, thrice);
    }

    #[test]
    fn mixed_terms_accumulate() {
        let s = scorer();
        // "research" (2) + "prevention" (2) + "journal" (1)
        let signal = s.score("a research journal on prevention");
        assert_eq!(signal.score, 5);
        assert_eq!(signal.distinct_terms, 3);
    }

    #[test]
    fn no_terms_scores_zero() {
        let s = scorer();
        assert_eq!(s.score("cat pictures"), EducationalSignal::default());
    }
}
