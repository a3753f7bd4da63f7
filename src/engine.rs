//! Content Classifier — the verdict engine.
//!
//! Orchestrates keyword matching, educational-context scoring, sensitivity
//! policy, and the optional remote secondary pass into one verdict per
//! request type (query / page content / domain / image). Stateless between
//! requests: all shared state is read-only after construction, so any
//! number of classifications may run in parallel. The only blocking
//! operation is the remote call, bounded by the adapter's timeout; remote
//! failures degrade to keyword-only verdicts and are never surfaced to the
//! caller.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::{EducationalTermSet, PatternCatalog};
use crate::config::{EngineConfig, EnginePolicy};
use crate::educational::EducationalScorer;
use crate::error::{FilterError, FilterResult};
use crate::matcher::KeywordMatcher;
use crate::remote::{InferenceBridge, RemoteSignal};
use crate::types::*;

const MAX_ALERTS: usize = 5_000;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ClassifierReport {
    pub total_analyzed: u64,
    pub total_flagged: u64,
    pub flag_rate_pct: f64,
}

pub struct ContentClassifier<R: RemoteSignal> {
    catalog: Arc<PatternCatalog>,
    matcher: KeywordMatcher,
    educational: EducationalScorer,
    policy: EnginePolicy,
    remote: R,
    max_text_chars: usize,
    alerts: RwLock<Vec<FilterAlert>>,
    total_analyzed: AtomicU64,
    total_flagged: AtomicU64,
    enabled: bool,
}

impl ContentClassifier<InferenceBridge> {
    /// Production classifier: built-in catalog and term set, HTTP-backed
    /// remote adapter. Fails fast on a misconfigured HTTP client.
    pub fn from_config(config: &EngineConfig) -> FilterResult<Self> {
        let catalog = Arc::new(PatternCatalog::builtin());
        let terms = Arc::new(EducationalTermSet::builtin());
        let remote = InferenceBridge::new(&config.remote, &config.policy, catalog.clone())?;
        Ok(Self::new(catalog, terms, config, remote))
    }
}

impl<R: RemoteSignal> ContentClassifier<R> {
    pub fn new(
        catalog: Arc<PatternCatalog>,
        terms: Arc<EducationalTermSet>,
        config: &EngineConfig,
        remote: R,
    ) -> Self {
        Self {
            matcher: KeywordMatcher::new(catalog.clone()),
            educational: EducationalScorer::new(terms),
            catalog,
            policy: config.policy.clone(),
            remote,
            max_text_chars: config.remote.max_text_chars,
            alerts: RwLock::new(Vec::new()),
            total_analyzed: AtomicU64::new(0),
            total_flagged: AtomicU64::new(0),
            enabled: true,
        }
    }

    // ── Search queries ─────────────────────────────────────────────────────

    pub async fn classify_query(&self, req: &QueryRequest) -> FilterResult<Verdict> {
        if !self.enabled {
            return Ok(Verdict::allowed());
        }
        if req.query.trim().is_empty() {
            return Err(FilterError::invalid("query", "must not be empty"));
        }
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        info!(query = %req.query, "Analyzing search query");

        let matches = self.matcher.scan(&req.query, &req.categories);
        let mut evidence: Vec<String> = matches.into_iter().map(|k| k.phrase).collect();
        let mut is_harmful = !evidence.is_empty();

        if is_harmful && req.educational_mode {
            let signal = self.educational.score(&req.query);
            debug!(score = signal.score, "Educational score for query");
            if signal.score >= self.policy.text_educational_min_score {
                is_harmful = false;
                info!("Educational context detected, allowing query");
            }
        }

        match req.sensitivity {
            Sensitivity::Low => {
                if evidence.len() < self.policy.query_low_min_matches {
                    is_harmful = false;
                }
            }
            Sensitivity::Medium => {}
            Sensitivity::High => {
                if !is_harmful {
                    let score = self.remote.score_text(&req.query, self.max_text_chars).await;
                    if score.available {
                        if score.probability > self.policy.query_remote_promotion {
                            is_harmful = true;
                        }
                        evidence.extend(score.labels);
                    } else {
                        debug!("Remote signal unavailable, keeping keyword-only verdict");
                    }
                }
            }
        }

        Ok(self.finish_text_verdict("query", is_harmful, evidence))
    }

    // ── Page content ───────────────────────────────────────────────────────

    pub async fn classify_content(&self, req: &ContentRequest) -> FilterResult<Verdict> {
        if !self.enabled {
            return Ok(Verdict::allowed());
        }
        if req.title.trim().is_empty() && req.body.trim().is_empty() {
            return Err(FilterError::invalid("content", "requires a title or a body"));
        }
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        info!(url = %req.url, "Analyzing page content");

        let blob = format!("{} {}", req.title, req.body);
        let matches = self.matcher.scan(&blob, &req.categories);
        let mut evidence: Vec<String> = matches.into_iter().map(|k| k.phrase).collect();
        let mut is_harmful = !evidence.is_empty();

        if is_harmful && req.educational_mode {
            let signal = self.educational.score(&blob);
            debug!(score = signal.score, url = %req.url, "Educational score for content");
            if signal.score >= self.policy.text_educational_min_score {
                is_harmful = false;
                info!("Educational context detected, allowing content");
            }
        }

        // Low and medium require multiple matches; high keeps any single
        // match and adds the remote pass below.
        if req.sensitivity != Sensitivity::High
            && evidence.len() < self.policy.content_min_matches(req.sensitivity)
        {
            is_harmful = false;
        }

        if req.sensitivity == Sensitivity::High && !is_harmful {
            let sample: String = {
                let body_sample: String =
                    req.body.chars().take(self.policy.content_remote_sample_chars).collect();
                format!("{} {}", req.title, body_sample)
            };
            let score = self.remote.score_text(&sample, self.max_text_chars).await;
            if score.available {
                if score.probability > self.policy.content_remote_promotion {
                    is_harmful = true;
                }
                evidence.extend(score.labels);
            } else {
                debug!("Remote signal unavailable, keeping keyword-only verdict");
            }
        }

        Ok(self.finish_text_verdict("content", is_harmful, evidence))
    }

    // ── Domains ────────────────────────────────────────────────────────────

    /// Domain checks never consult the remote adapter; the denylist is the
    /// one unconditional rule in the engine.
    pub fn classify_domain(&self, req: &DomainRequest) -> FilterResult<Verdict> {
        if !self.enabled {
            return Ok(Verdict::allowed());
        }
        if req.domain.trim().is_empty() {
            return Err(FilterError::invalid("domain", "must not be empty"));
        }
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        info!(domain = %req.domain, "Checking domain");

        let domain = req.domain.to_lowercase();
        let matches = self.matcher.scan(&domain, &req.categories);
        let mut evidence: Vec<String> = matches.into_iter().map(|k| k.phrase).collect();
        let mut is_harmful = !evidence.is_empty();

        let mut denylist_hit = false;
        for known in self.catalog.denylist() {
            if domain.contains(known.as_str()) {
                is_harmful = true;
                denylist_hit = true;
                evidence.push(known.clone());
                warn!(domain = %req.domain, matched = %known, "Domain on known-harmful list");
            }
        }

        // A single keyword hit on a domain the denylist does not know is
        // weak evidence at low sensitivity.
        if req.sensitivity == Sensitivity::Low && evidence.len() == 1 && !denylist_hit {
            is_harmful = false;
        }

        Ok(self.finish_text_verdict("domain", is_harmful, evidence))
    }

    // ── Images ─────────────────────────────────────────────────────────────

    pub async fn classify_image(&self, req: &ImageRequest) -> FilterResult<ImageVerdict> {
        let threshold = self.policy.image_threshold(req.sensitivity);
        if !self.enabled {
            return Ok(ImageVerdict {
                is_harmful: false,
                probability: 0.0,
                threshold,
                detected: Vec::new(),
                category: None,
            });
        }
        if req.image_url.trim().is_empty() {
            return Err(FilterError::invalid("image_url", "must not be empty"));
        }
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        info!(url = %req.image_url, "Analyzing image");

        let remote = self.remote.score_image(&req.image_url).await;
        let mut probability = remote.probability;
        if !remote.available {
            debug!("Image inference unavailable, keyword evidence only");
            probability = 0.0;
        }
        let mut detected: Vec<String> = remote.labels;

        let context = format!("{} {}", req.surrounding_text, req.alt_text);
        if !context.trim().is_empty() {
            let matches = self.matcher.scan(&context, &HarmCategory::PRIORITY);
            if !matches.is_empty() {
                let keyword_probability = (matches.len() as f64
                    * self.policy.keyword_probability_step)
                    .min(self.policy.image_keyword_probability_cap);
                probability = probability.max(keyword_probability);
                detected.extend(matches.into_iter().map(|k| k.phrase));
            }

            let signal = self.educational.score(&context);
            if signal.distinct_terms >= self.policy.image_educational_min_terms {
                // Soft discount, deliberately weaker than the text-path
                // hard override.
                probability *= self.policy.image_educational_discount;
                info!(
                    terms = signal.distinct_terms,
                    "Educational context detected in image analysis, reducing probability"
                );
            }
        }

        let is_harmful = probability > threshold;
        let detected = dedup_sorted(detected);
        let category = self.matcher.dominant_category(&detected);
        if is_harmful {
            self.total_flagged.fetch_add(1, Ordering::Relaxed);
            warn!(url = %req.image_url, probability, threshold, category = ?category,
                  "Image flagged harmful");
            self.add_alert(
                Severity::High,
                "Harmful image flagged",
                &format!(
                    "url={}, probability={probability:.3}, threshold={threshold:.2}",
                    req.image_url
                ),
            );
        }

        Ok(ImageVerdict { is_harmful, probability, threshold, detected, category })
    }

    // ── Self-test ──────────────────────────────────────────────────────────

    /// Sample verdict per category, for health/self-test surfaces. Uses the
    /// first few catalog phrases of each category as example evidence.
    pub fn category_probe(&self) -> Vec<(HarmCategory, Verdict)> {
        HarmCategory::PRIORITY
            .into_iter()
            .map(|category| {
                let sample: Vec<String> =
                    self.catalog.phrases(category).iter().take(3).cloned().collect();
                let verdict = Verdict {
                    is_harmful: true,
                    matched_keywords: dedup_sorted(sample),
                    category: Some(category),
                };
                (category, verdict)
            })
            .collect()
    }

    // ── Internals ──────────────────────────────────────────────────────────

    fn finish_text_verdict(&self, kind: &str, is_harmful: bool, evidence: Vec<String>) -> Verdict {
        let matched_keywords = dedup_sorted(evidence);
        let category = self.matcher.dominant_category(&matched_keywords);
        if is_harmful {
            self.total_flagged.fetch_add(1, Ordering::Relaxed);
            warn!(kind, category = ?category, matches = matched_keywords.len(),
                  "Content flagged harmful");
            self.add_alert(
                Severity::High,
                "Harmful content flagged",
                &format!("{kind}: matches={}", matched_keywords.len()),
            );
        }
        Verdict { is_harmful, matched_keywords, category }
    }

    fn add_alert(&self, severity: Severity, title: &str, details: &str) {
        let mut alerts = self.alerts.write();
        if alerts.len() >= MAX_ALERTS {
            alerts.remove(0);
        }
        alerts.push(FilterAlert {
            timestamp: chrono::Utc::now().timestamp(),
            severity,
            component: "content_classifier".into(),
            title: title.into(),
            details: details.into(),
        });
    }

    pub fn total_analyzed(&self) -> u64 { self.total_analyzed.load(Ordering::Relaxed) }
    pub fn total_flagged(&self) -> u64 { self.total_flagged.load(Ordering::Relaxed) }
    pub fn alerts(&self) -> Vec<FilterAlert> { self.alerts.read().clone() }
    pub fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled; }

    pub fn report(&self) -> ClassifierReport {
        let analyzed = self.total_analyzed.load(Ordering::Relaxed);
        let flagged = self.total_flagged.load(Ordering::Relaxed);
        ClassifierReport {
            total_analyzed: analyzed,
            total_flagged: flagged,
            flag_rate_pct: if analyzed == 0 {
                0.0
            } else {
                flagged as f64 / analyzed as f64 * 100.0
            },
        }
    }
}

fn dedup_sorted(evidence: Vec<String>) -> Vec<String> {
    evidence.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_sorted_is_stable() {
        let out = dedup_sorted(vec!["porn".into(), "gore".into(), "porn".into()]);
        assert_eq!(out, ["gore", "porn"]);
    }
}
