//! Text-sentiment inference client — the text half of the Remote Signal
//! Adapter.
//!
//! Wraps a Hugging-Face-style inference endpoint: POST `{"inputs": text}`
//! with bearer credentials, bounded timeout, input truncation. The service
//! answers in one of two shapes (a list of label/score pairs, or parallel
//! `labels`/`scores` lists); both normalize into one [`RemoteScore`], and
//! anything else degrades to unavailable. The NEGATIVE sentiment score is
//! blended with a word-boundary keyword scan before returning.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::PatternCatalog;
use crate::config::{EnginePolicy, RemoteConfig};
use crate::error::{FilterError, FilterResult};
use crate::matcher::KeywordMatcher;
use crate::remote::RemoteScore;
use crate::types::HarmCategory;

const NEGATIVE_LABEL: &str = "NEGATIVE";

// ── Wire shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LabelScore {
    label: String,
    score: f64,
}

/// The two response shapes the sentiment service is known to produce.
/// Unrecognized payloads fail deserialization and count as unavailable.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SentimentResponse {
    /// `[[{"label": "NEGATIVE", "score": 0.9}, ...]]`
    Nested(Vec<Vec<LabelScore>>),
    /// `[{"label": "NEGATIVE", "score": 0.9}, ...]`
    Flat(Vec<LabelScore>),
    /// `{"labels": ["NEGATIVE", ...], "scores": [0.9, ...]}`
    Labeled { labels: Vec<String>, scores: Vec<f64> },
}

impl SentimentResponse {
    /// Extract the NEGATIVE label score; absent label reads as 0.0.
    pub(crate) fn negative_score(&self) -> f64 {
        match self {
            SentimentResponse::Nested(outer) => outer
                .first()
                .and_then(|preds| preds.iter().find(|p| p.label == NEGATIVE_LABEL))
                .map(|p| p.score)
                .unwrap_or(0.0),
            SentimentResponse::Flat(preds) => preds
                .iter()
                .find(|p| p.label == NEGATIVE_LABEL)
                .map(|p| p.score)
                .unwrap_or(0.0),
            SentimentResponse::Labeled { labels, scores } => labels
                .iter()
                .zip(scores)
                .find(|(label, _)| *label == NEGATIVE_LABEL)
                .map(|(_, score)| *score)
                .unwrap_or(0.0),
        }
    }
}

/// Final probability: the remote negative score, floored by keyword
/// evidence at `step` per keyword, capped at 1.0.
pub(crate) fn blend_keyword_probability(negative: f64, keyword_count: usize, step: f64) -> f64 {
    let keyword_factor = (keyword_count as f64 * step).min(1.0);
    negative.max(keyword_factor)
}

// ── Client ─────────────────────────────────────────────────────────────────

pub struct TextSentimentClient {
    endpoint: String,
    api_key: String,
    keyword_step: f64,
    client: reqwest::Client,
    matcher: KeywordMatcher,
}

impl TextSentimentClient {
    pub fn new(
        remote: &RemoteConfig,
        policy: &EnginePolicy,
        catalog: Arc<PatternCatalog>,
    ) -> FilterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(remote.timeout_secs))
            .user_agent(remote.user_agent.clone())
            .build()
            .map_err(|e| FilterError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            endpoint: remote.text_endpoint.clone(),
            api_key: remote.text_api_key.clone(),
            keyword_step: policy.keyword_probability_step,
            client,
            matcher: KeywordMatcher::new(catalog),
        })
    }

    /// Analyze text: word-boundary keyword scan, one remote call, blend.
    /// Every failure path returns [`RemoteScore::unavailable`].
    pub async fn analyze(&self, text: &str, max_chars: usize) -> RemoteScore {
        if self.api_key.is_empty() || self.endpoint.is_empty() {
            debug!("Text inference skipped: no credentials configured");
            return RemoteScore::unavailable();
        }

        let keywords: Vec<String> = self
            .matcher
            .scan_word_bounded(text, &HarmCategory::PRIORITY)
            .into_iter()
            .map(|k| k.phrase)
            .collect();

        let truncated: String = text.chars().take(max_chars).collect();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": truncated }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Text inference request failed");
                return RemoteScore::unavailable();
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "Text inference returned non-success");
            return RemoteScore::unavailable();
        }

        let parsed = match response.json::<SentimentResponse>().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Unrecognized text inference response shape");
                return RemoteScore::unavailable();
            }
        };

        let negative = parsed.negative_score();
        let probability = blend_keyword_probability(negative, keywords.len(), self.keyword_step);
        debug!(negative, keywords = keywords.len(), probability, "Text inference scored");
        RemoteScore::available(probability, keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_pair_shape() {
        let raw = r#"[[{"label": "NEGATIVE", "score": 0.92}, {"label": "POSITIVE", "score": 0.08}]]"#;
        let parsed: SentimentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.negative_score(), 0.92);
    }

    #[test]
    fn parses_flat_pair_shape() {
        let raw = r#"[{"label": "POSITIVE", "score": 0.7}, {"label": "NEGATIVE", "score": 0.3}]"#;
        let parsed: SentimentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.negative_score(), 0.3);
    }

    #[test]
    fn parses_labeled_lists_shape() {
        let raw = r#"{"sequence": "text", "labels": ["NEGATIVE", "POSITIVE"], "scores": [0.88, 0.12]}"#;
        let parsed: SentimentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.negative_score(), 0.88);
    }

    #[test]
    fn missing_negative_label_reads_zero() {
        let raw = r#"[[{"label": "POSITIVE", "score": 0.99}]]"#;
        let parsed: SentimentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.negative_score(), 0.0);
    }

    #[test]
    fn unrecognized_shape_is_rejected() {
        let raw = r#"{"error": "model loading"}"#;
        assert!(serde_json::from_str::<SentimentResponse>(raw).is_err());
    }

    #[test]
    fn blending_floors_on_keyword_evidence() {
        // Three keywords floor the probability at 0.6 even when the remote
        // score is lower.
        assert!((blend_keyword_probability(0.1, 3, 0.2) - 0.6).abs() < 1e-9);
        // The remote score wins when higher.
        assert_eq!(blend_keyword_probability(0.9, 1, 0.2), 0.9);
        // The keyword factor caps at 1.0.
        assert_eq!(blend_keyword_probability(0.0, 9, 0.2), 1.0);
        assert_eq!(blend_keyword_probability(0.0, 0, 0.2), 0.0);
    }
}
