//! Remote Signal Adapter seam — the abstract scoring capability the verdict
//! engine depends on, and the production implementation bridging the text
//! and image inference clients.
//!
//! Adapters NEVER propagate failures: timeouts, non-2xx responses,
//! malformed payloads, and absent credentials all collapse into
//! [`RemoteScore::unavailable`], which callers treat as "no additional
//! evidence" — not as probability zero.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::PatternCatalog;
use crate::config::{EnginePolicy, RemoteConfig};
use crate::error::FilterResult;
use crate::text_inference::TextSentimentClient;
use crate::vision_inference::ImageDetectionClient;

/// Probability plus detected labels from an external inference service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteScore {
    pub probability: f64,
    pub labels: Vec<String>,
    pub available: bool,
}

impl RemoteScore {
    pub fn available(probability: f64, labels: Vec<String>) -> Self {
        Self { probability: probability.clamp(0.0, 1.0), labels, available: true }
    }

    /// The degraded value: no probability, no labels, no evidence.
    pub fn unavailable() -> Self {
        Self { probability: 0.0, labels: Vec::new(), available: false }
    }
}

/// Abstract scoring capability over the two remote services. The engine is
/// generic over this seam so tests can inject canned scores.
pub trait RemoteSignal: Send + Sync {
    /// Score raw text, truncated to `max_chars` before sending.
    fn score_text(&self, text: &str, max_chars: usize)
        -> impl Future<Output = RemoteScore> + Send;

    /// Score an image by URL reference.
    fn score_image(&self, image_url: &str) -> impl Future<Output = RemoteScore> + Send;
}

/// Production adapter: text sentiment + image object detection over HTTP.
pub struct InferenceBridge {
    text: TextSentimentClient,
    vision: ImageDetectionClient,
}

impl InferenceBridge {
    pub fn new(
        remote: &RemoteConfig,
        policy: &EnginePolicy,
        catalog: Arc<PatternCatalog>,
    ) -> FilterResult<Self> {
        Ok(Self {
            text: TextSentimentClient::new(remote, policy, catalog)?,
            vision: ImageDetectionClient::new(remote, policy)?,
        })
    }
}

impl RemoteSignal for InferenceBridge {
    async fn score_text(&self, text: &str, max_chars: usize) -> RemoteScore {
        self.text.analyze(text, max_chars).await
    }

    async fn score_image(&self, image_url: &str) -> RemoteScore {
        self.vision.analyze(image_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_clamps_probability() {
        let score = RemoteScore::available(1.7, vec!["porn".into()]);
        assert_eq!(score.probability, 1.0);
        assert!(score.available);
    }

    #[test]
    fn unavailable_carries_no_evidence() {
        let score = RemoteScore::unavailable();
        assert!(!score.available);
        assert_eq!(score.probability, 0.0);
        assert!(score.labels.is_empty());
    }
}
