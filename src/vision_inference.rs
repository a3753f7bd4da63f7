//! Image object-detection client — the image half of the Remote Signal
//! Adapter.
//!
//! Wraps a YOLO-style detection API: POST `{"image": url}` with the API key
//! as a query parameter, parse `{"predictions": [{class, confidence}]}`.
//! Probability is the max confidence over NSFW object classes; violence
//! classes count at a reduced weight. The URL shape is validated before any
//! network traffic, and every failure path degrades to unavailable.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{EnginePolicy, RemoteConfig};
use crate::error::{FilterError, FilterResult};
use crate::remote::RemoteScore;

/// Object classes treated as NSFW evidence at full confidence.
const NSFW_OBJECT_CLASSES: &[&str] = &[
    "nude", "pornography", "nudity", "explicit", "sexual",
    "adult", "naked", "nsfw", "explicit content",
];

/// Object classes treated as violence evidence, weighted down relative to
/// the NSFW classes.
const VIOLENCE_OBJECT_CLASSES: &[&str] = &[
    "blood", "gore", "weapon", "gun", "knife", "injury",
    "dead body", "violence", "wound", "graphic",
];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

// ── Wire shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    #[serde(default)]
    class: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectionResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

impl DetectionResponse {
    /// Collapse predictions into one harmfulness probability plus labels.
    pub(crate) fn into_score(self, violence_weight: f64) -> RemoteScore {
        let mut probability = 0.0f64;
        let mut labels = Vec::with_capacity(self.predictions.len());
        for p in self.predictions {
            let class = p.class.to_lowercase();
            if NSFW_OBJECT_CLASSES.contains(&class.as_str()) {
                probability = probability.max(p.confidence);
            } else if VIOLENCE_OBJECT_CLASSES.contains(&class.as_str()) {
                probability = probability.max(p.confidence * violence_weight);
            }
            labels.push(p.class);
        }
        RemoteScore::available(probability, labels)
    }
}

// ── Client ─────────────────────────────────────────────────────────────────

pub struct ImageDetectionClient {
    endpoint: String,
    api_key: String,
    violence_weight: f64,
    client: reqwest::Client,
}

impl ImageDetectionClient {
    pub fn new(remote: &RemoteConfig, policy: &EnginePolicy) -> FilterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(remote.timeout_secs))
            .user_agent(remote.user_agent.clone())
            .build()
            .map_err(|e| FilterError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            endpoint: remote.image_endpoint.clone(),
            api_key: remote.image_api_key.clone(),
            violence_weight: policy.violence_class_weight,
            client,
        })
    }

    /// Detect objects in the image behind `image_url`. Every failure path
    /// returns [`RemoteScore::unavailable`].
    pub async fn analyze(&self, image_url: &str) -> RemoteScore {
        if !is_probable_image_url(image_url) {
            warn!(url = %image_url, "Rejected non-image URL before dispatch");
            return RemoteScore::unavailable();
        }
        if self.api_key.is_empty() || self.endpoint.is_empty() {
            debug!("Image inference skipped: no credentials configured");
            return RemoteScore::unavailable();
        }

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str())])
            .json(&serde_json::json!({ "image": image_url }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Image inference request failed");
                return RemoteScore::unavailable();
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "Image inference returned non-success");
            return RemoteScore::unavailable();
        }

        match response.json::<DetectionResponse>().await {
            Ok(parsed) => {
                let score = parsed.into_score(self.violence_weight);
                debug!(probability = score.probability, labels = score.labels.len(),
                       "Image inference scored");
                score
            }
            Err(e) => {
                warn!(error = %e, "Unrecognized image inference response shape");
                RemoteScore::unavailable()
            }
        }
    }
}

/// Scheme + host sanity check, and when the path carries an extension it
/// must be a known image one.
pub(crate) fn is_probable_image_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    let rest = match lower.strip_prefix("https://").or_else(|| lower.strip_prefix("http://")) {
        Some(r) => r,
        None => return false,
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    if host.is_empty() || !host.contains('.') {
        return false;
    }
    let path = path.split(['?', '#']).next().unwrap_or("");
    let last = path.rsplit('/').next().unwrap_or("");
    if last.contains('.') {
        return IMAGE_EXTENSIONS.iter().any(|ext| last.ends_with(ext));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nsfw_class_sets_probability() {
        let raw = r#"{"predictions": [{"class": "nude", "confidence": 0.91},
                                       {"class": "person", "confidence": 0.99}]}"#;
        let parsed: DetectionResponse = serde_json::from_str(raw).unwrap();
        let score = parsed.into_score(0.8);
        assert_eq!(score.probability, 0.91);
        assert_eq!(score.labels, ["nude", "person"]);
    }

    #[test]
    fn violence_class_is_down_weighted() {
        let raw = r#"{"predictions": [{"class": "Weapon", "confidence": 0.9}]}"#;
        let parsed: DetectionResponse = serde_json::from_str(raw).unwrap();
        let score = parsed.into_score(0.8);
        assert!((score.probability - 0.72).abs() < 1e-9);
    }

    #[test]
    fn empty_predictions_score_zero() {
        let parsed: DetectionResponse = serde_json::from_str("{}").unwrap();
        let score = parsed.into_score(0.8);
        assert!(score.available);
        assert_eq!(score.probability, 0.0);
        assert!(score.labels.is_empty());
    }

    #[test]
    fn image_url_validation() {
        assert!(is_probable_image_url("https://cdn.example.com/pics/a.jpg"));
        assert!(is_probable_image_url("http://cdn.example.com/a.PNG"));
        assert!(is_probable_image_url("https://cdn.example.com/a.webp?size=large"));
        // No extension: let the detector decide.
        assert!(is_probable_image_url("https://cdn.example.com/render/12345"));
        assert!(!is_probable_image_url("ftp://cdn.example.com/a.jpg"));
        assert!(!is_probable_image_url("https://cdn.example.com/doc.pdf"));
        assert!(!is_probable_image_url("not a url"));
        assert!(!is_probable_image_url("https:///a.jpg"));
    }
}
