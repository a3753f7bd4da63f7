//! Engine configuration — every tunable threshold in one typed table,
//! loadable from TOML. Defaults reproduce the shipped policy exactly.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FilterError, FilterResult};
use crate::types::Sensitivity;

/// Top-level configuration: decision policy plus remote-inference wiring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: EnginePolicy,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl EngineConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| FilterError::Config(e.to_string()))?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Write the current configuration (e.g. to generate a template).
    pub fn save(&self, path: impl AsRef<Path>) -> FilterResult<()> {
        let raw = toml::to_string_pretty(self).map_err(|e| FilterError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }
}

/// Decision policy. These are the constants the verdict pipeline applies;
/// they are configuration, not magic numbers buried in match arms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Educational score at which the hard override clears a text/query/
    /// content verdict. A single weak term suffices by default.
    pub text_educational_min_score: u32,
    /// Distinct educational terms required before the image-path soft
    /// discount applies. Stricter than the text bar on purpose.
    pub image_educational_min_terms: u32,
    /// Multiplier applied to the blended image probability when the
    /// educational bar is met. A discount, not an override.
    pub image_educational_discount: f64,

    /// Per-keyword probability step when blending keyword evidence with a
    /// remote score.
    pub keyword_probability_step: f64,
    /// Cap on the keyword-derived probability for the image path.
    pub image_keyword_probability_cap: f64,
    /// Down-weight for violence-class object detections relative to nsfw.
    pub violence_class_weight: f64,

    /// Matched keywords required to keep a low-sensitivity query harmful.
    pub query_low_min_matches: usize,
    /// Matched keywords required to keep page content harmful, per
    /// sensitivity.
    pub content_low_min_matches: usize,
    pub content_medium_min_matches: usize,
    pub content_high_min_matches: usize,

    /// Remote probability above which a still-clear high-sensitivity query
    /// is promoted to harmful.
    pub query_remote_promotion: f64,
    /// Remote probability above which still-clear high-sensitivity content
    /// is promoted to harmful.
    pub content_remote_promotion: f64,
    /// Body characters sampled (after the title) for the content remote
    /// pass.
    pub content_remote_sample_chars: usize,

    /// Image acceptance thresholds on the blended probability.
    pub image_threshold_low: f64,
    pub image_threshold_medium: f64,
    pub image_threshold_high: f64,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            text_educational_min_score: 1,
            image_educational_min_terms: 2,
            image_educational_discount: 0.5,
            keyword_probability_step: 0.2,
            image_keyword_probability_cap: 0.8,
            violence_class_weight: 0.8,
            query_low_min_matches: 2,
            content_low_min_matches: 3,
            content_medium_min_matches: 2,
            content_high_min_matches: 1,
            query_remote_promotion: 0.6,
            content_remote_promotion: 0.5,
            content_remote_sample_chars: 1000,
            // Legacy YOLO-adapter table; see DESIGN.md for the choice.
            image_threshold_low: 0.8,
            image_threshold_medium: 0.6,
            image_threshold_high: 0.4,
        }
    }
}

impl EnginePolicy {
    /// Image acceptance threshold for a sensitivity level.
    pub fn image_threshold(&self, sensitivity: Sensitivity) -> f64 {
        match sensitivity {
            Sensitivity::Low => self.image_threshold_low,
            Sensitivity::Medium => self.image_threshold_medium,
            Sensitivity::High => self.image_threshold_high,
        }
    }

    /// Content keyword floor for a sensitivity level.
    pub fn content_min_matches(&self, sensitivity: Sensitivity) -> usize {
        match sensitivity {
            Sensitivity::Low => self.content_low_min_matches,
            Sensitivity::Medium => self.content_medium_min_matches,
            Sensitivity::High => self.content_high_min_matches,
        }
    }

    /// Bulk-override from a key → value map (e.g. a deployment config).
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, f64>) {
        for (key, value) in overrides {
            match key.as_str() {
                "text.educational_min_score" => self.text_educational_min_score = *value as u32,
                "image.educational_min_terms" => self.image_educational_min_terms = *value as u32,
                "image.educational_discount" => self.image_educational_discount = *value,
                "keyword.probability_step" => self.keyword_probability_step = *value,
                "image.keyword_probability_cap" => self.image_keyword_probability_cap = *value,
                "image.threshold.low" => self.image_threshold_low = *value,
                "image.threshold.medium" => self.image_threshold_medium = *value,
                "image.threshold.high" => self.image_threshold_high = *value,
                "query.remote_promotion" => self.query_remote_promotion = *value,
                "content.remote_promotion" => self.content_remote_promotion = *value,
                _ => {}
            }
        }
    }
}

/// Remote-inference wiring. Empty keys mean "no credentials": the adapters
/// report unavailable instead of calling out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Text-sentiment endpoint (Hugging-Face-style inference API).
    pub text_endpoint: String,
    pub text_api_key: String,
    /// Image object-detection endpoint.
    pub image_endpoint: String,
    pub image_api_key: String,
    /// Bounded timeout for every remote call, seconds.
    pub timeout_secs: u64,
    /// Characters kept when truncating text before sending.
    pub max_text_chars: usize,
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            text_endpoint: String::new(),
            text_api_key: String::new(),
            image_endpoint: "https://detect.roboflow.com/nsfw-detection-v1/1".into(),
            image_api_key: String::new(),
            timeout_secs: 10,
            max_text_chars: 512,
            user_agent: "SafeGuardEngine/0.1".into(),
        }
    }
}

impl RemoteConfig {
    /// Pull credentials from the conventional environment variables when
    /// the config file left them empty.
    pub fn with_env_credentials(mut self) -> Self {
        if self.text_api_key.is_empty() {
            if let Ok(key) = std::env::var("HUGGINGFACE_API_KEY") {
                self.text_api_key = key;
            }
        }
        if self.image_api_key.is_empty() {
            if let Ok(key) = std::env::var("ROBOFLOW_API_KEY") {
                self.image_api_key = key;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_shipped_table() {
        let p = EnginePolicy::default();
        assert_eq!(p.query_low_min_matches, 2);
        assert_eq!(p.content_min_matches(Sensitivity::Low), 3);
        assert_eq!(p.content_min_matches(Sensitivity::Medium), 2);
        assert_eq!(p.content_min_matches(Sensitivity::High), 1);
        assert_eq!(p.image_threshold(Sensitivity::Low), 0.8);
        assert_eq!(p.image_threshold(Sensitivity::Medium), 0.6);
        assert_eq!(p.image_threshold(Sensitivity::High), 0.4);
        assert_eq!(p.query_remote_promotion, 0.6);
        assert_eq!(p.content_remote_promotion, 0.5);
    }

    #[test]
    fn toml_round_trip_preserves_policy() {
        let mut config = EngineConfig::default();
        config.policy.image_threshold_high = 0.45;
        config.remote.text_endpoint = "https://inference.example/model".into();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: EngineConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.policy.image_threshold_high, 0.45);
        assert_eq!(back.remote.text_endpoint, "https://inference.example/model");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let back: EngineConfig = toml::from_str("[policy]\nquery_remote_promotion = 0.7\n").unwrap();
        assert_eq!(back.policy.query_remote_promotion, 0.7);
        assert_eq!(back.policy.content_remote_promotion, 0.5);
        assert_eq!(back.remote.timeout_secs, 10);
    }

    #[test]
    fn overrides_apply_by_key() {
        let mut p = EnginePolicy::default();
        let mut overrides = HashMap::new();
        overrides.insert("image.threshold.medium".to_string(), 0.75);
        overrides.insert("unknown.key".to_string(), 1.0);
        p.apply_overrides(&overrides);
        assert_eq!(p.image_threshold(Sensitivity::Medium), 0.75);
    }

    #[test]
    fn load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safeguard.toml");
        let mut config = EngineConfig::default();
        config.remote.timeout_secs = 5;
        config.save(&path).unwrap();
        let back = EngineConfig::load(&path).unwrap();
        assert_eq!(back.remote.timeout_secs, 5);
        // Missing file degrades to defaults rather than erroring.
        let missing = EngineConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing.remote.timeout_secs, 10);
    }
}
