//! Shared types for the classification engine.

use serde::{Deserialize, Serialize};

/// Harm categories the engine can attribute evidence to.
///
/// `PRIORITY` is the canonical ordering for iteration and tie-breaking;
/// every component that ranks categories uses it instead of map iteration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmCategory {
    Nsfw,
    Violence,
    Suicide,
}

impl HarmCategory {
    /// Canonical category priority: nsfw > violence > suicide.
    pub const PRIORITY: [HarmCategory; 3] =
        [HarmCategory::Nsfw, HarmCategory::Violence, HarmCategory::Suicide];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarmCategory::Nsfw => "nsfw",
            HarmCategory::Violence => "violence",
            HarmCategory::Suicide => "suicide",
        }
    }
}

impl std::fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied knob controlling how much evidence is required before
/// flagging content harmful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterAlert {
    pub timestamp: i64,
    pub severity: Severity,
    pub component: String,
    pub title: String,
    pub details: String,
}

fn default_true() -> bool {
    true
}

fn all_categories() -> Vec<HarmCategory> {
    HarmCategory::PRIORITY.to_vec()
}

// ── Requests ───────────────────────────────────────────────────────────────

/// Search-query analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default = "default_true")]
    pub educational_mode: bool,
    #[serde(default = "all_categories")]
    pub categories: Vec<HarmCategory>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sensitivity: Sensitivity::Medium,
            educational_mode: true,
            categories: all_categories(),
        }
    }
}

/// Page-content analysis request. `url` is carried for log attribution only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default = "default_true")]
    pub educational_mode: bool,
    #[serde(default = "all_categories")]
    pub categories: Vec<HarmCategory>,
}

impl ContentRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: String::new(),
            sensitivity: Sensitivity::Medium,
            educational_mode: true,
            categories: all_categories(),
        }
    }
}

/// Domain check request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRequest {
    pub domain: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default = "all_categories")]
    pub categories: Vec<HarmCategory>,
}

impl DomainRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            sensitivity: Sensitivity::Medium,
            categories: all_categories(),
        }
    }
}

/// Image analysis request. Surrounding text and alt text feed the keyword
/// blending pass alongside the remote detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub image_url: String,
    #[serde(default)]
    pub surrounding_text: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
}

impl ImageRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            surrounding_text: String::new(),
            alt_text: String::new(),
            sensitivity: Sensitivity::Medium,
        }
    }
}

// ── Verdicts ───────────────────────────────────────────────────────────────

/// Engine output for query, content, and domain analysis.
///
/// `matched_keywords` is sorted and deduplicated so identical inputs produce
/// identical verdicts. `category: None` means no attribution (`"none"` on
/// the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub is_harmful: bool,
    pub matched_keywords: Vec<String>,
    pub category: Option<HarmCategory>,
}

impl Verdict {
    pub fn allowed() -> Self {
        Self { is_harmful: false, matched_keywords: Vec::new(), category: None }
    }
}

/// Engine output for image analysis: the text verdict fields plus the
/// blended probability and the acceptance threshold that was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVerdict {
    pub is_harmful: bool,
    pub probability: f64,
    pub threshold: f64,
    pub detected: Vec<String>,
    pub category: Option<HarmCategory>,
}
