//! # SafeGuard Engine — multi-signal harmful-content classification
//!
//! Classifies user-generated text, search queries, domains, and images as
//! harmful or allowed by combining:
//! - keyword detection against an immutable pattern catalog
//! - educational-context scoring with a hard override for text paths
//! - sensitivity-driven evidence thresholds (low / medium / high)
//! - an optional remote inference signal (text sentiment + image object
//!   detection), blended in as secondary evidence and degraded gracefully
//!   whenever the service is unreachable
//!
//! Transport (HTTP routing, serialization of verdicts) lives outside this
//! crate; callers construct a [`ContentClassifier`] once at startup and
//! share it across requests.

pub mod catalog;
pub mod config;
pub mod educational;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod remote;
pub mod text_inference;
pub mod types;
pub mod vision_inference;

pub use catalog::{EducationalTermSet, PatternCatalog};
pub use config::{EngineConfig, EnginePolicy, RemoteConfig};
pub use engine::{ClassifierReport, ContentClassifier};
pub use error::{CatalogError, FilterError, FilterResult};
pub use remote::{InferenceBridge, RemoteScore, RemoteSignal};
pub use types::{
    ContentRequest, DomainRequest, FilterAlert, HarmCategory, ImageRequest, ImageVerdict,
    QueryRequest, Sensitivity, Severity, Verdict,
};
