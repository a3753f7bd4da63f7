use thiserror::Error;

use crate::types::HarmCategory;

pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid request: field '{field}' {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("pattern catalog misconfigured: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl FilterError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidRequest { field, reason: reason.into() }
    }
}

/// Fatal catalog construction failures. An empty category would silently
/// disable detection for that category, so construction aborts instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("category '{0}' has no trigger phrases")]
    EmptyCategory(HarmCategory),

    #[error("trigger phrase '{phrase}' appears in both '{first}' and '{second}'")]
    DuplicatePhrase { phrase: String, first: HarmCategory, second: HarmCategory },

    #[error("educational term set is empty")]
    EmptyTermSet,

    #[error("known-harmful domain list is empty")]
    EmptyDenylist,

    #[error("invalid trigger phrase '{phrase}': {reason}")]
    InvalidPhrase { phrase: String, reason: String },
}
