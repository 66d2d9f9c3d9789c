use crate::engine::EngineState;
use thiserror::Error;

/// Failures reported by a [`crate::store::DocumentStore`].
///
/// The `Display` text is what ends up after the colon in a batch error line,
/// so variants keep their messages short and operator-readable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("batch has {requested} operations; store limit is {max}")]
    TooManyOperations { requested: usize, max: usize },

    #[error("write contention: {0}")]
    Contention(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Invalid conditions: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("engine busy ({0}); another bulk operation is in flight")]
    Busy(EngineState),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
