use thiserror::Error;

use crate::app::BuildError;
use crate::domain::StoreError;

/// Run-level failures. Per-message problems never show up here; they are
/// collected in the triage report instead.
#[derive(Debug, Error)]
pub enum DodoError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// The processed-id set could not be written back.
    #[error("failed to persist processed message ids: {0}")]
    Persist(StoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<toml::de::Error> for DodoError {
    fn from(err: toml::de::Error) -> Self {
        DodoError::Config(format!("invalid TOML: {err}"))
    }
}
