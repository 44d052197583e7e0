use thiserror::Error;

use crate::model::PlayerType;

/// Failure codes reported by the music catalog engine when it prepares a
/// store queue for playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogErrorCode {
    Unknown,
    PermissionDenied,
    CloudServiceCapabilityMissing,
    NetworkConnectionFailed,
    NotFound,
    NotSupported,
    Cancelled,
    RequestTimedOut,
}

#[derive(Error, Debug)]
pub enum PlayerKitError {
    #[error("{backend:?} engine error: {message}")]
    Engine {
        backend: PlayerType,
        message: String,
    },
    #[error("Catalog error: {0:?}")]
    Catalog(CatalogErrorCode),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
    #[error("Queue error: {0}")]
    Queue(String),
}

impl PlayerKitError {
    pub fn engine_error(backend: PlayerType, message: &str) -> Self {
        PlayerKitError::Engine {
            backend,
            message: message.to_string(),
        }
    }
}
