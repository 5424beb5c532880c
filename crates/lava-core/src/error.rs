/// Core error types for the Lava engine.
use std::path::PathBuf;

/// A specialized Result type for Lava operations.
pub type LavaResult<T> = Result<T, LavaError>;

/// Top-level error type encompassing all Lava subsystems.
///
/// Per-tick decode and present operations on a validated asset are defined to
/// never fail, so only load-time and construction-time paths carry errors.
#[derive(Debug, thiserror::Error)]
pub enum LavaError {
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("asset load failed: {message} ({path:?})")]
    AssetLoad { message: String, path: PathBuf },

    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl LavaError {
    /// Create a manifest validation error.
    pub fn manifest(message: impl Into<String>) -> Self {
        LavaError::InvalidManifest(message.into())
    }

    /// Create an asset load error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        LavaError::AssetLoad {
            message: message.into(),
            path: path.into(),
        }
    }
}
