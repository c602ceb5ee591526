//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Why an export attempt failed. The canvas is never modified by a failure
/// beyond the selection, which is always restored.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export is still running.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// The renderer produced no image.
    #[error("Render failed: {0}")]
    RenderFailure(#[from] RenderError),

    /// The persistence target refused access.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Saving failed for a reason other than permission.
    #[error("Save failed: {0}")]
    SaveFailure(String),
}

impl From<SaveError> for ExportError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            SaveError::Failed(msg) => Self::SaveFailure(msg),
        }
    }
}

/// Errors from a [`SceneRenderer`](crate::SceneRenderer).
#[derive(Debug, Error)]
pub enum RenderError {
    /// A photo could not be opened or decoded.
    #[error("Failed to load image {uri}: {reason}")]
    ImageLoad {
        /// The photo's URI.
        uri: String,
        /// Decoder or I/O message.
        reason: String,
    },

    /// The requested output size cannot be rendered.
    #[error("Invalid output size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Rasterization failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),
}

/// Errors from a [`Persistence`](crate::Persistence) target.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The target lacks authorization to write.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other failure.
    #[error("Save failed: {0}")]
    Failed(String),
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(err.to_string())
        } else {
            Self::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_errors_map_to_distinct_reasons() {
        let denied: ExportError = SaveError::PermissionDenied("photos".into()).into();
        assert!(matches!(denied, ExportError::PermissionDenied(_)));
        let failed: ExportError = SaveError::Failed("disk full".into()).into();
        assert!(matches!(failed, ExportError::SaveFailure(_)));
    }

    #[test]
    fn io_permission_error_is_permission_denied() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(SaveError::from(io), SaveError::PermissionDenied(_)));
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(SaveError::from(io), SaveError::Failed(_)));
    }
}
