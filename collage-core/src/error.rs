//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Interaction-layer arithmetic never produces these: degenerate clamp ranges
/// and zero-distance pinches are corrected silently. These errors cover
/// lookups against the model that name something which does not exist.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Item not found on the canvas.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Grid slot index outside the current slot range.
    #[error("Grid slot {index} out of range (slot count {count})")]
    SlotOutOfRange {
        /// The requested index.
        index: usize,
        /// The current slot count.
        count: usize,
    },

    /// A selection that does not reference a live item or slot.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Invalid operation on an item.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The canvas aggregate failed an integrity check.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Canvas serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
