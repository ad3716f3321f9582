//! Error types for cursor mutations.

use thiserror::Error;

use crate::cursor::{CursorId, GroupId};

/// Result type for cursor operations.
pub type Result<T> = std::result::Result<T, CursorError>;

/// Errors raised when mutating trend cursors.
///
/// Reconciliation never fails; these only come from the mutation paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CursorError {
    /// Timestamp is NaN or infinite.
    #[error("Invalid cursor timestamp: {0}")]
    InvalidTimestamp(f64),

    /// Group already holds the maximum number of cursors.
    #[error("Group {group} already has {limit} trend cursors")]
    GroupFull {
        /// Group that rejected the cursor.
        group: GroupId,
        /// Configured limit.
        limit: usize,
    },

    /// No cursor with this id exists.
    #[error("Trend cursor {id} not found in group {group}")]
    CursorNotFound {
        /// Group that was searched.
        group: GroupId,
        /// Missing cursor.
        id: CursorId,
    },

    /// Viewport or chart geometry cannot map pixels to time.
    #[error("Chart viewport cannot map pixels to timestamps")]
    InvalidViewport,
}
