//! Error types for exectrace

use thiserror::Error;

/// Main error type for exectrace operations.
///
/// Recording operations (`log`, `err`, `group`, ...) are deliberately
/// infallible: a diagnostic aid must never fail the code it observes.
/// Errors only surface at explicit initialization seams.
#[derive(Error, Debug)]
pub enum TrackError {
    /// The process-wide tracker context was initialized twice
    #[error("process tracker is already initialized")]
    AlreadyInitialized,
}

/// Result type alias using TrackError
pub type Result<T> = std::result::Result<T, TrackError>;
