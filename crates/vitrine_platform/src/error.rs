//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// Viewport dimensions were negative or not finite
    #[error("Invalid viewport size: {width}x{height}")]
    InvalidViewport {
        /// Rejected width
        width: f32,
        /// Rejected height
        height: f32,
    },

    /// Input coordinates were not finite
    #[error("Invalid input coordinates: ({x}, {y})")]
    InvalidCoordinates {
        /// Rejected x
        x: f32,
        /// Rejected y
        y: f32,
    },
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
