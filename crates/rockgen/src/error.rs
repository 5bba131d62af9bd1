//! Error types for rock generation.

use thiserror::Error;

/// Errors that can occur while applying settings or generating a rock.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A settings field violates its constraint. Rejected before any
    /// cached state is touched.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// `generate` was called before any settings were applied.
    #[error("generate called before settings were applied")]
    NotInitialized,

    /// The stock mesh provider produced a malformed or empty mesh.
    #[error("stock mesh provider failed: {0}")]
    StockProvider(String),

    /// The mesh simplifier produced a malformed or empty mesh.
    #[error("mesh simplifier failed: {0}")]
    Simplifier(String),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
