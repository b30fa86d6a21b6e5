//! Error types for the sumi engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! All failures surface when a model is opened; recognition itself is
//! infallible once a model has been validated.

use std::io;
use thiserror::Error;

/// Result type alias for sumi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for model loading and validation
#[derive(Debug, Error)]
pub enum Error {
    /// The model file could not be opened or mapped
    #[error("couldn't map model file: {0}")]
    Map(#[from] io::Error),

    /// The file is not a model file (magic number mismatch)
    #[error("not a valid model file (magic {found:#010x})")]
    Format {
        /// Magic number actually present in the file
        found: u32,
    },

    /// The model declares zero characters or zero groups
    #[error("no characters in this model")]
    EmptyModel,

    /// A section of the model extends past the end of the file
    #[error("model file truncated: {section} needs {needed} bytes, {available} available")]
    Truncated {
        /// Which section was being read
        section: &'static str,
        /// Bytes the section requires
        needed: usize,
        /// Bytes actually available
        available: usize,
    },

    /// The model's metadata is internally inconsistent
    #[error("invalid model: {0}")]
    InvalidModel(String),
}
