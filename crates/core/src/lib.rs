//! Core types for the sumi handwriting recognition engine
//!
//! This crate defines the foundational types used throughout the system:
//! - PackedVector: one feature vector, padded to a 16-byte SIMD lane-group
//! - Character: a caller-built input stroke sequence
//! - Results: the ranked recognition outcome
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod character;
pub mod error;
pub mod packed;
pub mod results;

pub use character::Character;
pub use error::{Error, Result};
pub use packed::{flatten, flatten_mut, PackedVector, PACKED_DIM};
pub use results::Results;
