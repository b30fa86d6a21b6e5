//! Recognition engine for sumi
//!
//! This crate holds the matching core:
//! - `dtw`: the scalar Dynamic Time Warping kernel and the 4-reference SIMD
//!   variant, both running over two pre-allocated rolling columns
//! - `recognizer`: windowed iteration over the model's stroke-count groups,
//!   kernel dispatch, and top-N ranking
//!
//! One `Recognizer` instance owns all mutable scratch, so a single instance
//! must not be shared across concurrent calls; instantiate one per thread
//! instead (they may share the underlying read-only model).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtw;
pub mod recognizer;

pub use dtw::{dtw, dtw4, DtwColumns};
pub use recognizer::{Recognizer, DEFAULT_WINDOW_SIZE};
