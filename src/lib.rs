//! # Sumi
//!
//! An embedded online handwriting recognition engine: given a user-drawn
//! stroke sequence, already featurized by a preprocessing pipeline, sumi
//! returns the `N` best-matching characters from a pre-built, memory-mapped
//! template model, ranked by Dynamic Time Warping distance.
//!
//! # Quick Start
//!
//! ```no_run
//! use sumi::{Character, Recognizer};
//!
//! fn main() -> sumi::Result<()> {
//!     let mut recognizer = Recognizer::open("handwriting-ja.model")?;
//!
//!     // Two feature vectors, one stroke; pad lanes stay zero.
//!     let mut character = Character::new(2, 1);
//!     character.set_vector(0, &[0.0, 0.0]);
//!     character.set_vector(1, &[1.0, 0.5]);
//!
//!     let results = recognizer.recognize(&character, 10);
//!     for (unicode, distance) in results.iter() {
//!         println!("U+{unicode:04X} at distance {distance}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `sumi-core` | `PackedVector`, `Character`, `Results`, errors |
//! | `sumi-model` | On-disk format, zero-copy mmap reader, writer |
//! | `sumi-engine` | DTW kernels (scalar + 4-way SIMD), `Recognizer` |
//!
//! The model file is mapped read-only and never copied; a `Recognizer` owns
//! its own scratch buffers, so run one instance per thread for parallel
//! recognition.

pub use sumi_core::{
    flatten, flatten_mut, Character, Error, PackedVector, Result, Results, PACKED_DIM,
};
pub use sumi_engine::{dtw, dtw4, DtwColumns, Recognizer, DEFAULT_WINDOW_SIZE};
pub use sumi_model::{
    write_model_file, CharacterGroup, CharacterInfo, Model, TemplateEntry, HEADER_SIZE, MODEL_MAGIC,
};
