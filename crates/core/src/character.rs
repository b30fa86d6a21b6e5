//! Input character
//!
//! A `Character` is the caller-built representation of one handwritten
//! character: the number of strokes drawn and the sequence of feature
//! vectors produced by the preprocessing pipeline. The point buffer is
//! allocated zero-filled at construction, so pad lanes stay zero as long as
//! callers only write the logical lanes of each vector.

use crate::packed::{flatten, PackedVector, PACKED_DIM};

/// One input handwritten character, ready for recognition.
///
/// Layout: `n_vectors` packed vectors, each `PACKED_DIM` floats and 16-byte
/// aligned. The caller fills the buffer through [`set_value`] or
/// [`set_vector`] during construction and then hands the character to the
/// recognizer, which only reads it.
///
/// [`set_value`]: Character::set_value
/// [`set_vector`]: Character::set_vector
#[derive(Clone, Debug)]
pub struct Character {
    points: Vec<PackedVector>,
    n_strokes: u32,
}

impl Character {
    /// Allocate a zero-filled character with `n_vectors` feature vectors.
    pub fn new(n_vectors: usize, n_strokes: u32) -> Self {
        Character {
            points: vec![PackedVector::ZERO; n_vectors],
            n_strokes,
        }
    }

    /// Number of feature vectors.
    pub fn n_vectors(&self) -> usize {
        self.points.len()
    }

    /// Number of strokes the user drew.
    pub fn n_strokes(&self) -> u32 {
        self.n_strokes
    }

    /// Write the `index`-th float of the flat point buffer
    /// (`index` ranges over `n_vectors * PACKED_DIM`).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_value(&mut self, index: usize, value: f32) {
        self.points[index / PACKED_DIM].set_lane(index % PACKED_DIM, value);
    }

    /// Read the `index`-th float of the flat point buffer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get_value(&self, index: usize) -> f32 {
        self.points[index / PACKED_DIM].lane(index % PACKED_DIM)
    }

    /// Write one whole feature vector, zero-filling the pad lanes.
    ///
    /// # Panics
    ///
    /// Panics if `index >= n_vectors` or `values.len() > PACKED_DIM`.
    pub fn set_vector(&mut self, index: usize, values: &[f32]) {
        self.points[index] = PackedVector::from_values(values);
    }

    /// The packed point buffer.
    pub fn points(&self) -> &[PackedVector] {
        &self.points
    }

    /// The point buffer as a flat float slice of length
    /// `n_vectors * PACKED_DIM`.
    pub fn values(&self) -> &[f32] {
        flatten(&self.points)
    }
}
