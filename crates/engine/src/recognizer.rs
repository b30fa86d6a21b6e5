//! Windowed template matching
//!
//! The recognizer walks the model's stroke-count groups, prunes the ones
//! outside the stroke window, measures every surviving template with the
//! DTW kernels (four at a time where possible) and returns the `N` closest
//! characters.

use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

use tracing::debug;

use sumi_core::{Character, PackedVector, Result, Results};
use sumi_model::Model;

use crate::dtw::{dtw, dtw4, DtwColumns};

/// Default stroke-count window (`±3` strokes).
pub const DEFAULT_WINDOW_SIZE: u32 = 3;

/// One measured template: unicode code point and warping distance.
#[derive(Clone, Copy, Debug)]
struct CharDist {
    unicode: u32,
    dist: f32,
}

/// Online handwritten-character recognizer.
///
/// Owns the model mapping and all mutable scratch (the distance array and
/// the two rolling DTW columns), so one instance serves one recognition at
/// a time. Callers needing parallelism run one `Recognizer` per thread.
pub struct Recognizer {
    model: Model,
    window_size: u32,
    /// One slot per template, reused across calls.
    distm: Vec<CharDist>,
    columns: DtwColumns,
}

impl Recognizer {
    /// Open a model file and build a recognizer over it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Recognizer::new(Model::open(path.as_ref())?))
    }

    /// Build a recognizer over an already-opened model.
    pub fn new(model: Model) -> Self {
        let distm = Vec::with_capacity(model.n_characters() as usize);
        let columns = DtwColumns::new(model.max_n_vectors() as usize);
        Recognizer {
            model,
            window_size: DEFAULT_WINDOW_SIZE,
            distm,
            columns,
        }
    }

    /// The underlying model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Number of template characters in the model.
    pub fn n_characters(&self) -> u32 {
        self.model.n_characters()
    }

    /// Logical feature dimension of the model.
    pub fn dimension(&self) -> u32 {
        self.model.dimension()
    }

    /// Resampling threshold the model was built with (for preprocessors).
    pub fn downsample_threshold(&self) -> u32 {
        self.model.downsample_threshold()
    }

    /// Current stroke-count window.
    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Set the stroke-count window: groups whose stroke count differs from
    /// the input's by more than `window_size` are skipped.
    pub fn set_window_size(&mut self, window_size: u32) {
        self.window_size = window_size;
    }

    /// Match `input` against every template inside the stroke window and
    /// return the `n_results` closest characters, distances ascending.
    ///
    /// Inputs with fewer than two vectors produce an empty result set: the
    /// DTW recurrence needs at least one interior column.
    pub fn recognize(&mut self, input: &Character, n_results: usize) -> Results {
        if input.n_vectors() < 2 {
            return Results::empty();
        }

        let start = Instant::now();
        let s = input.points();
        let strokes = input.n_strokes();
        let window = self.window_size;
        let dim = self.model.dimension() as usize;

        let infos = self.model.characters();
        let groups = self.model.groups();
        let stroke_data = self.model.stroke_vectors();

        self.distm.clear();
        let mut char_id = 0usize;

        for group in groups {
            // Groups are sorted ascending, so nothing past the upper bound
            // can match.
            if group.n_strokes > strokes + window {
                break;
            }
            // The lower bound only applies once the input has more strokes
            // than the window.
            if strokes > window && group.n_strokes < strokes - window {
                char_id += group.n_chars as usize;
                continue;
            }

            let mut cursor = self.model.group_vector_start(group);
            let group_end = char_id + group.n_chars as usize;

            while char_id + 4 <= group_end {
                let quad = &infos[char_id..char_id + 4];
                let mut refs: [&[PackedVector]; 4] = [&[]; 4];
                for (slot, info) in refs.iter_mut().zip(quad) {
                    let len = info.n_vectors as usize;
                    *slot = &stroke_data[cursor..cursor + len];
                    cursor += len;
                }
                let distances = dtw4(s, refs, dim, &mut self.columns);
                for (info, dist) in quad.iter().zip(distances) {
                    self.distm.push(CharDist {
                        unicode: info.unicode,
                        dist,
                    });
                }
                char_id += 4;
            }

            while char_id < group_end {
                let info = &infos[char_id];
                let len = info.n_vectors as usize;
                let template = &stroke_data[cursor..cursor + len];
                cursor += len;
                self.distm.push(CharDist {
                    unicode: info.unicode,
                    dist: dtw(s, template, dim, &mut self.columns),
                });
                char_id += 1;
            }
        }

        // Stable sort: equal distances keep template order.
        self.distm
            .sort_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap_or(Ordering::Equal));

        let size = self.distm.len().min(n_results);
        let results = Results::from_pairs(self.distm[..size].iter().map(|cd| (cd.unicode, cd.dist)));

        debug!(
            target: "sumi::engine",
            candidates = self.distm.len(),
            requested = n_results,
            returned = results.len(),
            duration_us = start.elapsed().as_micros() as u64,
            "Recognition completed"
        );

        results
    }
}
