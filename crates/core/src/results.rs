//! Recognition results
//!
//! A `Results` owns the ranked outcome of one recognition call: parallel
//! arrays of unicode code points and warping distances, ordered by distance
//! ascending. Immutable after construction.

/// Ranked recognition results.
///
/// Entry `i` is the `i`-th best match: `unicode(i)` with warping distance
/// `distance(i)`. Distances are non-decreasing in `i`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Results {
    unicode: Vec<u32>,
    dist: Vec<f32>,
}

impl Results {
    /// An empty result set.
    pub fn empty() -> Self {
        Results::default()
    }

    /// Build results from `(unicode, distance)` pairs, kept in the order
    /// given.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f32)>,
    {
        let (unicode, dist) = pairs.into_iter().unzip();
        Results { unicode, dist }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.unicode.len()
    }

    /// Whether the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.unicode.is_empty()
    }

    /// Unicode code point of the `i`-th best match.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn unicode(&self, i: usize) -> u32 {
        self.unicode[i]
    }

    /// Warping distance of the `i`-th best match.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn distance(&self, i: usize) -> f32 {
        self.dist[i]
    }

    /// The best match, if any.
    pub fn best(&self) -> Option<(u32, f32)> {
        Some((*self.unicode.first()?, *self.dist.first()?))
    }

    /// Iterate over `(unicode, distance)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.unicode.iter().copied().zip(self.dist.iter().copied())
    }
}
