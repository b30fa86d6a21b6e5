//! Property tests for the DTW kernels.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use sumi_core::PackedVector;
use sumi_engine::{dtw, dtw4, DtwColumns};

const MAX_VECTORS: usize = 16;

fn sequence() -> impl Strategy<Value = Vec<PackedVector>> {
    proptest::collection::vec((-50.0f32..50.0, -50.0f32..50.0), 1..MAX_VECTORS)
        .prop_map(|points| {
            points
                .into_iter()
                .map(|(x, y)| PackedVector::from_values(&[x, y]))
                .collect()
        })
}

fn assert_close(a: f32, b: f32) -> std::result::Result<(), TestCaseError> {
    if a.is_infinite() && b.is_infinite() {
        return Ok(());
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    prop_assert!((a - b).abs() <= 1e-4 * scale, "{} != {}", a, b);
    Ok(())
}

proptest! {
    #[test]
    fn identical_sequences_measure_zero(s in sequence()) {
        let mut cols = DtwColumns::new(MAX_VECTORS);
        prop_assert_eq!(dtw(&s, &s, 2, &mut cols), 0.0);
    }

    #[test]
    fn distances_are_nonnegative(s in sequence(), t in sequence()) {
        let mut cols = DtwColumns::new(MAX_VECTORS);
        prop_assert!(dtw(&s, &t, 2, &mut cols) >= 0.0);
    }

    #[test]
    fn distance_is_symmetric(s in sequence(), t in sequence()) {
        let mut cols = DtwColumns::new(MAX_VECTORS);
        let forward = dtw(&s, &t, 2, &mut cols);
        let backward = dtw(&t, &s, 2, &mut cols);
        assert_close(forward, backward)?;
    }

    #[test]
    fn quad_lanes_match_scalar(
        s in sequence(),
        t0 in sequence(),
        t1 in sequence(),
        t2 in sequence(),
        t3 in sequence(),
    ) {
        let mut cols = DtwColumns::new(MAX_VECTORS);
        let quad = dtw4(&s, [&t0, &t1, &t2, &t3], 2, &mut cols);
        for (lane, t) in quad.iter().zip([&t0, &t1, &t2, &t3]) {
            assert_close(*lane, dtw(&s, t, 2, &mut cols))?;
        }
    }
}
