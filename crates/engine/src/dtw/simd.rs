//! 4-reference SIMD DTW kernel
//!
//! Evaluates one input sequence against four reference templates at once.
//! The rolling columns are 4-lane float vectors: lane `k` carries reference
//! `k`'s running DTW column, so the inductive step is a handful of packed
//! subtract/min/add instructions instead of four separate scalar loops.
//!
//! SSE2 is baseline on x86_64, so no runtime feature detection is needed.
//! Other targets degrade to four scalar DTW runs; the observable distances
//! match within floating-point associativity.

use sumi_core::PackedVector;

#[cfg(not(target_arch = "x86_64"))]
use super::dtw;
use super::DtwColumns;

/// DTW distances from `s` to four reference sequences at once.
///
/// Element `k` of the result equals `dtw(s, refs[k], dim, cols)` within
/// 1e-5 relative error. References may have different lengths; rows beyond
/// the shortest are finished one lane at a time.
pub fn dtw4(
    s: &[PackedVector],
    refs: [&[PackedVector]; 4],
    dim: usize,
    cols: &mut DtwColumns,
) -> [f32; 4] {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: SSE2 is part of the x86_64 baseline instruction set.
        unsafe { sse2::dtw4(s, refs, dim, cols) }
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        let mut out = [0.0f32; 4];
        for (lane, reference) in out.iter_mut().zip(refs) {
            *lane = dtw(s, reference, dim, cols);
        }
        out
    }
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use std::arch::x86_64::*;

    use sumi_core::PackedVector;

    use super::super::{local_cost, min3, DtwColumns};

    pub(super) unsafe fn dtw4(
        s: &[PackedVector],
        refs: [&[PackedVector]; 4],
        dim: usize,
        cols: &mut DtwColumns,
    ) -> [f32; 4] {
        let n = s.len();
        let m = [refs[0].len(), refs[1].len(), refs[2].len(), refs[3].len()];
        debug_assert!(n >= 1);
        debug_assert!(m.iter().all(|&len| len >= 1));

        let max_m = m.into_iter().max().unwrap();
        let common = m.into_iter().min().unwrap();

        let DtwColumns { prev, cur } = cols;
        debug_assert!(max_m <= cur.len(), "column scratch too small");

        let inf = _mm_set1_ps(f32::INFINITY);
        let sign_mask = _mm_set1_ps(-0.0);

        // Column 0 boundary in every lane: row 0 zero, other rows infinite.
        _mm_store_ps(prev[0].as_mut_ptr(), _mm_setzero_ps());
        for row in prev.iter_mut().take(max_m).skip(1) {
            _mm_store_ps(row.as_mut_ptr(), inf);
        }

        for i in 1..n {
            let sv = _mm_load_ps(s[i].as_ptr());
            _mm_store_ps(cur[0].as_mut_ptr(), inf);

            for j in 1..common {
                let cost = local_cost4(
                    sv,
                    &refs[0][j],
                    &refs[1][j],
                    &refs[2][j],
                    &refs[3][j],
                    sign_mask,
                );
                let diag = _mm_load_ps(prev[j - 1].as_ptr());
                let up = _mm_load_ps(prev[j].as_ptr());
                let left = _mm_load_ps(cur[j - 1].as_ptr());
                let best = _mm_min_ps(_mm_min_ps(left, up), diag);
                _mm_store_ps(cur[j].as_mut_ptr(), _mm_add_ps(cost, best));
            }

            // References longer than the shortest finish their rows one
            // lane at a time.
            for j in common.max(1)..max_m {
                for (k, reference) in refs.iter().enumerate() {
                    if j < m[k] {
                        let cost = local_cost(&s[i], &reference[j], dim);
                        let best =
                            min3(prev[j - 1].lane(k), prev[j].lane(k), cur[j - 1].lane(k));
                        cur[j].set_lane(k, cost + best);
                    }
                }
            }

            std::mem::swap(prev, cur);
        }

        [
            prev[m[0] - 1].lane(0),
            prev[m[1] - 1].lane(1),
            prev[m[2] - 1].lane(2),
            prev[m[3] - 1].lane(3),
        ]
    }

    /// One 4-lane local-cost vector: lane `k` is the L1 distance between
    /// the input vector and reference `k`'s current vector.
    ///
    /// Pad lanes are zero by contract, so summing all four transposed
    /// components matches the scalar cost over the logical dimension.
    #[inline]
    unsafe fn local_cost4(
        sv: __m128,
        t0: &PackedVector,
        t1: &PackedVector,
        t2: &PackedVector,
        t3: &PackedVector,
        sign_mask: __m128,
    ) -> __m128 {
        let d0 = _mm_andnot_ps(sign_mask, _mm_sub_ps(_mm_load_ps(t0.as_ptr()), sv));
        let d1 = _mm_andnot_ps(sign_mask, _mm_sub_ps(_mm_load_ps(t1.as_ptr()), sv));
        let d2 = _mm_andnot_ps(sign_mask, _mm_sub_ps(_mm_load_ps(t2.as_ptr()), sv));
        let d3 = _mm_andnot_ps(sign_mask, _mm_sub_ps(_mm_load_ps(t3.as_ptr()), sv));

        // 4x4 transpose: each output vector holds one component across the
        // four references.
        let lo01 = _mm_unpacklo_ps(d0, d1);
        let lo23 = _mm_unpacklo_ps(d2, d3);
        let hi01 = _mm_unpackhi_ps(d0, d1);
        let hi23 = _mm_unpackhi_ps(d2, d3);
        let c0 = _mm_movelh_ps(lo01, lo23);
        let c1 = _mm_movehl_ps(lo23, lo01);
        let c2 = _mm_movelh_ps(hi01, hi23);
        let c3 = _mm_movehl_ps(hi23, hi01);

        _mm_add_ps(_mm_add_ps(c0, c1), _mm_add_ps(c2, c3))
    }
}
