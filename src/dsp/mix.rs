//! Signal summing and downmix primitives.

/*
Summing
=======

Several connections into the same input are added sample by sample. Two
sources that each peak at 1.0 can sum to 2.0, so anything that sums should
sit in front of a gain stage (the binaural graph puts the gain after the
merger).

Downmix
-------

A stereo signal feeding a mono input is folded with equal weights:

    mono = (left + right) × 0.5

Equal weights keep a centred signal at its original level.
*/

/// Add signal B into signal A in-place.
///
/// ⚠️ WARNING: Can exceed [-1.0, +1.0] range!
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}

/// Add the downmix of a stereo pair into `out`.
#[inline]
pub fn sum_downmix_in_place(out: &mut [f32], left: &[f32], right: &[f32]) {
    debug_assert_eq!(left.len(), right.len());
    debug_assert_eq!(left.len(), out.len());

    for ((o, &l), &r) in out.iter_mut().zip(left.iter()).zip(right.iter()) {
        *o += (l + r) * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_in_place() {
        let mut a = [0.5, -0.5, 1.0];
        sum_in_place(&mut a, &[0.25, 0.25, 1.0]);
        assert_eq!(a, [0.75, -0.25, 2.0]);
    }

    #[test]
    fn downmix_accumulates() {
        let mut out = [1.0, 1.0];
        sum_downmix_in_place(&mut out, &[1.0, -1.0], &[1.0, 1.0]);
        assert_eq!(out, [2.0, 1.0]);
    }
}
