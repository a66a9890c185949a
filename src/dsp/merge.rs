//! Writing stereo blocks into interleaved device buffers.

/// Interleave a stereo block into a device buffer with `channels` channels.
///
/// - 1 channel: the average of left and right.
/// - 2 channels: left, right.
/// - more: left, right, then silence on the remaining channels.
///
/// `out` must hold at least `left.len() * channels` samples.
pub fn interleave(left: &[f32], right: &[f32], out: &mut [f32], channels: usize) {
    debug_assert_eq!(left.len(), right.len());
    debug_assert!(out.len() >= left.len() * channels);

    match channels {
        0 => {}
        1 => {
            for ((o, &l), &r) in out.iter_mut().zip(left.iter()).zip(right.iter()) {
                *o = (l + r) * 0.5;
            }
        }
        _ => {
            for ((frame, &l), &r) in out
                .chunks_exact_mut(channels)
                .zip(left.iter())
                .zip(right.iter())
            {
                frame[0] = l;
                frame[1] = r;
                frame[2..].fill(0.0);
            }
        }
    }
}
