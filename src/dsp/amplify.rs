//! Gain primitives and decibel conversion.

/*
Gain and Decibels
=================

Vocabulary
----------

  amplitude     The "height" of a signal. Oscillators here output [-1.0, +1.0].

  gain          A multiplier applied to amplitude.
                  gain = 1.0  →  unchanged (unity gain)
                  gain < 1.0  →  quieter (attenuation)
                  gain = 0.0  →  silence

  decibel (dB)  A logarithmic ratio. Volume controls are expressed in dB
                because hearing is logarithmic: equal dB steps *sound* like
                equal loudness steps, equal gain steps do not.


The Math
--------

    amplitude = 10^(dB / 20)
    dB        = 20 × log₁₀(amplitude)

Reference points:
      0 dB  =  ×1.0     (unity)
     -6 dB  ≈  ×0.5
    -15 dB  ≈  ×0.178   (default volume)
    -20 dB  =  ×0.1
    -40 dB  =  ×0.01
    -60 dB  =  ×0.001   (bottom of the volume slider)


Zipper Noise
------------

Jumping the gain from one value to another between two samples puts a step
into the waveform, heard as a click. Dragging a volume slider produces dozens
of such steps per second ("zipper noise"). `apply_gain_ramp` moves linearly
from the previous gain to the new one across one block instead:

    gain
     0.3 ┤          ╭──────
         │        ╱
     0.1 ┼──────╯
         └──────┴───┴──────  samples
              block boundary
*/

/// Convert a level in decibels to a linear amplitude factor.
///
/// `db_to_amplitude(0.0) == 1.0`, `db_to_amplitude(-20.0) ≈ 0.1`.
#[inline]
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude factor to decibels.
///
/// Returns `f32::NEG_INFINITY` for an amplitude of zero.
#[inline]
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.log10()
}

/// Multiply a signal by a constant gain factor (in-place).
#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// Multiply a signal by a gain that moves linearly from `from` to `to`.
///
/// The last sample receives exactly `to`, so the next block can continue at
/// a constant gain without a step.
#[inline]
pub fn apply_gain_ramp(signal: &mut [f32], from: f32, to: f32) {
    if from == to {
        apply_gain(signal, to);
        return;
    }

    let len = signal.len();
    if len == 0 {
        return;
    }

    let step = (to - from) / len as f32;
    for (i, sample) in signal.iter_mut().enumerate() {
        *sample *= from + step * (i + 1) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_reference_points() {
        assert!((db_to_amplitude(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_amplitude(-20.0) - 0.1).abs() < 1e-6);
        assert!((db_to_amplitude(-40.0) - 0.01).abs() < 1e-7);
        assert!((db_to_amplitude(-15.0) - 0.177_827_94).abs() < 1e-5);
    }

    #[test]
    fn db_conversion_inverts() {
        for &db in &[-60.0f32, -40.0, -15.0, -6.0, 0.0] {
            let back = amplitude_to_db(db_to_amplitude(db));
            assert!((back - db).abs() < 1e-3, "{db} dB came back as {back}");
        }
    }

    #[test]
    fn zero_amplitude_is_negative_infinity() {
        assert_eq!(amplitude_to_db(0.0), f32::NEG_INFINITY);
    }

    #[test]
    fn test_apply_gain() {
        let mut signal = [1.0, 0.5, -0.5, -1.0];
        apply_gain(&mut signal, 0.5);
        assert_eq!(signal, [0.5, 0.25, -0.25, -0.5]);
    }

    #[test]
    fn ramp_ends_on_target() {
        let mut signal = [1.0f32; 4];
        apply_gain_ramp(&mut signal, 0.0, 1.0);
        assert_eq!(signal, [0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn flat_ramp_is_constant_gain() {
        let mut signal = [1.0f32, -1.0];
        apply_gain_ramp(&mut signal, 0.3, 0.3);
        assert_eq!(signal, [0.3, -0.3]);
    }
}
