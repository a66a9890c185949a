//! Phase-accumulating sine oscillator.

/*
Sine Oscillator
===============

A binaural beat is nothing more than two pure tones, one per ear. The sine is
the only waveform with no harmonics, so the two ears hear exactly one
frequency each and the brain fills in the difference.

Vocabulary
----------

  phase         Position inside one cycle, kept here in [0.0, 1.0).
                0.0 = start of the cycle, 0.5 = half way.

  increment     How far the phase advances per sample:

                    increment = frequency / sample_rate

                At 220 Hz and 48 kHz: 220 / 48000 ≈ 0.00458 cycles/sample.

  wrap          When phase reaches 1.0 we subtract 1.0. The waveform is
                periodic, so nothing audible happens.


Why accumulate phase?
---------------------

The naive approach computes every sample from absolute time:

    sample[n] = sin(2π × f × n / sample_rate)

That works until the frequency changes. If f jumps from 220 Hz to 300 Hz at
sample n, the argument jumps too and the waveform tears:

    220 Hz ───╮
              │  ← discontinuity = audible click
    300 Hz    ╰───

Accumulating phase instead only changes the *rate* at which the phase moves.
The waveform bends smoothly into the new pitch:

    phase += frequency / sample_rate
    sample  = sin(2π × phase)

This is what lets a slider drag retune a running tone without a gap.


Precision
---------

The phase lives in f64. Over hours of playback an f32 accumulator drifts
enough to detune the 1-2 Hz differences that sleep presets rely on; f64 keeps
the error far below anything audible. Output samples are still f32.
*/

use std::f64::consts::TAU;

/// Sine oscillator with a continuous phase accumulator.
#[derive(Debug, Clone, Default)]
pub struct SineOscillator {
    phase: f64,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Current phase in cycles, in [0.0, 1.0).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Fill `out` with a unit-amplitude sine at `frequency` Hz.
    ///
    /// The phase carries over between calls, so consecutive blocks (even at
    /// different frequencies) join without discontinuity.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        let increment = frequency as f64 / sample_rate as f64;

        for sample in out.iter_mut() {
            *sample = (TAU * self.phase).sin() as f32;
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
            }
        }
    }
}
