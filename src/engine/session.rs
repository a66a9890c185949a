//! Session state and the transitions between states.
//!
//! [`SessionState::plan`] is a pure function: given a control event it
//! returns the next state and the [`Effect`] the engine must carry out on the
//! audio graph. It never touches audio itself, which keeps the policy
//! ("patch live nodes while playing, record silently while stopped") testable
//! without a device.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::{clamp, Limits},
    dsp::db_to_amplitude,
    error::{Error, Result},
};

use super::Preset;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub is_playing: bool,
    /// Hz. Offset of the right channel above the base frequency.
    pub beat_frequency: f32,
    /// Hz. Frequency of the left channel.
    pub base_frequency: f32,
    /// dB. Linearized with `10^(dB/20)` before reaching the gain stage.
    pub volume: f32,
    pub preset: Preset,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_playing: false,
            beat_frequency: Preset::Concentration.beat_frequency(),
            base_frequency: 220.0,
            volume: -15.0,
            preset: Preset::Concentration,
        }
    }
}

/// A user-driven event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Start,
    Stop,
    SetBeatFrequency(f32),
    SetBaseFrequency(f32),
    SetVolume(f32),
    SelectPreset(Preset),
}

/// What the engine has to do to the audio graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    /// Construct and start a fresh graph.
    Build,
    /// Stop and dismantle the live graph.
    Teardown,
    /// Set new frequencies on the running oscillators.
    Retune { left: f32, right: f32 },
    /// Set a new amplitude on the live gain stage.
    Regain { amplitude: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: SessionState,
    pub effect: Effect,
}

impl SessionState {
    /// Frequency of the left oscillator.
    pub fn left_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Frequency of the right oscillator.
    pub fn right_frequency(&self) -> f32 {
        self.base_frequency + self.beat_frequency
    }

    /// Linear amplitude for the gain stage.
    pub fn amplitude(&self) -> f32 {
        db_to_amplitude(self.volume)
    }

    /// Pull every continuous value into `limits`.
    pub fn clamped(mut self, limits: &Limits) -> Self {
        self.beat_frequency = clamp(self.beat_frequency, &limits.beat_frequency);
        self.base_frequency = clamp(self.base_frequency, &limits.base_frequency);
        self.volume = clamp(self.volume, &limits.volume);
        self
    }

    /// Work out the next state and the side effect for `control`.
    ///
    /// Continuous values are clamped into `limits`. Non-finite values are
    /// rejected and leave the state as it was.
    pub fn plan(&self, control: Control, limits: &Limits) -> Result<Transition> {
        let mut next = *self;

        let effect = match control {
            Control::Start if self.is_playing => Effect::None,
            Control::Start => {
                next.is_playing = true;
                Effect::Build
            }
            Control::Stop if !self.is_playing => Effect::None,
            Control::Stop => {
                next.is_playing = false;
                Effect::Teardown
            }
            Control::SetBeatFrequency(hz) => {
                next.beat_frequency = clamp(finite(hz, "beat frequency")?, &limits.beat_frequency);
                next.retune_effect(self)
            }
            Control::SetBaseFrequency(hz) => {
                next.base_frequency = clamp(finite(hz, "base frequency")?, &limits.base_frequency);
                next.retune_effect(self)
            }
            Control::SetVolume(db) => {
                next.volume = clamp(finite(db, "volume")?, &limits.volume);
                if self.is_playing && next.volume != self.volume {
                    Effect::Regain {
                        amplitude: next.amplitude(),
                    }
                } else {
                    Effect::None
                }
            }
            Control::SelectPreset(preset) => {
                next.preset = preset;
                next.beat_frequency = clamp(preset.beat_frequency(), &limits.beat_frequency);
                next.retune_effect(self)
            }
        };

        Ok(Transition { next, effect })
    }

    fn retune_effect(&self, previous: &SessionState) -> Effect {
        let moved = self.left_frequency() != previous.left_frequency()
            || self.right_frequency() != previous.right_frequency();

        if previous.is_playing && moved {
            Effect::Retune {
                left: self.left_frequency(),
                right: self.right_frequency(),
            }
        } else {
            Effect::None
        }
    }
}

fn finite(value: f32, parameter: &'static str) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFinite { parameter })
    }
}
