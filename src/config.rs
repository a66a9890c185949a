//! Engine configuration.

use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::SessionState;

/// Beat frequency range in Hz.
pub const BEAT_FREQUENCY_RANGE: RangeInclusive<f32> = 1.0..=30.0;
/// Base (carrier) frequency range in Hz.
pub const BASE_FREQUENCY_RANGE: RangeInclusive<f32> = 20.0..=500.0;
/// Commands the render ring can hold between two audio callbacks.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;
/// Smallest ring that holds the largest single batch: the first start
/// queues 11 commands, a dispose after an unpublished stop queues 12.
pub const MIN_COMMAND_CAPACITY: usize = 16;

/// Lower end of the volume control. The top is always 0 dB.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeRange {
    /// -60 dB to 0 dB.
    #[default]
    Standard,
    /// -40 dB to 0 dB.
    Narrow,
}

impl VolumeRange {
    pub fn floor_db(self) -> f32 {
        match self {
            VolumeRange::Standard => -60.0,
            VolumeRange::Narrow => -40.0,
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        self.floor_db()..=0.0
    }
}

/// Valid ranges for the three continuous controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    pub beat_frequency: RangeInclusive<f32>,
    pub base_frequency: RangeInclusive<f32>,
    pub volume: RangeInclusive<f32>,
}

impl Limits {
    pub fn new(volume_range: VolumeRange) -> Self {
        Self {
            beat_frequency: BEAT_FREQUENCY_RANGE,
            base_frequency: BASE_FREQUENCY_RANGE,
            volume: volume_range.range(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(VolumeRange::default())
    }
}

/// Clamp `value` into `range`.
pub(crate) fn clamp(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    volume_range: VolumeRange,
    command_capacity: usize,
    session: SessionState,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            volume_range: VolumeRange::Standard,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            session: SessionState::default(),
        }
    }

    /// Set the span of the volume control.
    pub fn with_volume_range(mut self, range: VolumeRange) -> Self {
        self.volume_range = range;
        self
    }

    /// Set the size of the control → render command ring.
    ///
    /// One start or stop queues about a dozen commands; the default leaves
    /// plenty of room for slider drags between two audio callbacks. Values
    /// below [`MIN_COMMAND_CAPACITY`] are raised to it.
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(MIN_COMMAND_CAPACITY);
        self
    }

    /// Initial session values. `is_playing` is ignored; engines start stopped.
    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn volume_range(&self) -> VolumeRange {
        self.volume_range
    }

    pub fn command_capacity(&self) -> usize {
        // A deserialized config skips the builder.
        self.command_capacity.max(MIN_COMMAND_CAPACITY)
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn limits(&self) -> Limits {
        Limits::new(self.volume_range)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
