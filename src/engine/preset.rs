use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named beat frequencies.
///
/// Selecting a preset only sets the beat frequency; base frequency and
/// volume are left alone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preset {
    /// 14 Hz, beta.
    #[default]
    Concentration,
    /// 10 Hz, alpha.
    Relaxation,
    /// 6 Hz, theta.
    Meditation,
    /// 4 Hz, theta/delta border.
    DeepMeditation,
    /// 2 Hz, delta.
    Sleep,
}

impl Preset {
    /// Every preset in display order.
    pub const ALL: [Preset; 5] = [
        Preset::Concentration,
        Preset::Relaxation,
        Preset::Meditation,
        Preset::DeepMeditation,
        Preset::Sleep,
    ];

    pub fn beat_frequency(self) -> f32 {
        match self {
            Preset::Concentration => 14.0,
            Preset::Relaxation => 10.0,
            Preset::Meditation => 6.0,
            Preset::DeepMeditation => 4.0,
            Preset::Sleep => 2.0,
        }
    }

    /// Stable identifier, e.g. `deep-meditation`.
    pub fn name(self) -> &'static str {
        match self {
            Preset::Concentration => "concentration",
            Preset::Relaxation => "relaxation",
            Preset::Meditation => "meditation",
            Preset::DeepMeditation => "deep-meditation",
            Preset::Sleep => "sleep",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Concentration => "Concentration (14Hz)",
            Preset::Relaxation => "Relaxation (10Hz)",
            Preset::Meditation => "Meditation (6Hz)",
            Preset::DeepMeditation => "Deep Med (4Hz)",
            Preset::Sleep => "Sleep (2Hz)",
        }
    }

    /// Position in [`Preset::ALL`].
    pub fn index(self) -> usize {
        Preset::ALL
            .iter()
            .position(|&p| p == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset `{0}`")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_frequencies() {
        let freqs: Vec<f32> = Preset::ALL.iter().map(|p| p.beat_frequency()).collect();
        assert_eq!(freqs, [14.0, 10.0, 6.0, 4.0, 2.0]);
    }

    #[test]
    fn names_parse_back() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert_eq!(
            "nap".parse::<Preset>(),
            Err(UnknownPreset("nap".to_string()))
        );
    }

    #[test]
    fn index_matches_display_order() {
        for (i, preset) in Preset::ALL.into_iter().enumerate() {
            assert_eq!(preset.index(), i);
        }
    }
}
