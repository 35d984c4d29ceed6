//! Contains the [`Preset`] enum of named spring configurations.

use crate::config::SpringConfig;
use enum_map::{enum_map, Enum, EnumMap};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A named, ready-made [`SpringConfig`].
///
/// All presets use a mass of `1.0`; use [`SpringConfig::with_mass`] or a
/// [`SpringConfigOverride`](crate::config::SpringConfigOverride) for heavier or lighter springs.
///
/// | Preset    | Stiffness | Damping |
/// |-----------|-----------|---------|
/// | `gentle`  | 120       | 14      |
/// | `wobbly`  | 180       | 12      |
/// | `stiff`   | 210       | 20      |
/// | `slow`    | 40        | 10      |
/// | `default` | 170       | 26      |
#[derive(Clone, Copy, Debug, Default, Enum, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Soft spring with a small overshoot.
    Gentle,
    /// Underdamped spring that visibly bounces around its target.
    Wobbly,
    /// Fast and snappy, with very little overshoot.
    Stiff,
    /// Weak spring that takes its time.
    Slow,
    /// Close to critically damped; no visible overshoot.
    #[default]
    Default,
}

lazy_static! {
    static ref PRESETS: EnumMap<Preset, SpringConfig> = enum_map! {
        Preset::Gentle => SpringConfig::unchecked(120.0, 14.0, 1.0),
        Preset::Wobbly => SpringConfig::unchecked(180.0, 12.0, 1.0),
        Preset::Stiff => SpringConfig::unchecked(210.0, 20.0, 1.0),
        Preset::Slow => SpringConfig::unchecked(40.0, 10.0, 1.0),
        Preset::Default => SpringConfig::unchecked(170.0, 26.0, 1.0),
    };
}

impl Preset {
    /// Every preset, in declaration order.
    pub const ALL: [Preset; 5] = [
        Preset::Gentle,
        Preset::Wobbly,
        Preset::Stiff,
        Preset::Slow,
        Preset::Default,
    ];

    /// Gets the configuration for this preset.
    pub fn config(self) -> SpringConfig {
        PRESETS[self]
    }

    /// The lowercase name of the preset, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Preset::Gentle => "gentle",
            Preset::Wobbly => "wobbly",
            Preset::Stiff => "stiff",
            Preset::Slow => "slow",
            Preset::Default => "default",
        }
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

/// Error produced by parsing a [`Preset`] from a name that does not exist.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown spring preset `{0}`")]
pub struct UnknownPreset(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_published_values() {
        let expected = [
            (Preset::Gentle, 120.0, 14.0),
            (Preset::Wobbly, 180.0, 12.0),
            (Preset::Stiff, 210.0, 20.0),
            (Preset::Slow, 40.0, 10.0),
            (Preset::Default, 170.0, 26.0),
        ];

        for (preset, stiffness, damping) in expected {
            assert_eq!(
                preset.config(),
                SpringConfig::new(stiffness, damping, 1.0).unwrap(),
                "{preset}"
            );
        }
    }

    #[test]
    fn default_preset_is_default_config() {
        assert_eq!(Preset::default().config(), SpringConfig::default());
    }

    #[test]
    fn parses_from_name() {
        assert_eq!("wobbly".parse::<Preset>(), Ok(Preset::Wobbly));
        assert_eq!("Stiff".parse::<Preset>(), Ok(Preset::Stiff));
        assert_eq!(
            "bouncy".parse::<Preset>(),
            Err(UnknownPreset("bouncy".to_string()))
        );
    }

    #[test]
    fn names_round_trip_through_display() {
        for preset in Preset::ALL {
            assert_eq!(preset.to_string().parse::<Preset>(), Ok(preset));
        }
    }

    #[test]
    fn deserializes_from_lowercase_name() {
        let preset: Preset = serde_json::from_str(r#""gentle""#).unwrap();

        assert_eq!(preset, Preset::Gentle);
    }
}
