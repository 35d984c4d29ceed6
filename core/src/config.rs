//! Physical parameters of a spring, partial overrides of those parameters, and the numeric
//! tolerances that decide when a spring has come to rest.

use crate::error::{ConfigError, Result};
use crate::presets::Preset;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Distance from the target below which a spring may be considered at rest.
pub const DEFAULT_POSITION_TOLERANCE: f64 = 0.01;

/// Speed below which a spring may be considered at rest.
pub const DEFAULT_VELOCITY_TOLERANCE: f64 = 0.01;

/// Longest time step, in seconds, that a single tick will integrate.
///
/// Frames that arrive later than this (backgrounded window, debugger pause, long GC) are treated
/// as if only this much time had passed. The explicit integrator becomes unstable for the stiffer
/// presets somewhere above 1/20 s, so this leaves some headroom.
pub const DEFAULT_MAX_FRAME_SECONDS: f64 = 1.0 / 30.0;

/// Validated physical parameters of a damped spring.
///
/// The spring force is `stiffness * displacement`, opposed by `damping * velocity`, and the
/// resulting acceleration is divided by `mass`. All three values are checked on construction:
/// stiffness and mass must be positive, damping must not be negative, and none may be NaN or
/// infinite.
///
/// The older `tension` and `friction` names are accepted as synonyms for stiffness and damping,
/// both through [`from_tension`](Self::from_tension) and when deserializing:
///
/// ```
/// use tensile_core::config::SpringConfig;
///
/// let config = SpringConfig::from_tension(210.0, 20.0, 1.0).unwrap();
/// assert_eq!(config.stiffness(), 210.0);
/// assert_eq!(config.damping(), 20.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpringConfigOverride")]
pub struct SpringConfig {
    stiffness: f64,
    damping: f64,
    mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Preset::Default.config()
    }
}

impl SpringConfig {
    /// Creates a new config, returning [`InvalidConfig`](crate::error::SpringError::InvalidConfig)
    /// if any parameter is out of range.
    pub fn new(stiffness: f64, damping: f64, mass: f64) -> Result<Self> {
        let config = Self::unchecked(stiffness, damping, mass);
        config.validate()?;
        Ok(config)
    }

    /// Creates a config using the legacy `tension`/`friction` vocabulary.
    pub fn from_tension(tension: f64, friction: f64, mass: f64) -> Result<Self> {
        Self::new(tension, friction, mass)
    }

    // Only for literals that are known to be valid, i.e. the preset table.
    pub(crate) const fn unchecked(stiffness: f64, damping: f64, mass: f64) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Spring constant; restoring force per unit of displacement.
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Force per unit of velocity that opposes motion.
    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Ratio of the actual damping to critical damping, `damping / (2 * sqrt(stiffness * mass))`.
    ///
    /// Values below `1.0` oscillate around the target before settling; values at or above `1.0`
    /// approach it without (analytically) crossing it.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    /// Longest time step, in seconds, that the integrator can take with this config without
    /// oscillating or diverging: `1 / (damping / mass + sqrt(stiffness / mass))`.
    ///
    /// Longer frames are integrated in several substeps of at most this length.
    pub fn stable_time_step(&self) -> f64 {
        1.0 / (self.damping / self.mass + (self.stiffness / self.mass).sqrt())
    }

    /// Returns a copy of this config with every parameter present in `overrides` replaced.
    ///
    /// The merged result is validated as a whole, so an override can never produce an unusable
    /// config.
    pub fn merge(&self, overrides: &SpringConfigOverride) -> Result<Self> {
        Self::new(
            overrides.stiffness.unwrap_or(self.stiffness),
            overrides.damping.unwrap_or(self.damping),
            overrides.mass.unwrap_or(self.mass),
        )
    }

    /// Returns a copy of this config with a different `mass`.
    pub fn with_mass(&self, mass: f64) -> Result<Self> {
        Self::new(self.stiffness, self.damping, mass)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigError::InvalidMass(self.mass));
        }
        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return Err(ConfigError::InvalidStiffness(self.stiffness));
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(ConfigError::InvalidDamping(self.damping));
        }
        Ok(())
    }
}

impl From<Preset> for SpringConfig {
    fn from(value: Preset) -> Self {
        value.config()
    }
}

impl TryFrom<SpringConfigOverride> for SpringConfig {
    type Error = ConfigError;

    /// Fills in any missing parameters from the `default` preset.
    fn try_from(value: SpringConfigOverride) -> std::result::Result<Self, Self::Error> {
        let base = SpringConfig::default();
        let config = Self::unchecked(
            value.stiffness.unwrap_or(base.stiffness),
            value.damping.unwrap_or(base.damping),
            value.mass.unwrap_or(base.mass),
        );
        config.validate()?;
        Ok(config)
    }
}

/// A partial [`SpringConfig`], where each parameter is optional.
///
/// Overrides are merged on top of an existing config, e.g. when retargeting a spring with
/// [`set_target`](crate::spring::Spring::set_target). They are not validated on their own; only
/// the merged result is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpringConfigOverride {
    /// Replacement stiffness. Also accepted as `tension`.
    #[serde(alias = "tension", skip_serializing_if = "Option::is_none")]
    pub stiffness: Option<f64>,
    /// Replacement damping. Also accepted as `friction`.
    #[serde(alias = "friction", skip_serializing_if = "Option::is_none")]
    pub damping: Option<f64>,
    /// Replacement mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
}

impl SpringConfigOverride {
    /// Creates an empty override, which leaves every parameter unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the stiffness.
    pub fn stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    /// Legacy name for [`stiffness`](Self::stiffness).
    pub fn tension(self, tension: f64) -> Self {
        self.stiffness(tension)
    }

    /// Overrides the damping.
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }

    /// Legacy name for [`damping`](Self::damping).
    pub fn friction(self, friction: f64) -> Self {
        self.damping(friction)
    }

    /// Overrides the mass.
    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Whether this override leaves every parameter unchanged.
    pub fn is_empty(&self) -> bool {
        self.stiffness.is_none() && self.damping.is_none() && self.mass.is_none()
    }
}

impl From<SpringConfig> for SpringConfigOverride {
    fn from(value: SpringConfig) -> Self {
        Self {
            stiffness: Some(value.stiffness),
            damping: Some(value.damping),
            mass: Some(value.mass),
        }
    }
}

/// Numeric limits used by the integrator on every tick.
///
/// A spring settles once its displacement from the target is below [`position`](Self::position)
/// **and** its speed is below [`velocity`](Self::velocity), both in the same units as the animated
/// value. Independently, the time step of any single tick is clamped to
/// [`max_frame_seconds`](Self::max_frame_seconds).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Settle threshold for `|target - value|`.
    pub position: f64,
    /// Settle threshold for `|velocity|`.
    pub velocity: f64,
    /// Upper bound for the time step of a single tick, in seconds.
    pub max_frame_seconds: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION_TOLERANCE,
            velocity: DEFAULT_VELOCITY_TOLERANCE,
            max_frame_seconds: DEFAULT_MAX_FRAME_SECONDS,
        }
    }
}

impl Tolerances {
    /// Checks that every tolerance is positive and finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("position", self.position),
            ("velocity", self.velocity),
            ("max_frame_seconds", self.max_frame_seconds),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidTolerance { name, value }.into());
            }
        }
        Ok(())
    }

    /// Converts a measured frame interval into the time step actually integrated, in seconds.
    ///
    /// Negative intervals (clock went backward) become zero; anything longer than
    /// [`max_frame_seconds`](Self::max_frame_seconds) is cut down to it.
    pub fn clamp_frame_time(&self, elapsed: Option<Duration>) -> f64 {
        match elapsed {
            Some(elapsed) => elapsed.as_secs_f64().min(self.max_frame_seconds),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpringError;

    mod spring_config {
        use super::*;

        #[test]
        fn when_parameters_valid_then_created() {
            let config = SpringConfig::new(120.0, 14.0, 2.0).unwrap();

            assert_eq!(config.stiffness(), 120.0);
            assert_eq!(config.damping(), 14.0);
            assert_eq!(config.mass(), 2.0);
        }

        #[test]
        fn when_mass_not_positive_then_rejected() {
            assert_eq!(
                SpringConfig::new(170.0, 26.0, 0.0),
                Err(SpringError::InvalidConfig(ConfigError::InvalidMass(0.0)))
            );
            assert_eq!(
                SpringConfig::new(170.0, 26.0, -1.0),
                Err(SpringError::InvalidConfig(ConfigError::InvalidMass(-1.0)))
            );
            assert!(SpringConfig::new(170.0, 26.0, f64::NAN).is_err());
        }

        #[test]
        fn when_stiffness_or_damping_out_of_range_then_rejected() {
            assert_eq!(
                SpringConfig::new(-5.0, 26.0, 1.0),
                Err(SpringError::InvalidConfig(ConfigError::InvalidStiffness(-5.0)))
            );
            assert_eq!(
                SpringConfig::new(170.0, -0.5, 1.0),
                Err(SpringError::InvalidConfig(ConfigError::InvalidDamping(-0.5)))
            );
            assert!(SpringConfig::new(f64::INFINITY, 26.0, 1.0).is_err());
        }

        #[test]
        fn zero_damping_is_allowed() {
            assert!(SpringConfig::new(100.0, 0.0, 1.0).is_ok());
        }

        #[test]
        fn legacy_names_map_to_stiffness_and_damping() {
            let config = SpringConfig::from_tension(300.0, 30.0, 1.0).unwrap();

            assert_eq!(config, SpringConfig::new(300.0, 30.0, 1.0).unwrap());
        }

        #[test]
        fn merge_replaces_only_present_parameters() {
            let base = SpringConfig::new(170.0, 26.0, 1.0).unwrap();

            let merged = base
                .merge(&SpringConfigOverride::new().tension(300.0))
                .unwrap();

            assert_eq!(merged, SpringConfig::new(300.0, 26.0, 1.0).unwrap());
        }

        #[test]
        fn when_merged_result_invalid_then_rejected() {
            let base = SpringConfig::default();

            assert_eq!(
                base.merge(&SpringConfigOverride::new().mass(0.0)),
                Err(SpringError::InvalidConfig(ConfigError::InvalidMass(0.0)))
            );
        }

        #[test]
        fn stable_time_step_shrinks_with_stiffness_and_damping() {
            let slow = SpringConfig::new(40.0, 10.0, 1.0).unwrap();
            let damped = SpringConfig::new(170.0, 200.0, 1.0).unwrap();
            let stiff = SpringConfig::new(5000.0, 100.0, 1.0).unwrap();

            assert!(slow.stable_time_step() > DEFAULT_MAX_FRAME_SECONDS);
            assert!(damped.stable_time_step() < 0.005);
            assert!(stiff.stable_time_step() < 0.006);
            assert!(
                (SpringConfig::new(100.0, 10.0, 1.0).unwrap().stable_time_step() - 0.05).abs()
                    < 1e-12
            );
        }

        #[test]
        fn damping_ratio_of_default_is_near_critical() {
            let ratio = SpringConfig::default().damping_ratio();

            assert!(ratio > 0.99 && ratio < 1.0, "ratio was {ratio}");
        }
    }

    mod deserialize {
        use super::*;

        #[test]
        fn accepts_legacy_aliases() {
            let config: SpringConfig =
                serde_json::from_str(r#"{ "tension": 210, "friction": 20 }"#).unwrap();

            assert_eq!(config, SpringConfig::new(210.0, 20.0, 1.0).unwrap());
        }

        #[test]
        fn fills_missing_parameters_from_default_preset() {
            let config: SpringConfig = serde_json::from_str(r#"{ "mass": 3 }"#).unwrap();

            assert_eq!(config, SpringConfig::new(170.0, 26.0, 3.0).unwrap());
        }

        #[test]
        fn rejects_invalid_mass() {
            let result = serde_json::from_str::<SpringConfig>(r#"{ "mass": 0 }"#);

            assert!(result.is_err());
        }

        #[test]
        fn override_from_toml() {
            let overrides: SpringConfigOverride = toml::from_str("friction = 12.5").unwrap();

            assert_eq!(overrides, SpringConfigOverride::new().damping(12.5));
        }

        #[test]
        fn override_rejects_unknown_fields() {
            let result = toml::from_str::<SpringConfigOverride>("bounciness = 2.0");

            assert!(result.is_err());
        }
    }

    mod tolerances {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            assert_eq!(Tolerances::default().validate(), Ok(()));
        }

        #[test]
        fn when_tolerance_not_positive_then_rejected() {
            let tolerances = Tolerances {
                velocity: 0.0,
                ..Tolerances::default()
            };

            assert_eq!(
                tolerances.validate(),
                Err(SpringError::InvalidConfig(ConfigError::InvalidTolerance {
                    name: "velocity",
                    value: 0.0
                }))
            );
        }

        #[test]
        fn clamp_frame_time_bounds_long_frames() {
            let tolerances = Tolerances::default();

            assert_eq!(tolerances.clamp_frame_time(None), 0.0);
            assert_eq!(
                tolerances.clamp_frame_time(Some(Duration::from_millis(16))),
                0.016
            );
            assert_eq!(
                tolerances.clamp_frame_time(Some(Duration::from_secs(10))),
                DEFAULT_MAX_FRAME_SECONDS
            );
        }
    }
}
