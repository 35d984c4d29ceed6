//! Error types shared by the spring integrator and its controller.

use thiserror::Error;

/// Errors produced when configuring or starting a spring.
///
/// Configuration problems are always reported synchronously by the call that introduced them
/// (construction, retargeting with an override,
/// [`set_tolerances`](crate::spring::Spring::set_tolerances)), never from inside a tick.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SpringError {
    /// The spring parameters or tolerances were rejected.
    #[error("invalid spring configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The [`FrameScheduler`](crate::scheduler::FrameScheduler) refused to schedule a callback.
    ///
    /// The spring that attempted to start is left in the state it was in before the call.
    #[error("frame scheduler is unavailable")]
    SchedulerUnavailable,
}

/// Specific reason a [`SpringConfig`](crate::config::SpringConfig) or
/// [`Tolerances`](crate::config::Tolerances) value was rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Mass is divided into the spring force on every tick, so it must be positive.
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f64),

    /// A spring with no (or negative) stiffness never pulls toward its target.
    #[error("stiffness must be positive and finite, got {0}")]
    InvalidStiffness(f64),

    #[error("damping must be non-negative and finite, got {0}")]
    InvalidDamping(f64),

    /// Animated values and targets must be ordinary numbers.
    #[error("value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// Settle thresholds must be positive, otherwise a spring could never come to rest.
    #[error("tolerance `{name}` must be positive and finite, got {value}")]
    InvalidTolerance {
        /// Name of the offending tolerance field.
        name: &'static str,
        /// Value that was supplied.
        value: f64,
    },
}

/// Result type for spring operations.
pub type Result<T> = std::result::Result<T, SpringError>;
