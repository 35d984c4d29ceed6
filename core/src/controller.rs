//! High-level control over a single spring, for callers that think in terms of "animate this value
//! to X" rather than in runs and targets.

use crate::config::{SpringConfig, SpringConfigOverride};
use crate::error::Result;
use crate::observer::SpringObserver;
use crate::presets::Preset;
use crate::scheduler::FrameScheduler;
use crate::spring::Spring;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::debug;

/// Construction options for a [`SpringController`].
///
/// Options can be written out in code, or loaded from any serde format:
///
/// ```
/// use tensile_core::controller::SpringOptions;
/// use tensile_core::presets::Preset;
///
/// let options: SpringOptions = serde_json::from_str(
///     r#"{ "to": 1.0, "preset": "wobbly", "config": { "friction": 8 }, "delay": 150 }"#,
/// ).unwrap();
/// assert_eq!(options.preset, Some(Preset::Wobbly));
/// assert_eq!(options.delay_ms, 150);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringOptions {
    /// Initial value.
    pub from: f64,
    /// Value to animate to when [`immediate`](Self::immediate) is set.
    pub to: f64,
    /// Base parameters. Uses [`Preset::Default`] if not specified.
    pub preset: Option<Preset>,
    /// Individual parameters applied on top of the [`preset`](Self::preset).
    pub config: SpringConfigOverride,
    /// Whether to start animating from [`from`](Self::from) to [`to`](Self::to) as soon as the
    /// controller is created.
    pub immediate: bool,
    /// Delay, in milliseconds of frame-clock time, before each animation that starts from rest.
    #[serde(alias = "delay")]
    pub delay_ms: u32,
}

impl SpringOptions {
    /// Options for a spring from `from` to `to` that waits to be animated explicitly.
    pub fn new(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            ..Default::default()
        }
    }

    /// Fades from fully transparent to fully opaque as soon as the controller is created; bind
    /// the value to [`Channel::Opacity`](crate::channel::Channel::Opacity).
    pub fn fade_in() -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            config: SpringConfigOverride::new().tension(100.0).friction(20.0),
            immediate: true,
            ..Default::default()
        }
    }

    /// Slides `distance` units into place as soon as the controller is created. The value goes
    /// from `distance` to `0.0`; use a [`SlideDirection`](crate::channel::SlideDirection) to
    /// decide which way it travels.
    pub fn slide_in(distance: f64) -> Self {
        Self {
            from: distance,
            to: 0.0,
            config: SpringConfigOverride::new().tension(150.0).friction(20.0),
            immediate: true,
            ..Default::default()
        }
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    /// Replaces the parameter overrides.
    pub fn config(mut self, config: SpringConfigOverride) -> Self {
        self.config = config;
        self
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Resolves the preset and overrides into a validated [`SpringConfig`].
    pub fn resolve_config(&self) -> Result<SpringConfig> {
        self.preset.unwrap_or_default().config().merge(&self.config)
    }
}

/// Drives one [`Spring`] on behalf of a caller that issues "animate to X" requests, such as a UI
/// component.
///
/// Every request is measured against the controller's _base_ configuration (resolved once from its
/// [`SpringOptions`]), so an override passed to [`animate`](Self::animate) applies to that
/// animation only. Dropping the controller cancels any frame or start delay it is waiting on.
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use tensile_core::controller::{SpringController, SpringOptions};
/// use tensile_core::scheduler::ManualScheduler;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let mut controller = SpringController::new(SpringOptions::fade_in(), scheduler.clone()).unwrap();
/// assert!(controller.is_animating());
///
/// scheduler.run_frames(Duration::from_millis(16), 1000);
/// assert_eq!(controller.value(), 1.0);
///
/// controller.animate(0.0, None).unwrap();
/// scheduler.run_frames(Duration::from_millis(16), 1000);
/// assert_eq!(controller.value(), 0.0);
/// ```
#[derive(Debug)]
pub struct SpringController {
    spring: Spring,
    base: SpringConfig,
    delay_ms: u32,
}

impl SpringController {
    /// Creates a controller with no observer.
    pub fn new(options: SpringOptions, scheduler: Rc<dyn FrameScheduler>) -> Result<Self> {
        Self::build(options, scheduler, None)
    }

    /// Creates a controller whose spring reports to `observer`.
    pub fn with_observer(
        options: SpringOptions,
        scheduler: Rc<dyn FrameScheduler>,
        observer: impl SpringObserver + 'static,
    ) -> Result<Self> {
        Self::build(options, scheduler, Some(Box::new(observer)))
    }

    fn build(
        options: SpringOptions,
        scheduler: Rc<dyn FrameScheduler>,
        observer: Option<Box<dyn SpringObserver>>,
    ) -> Result<Self> {
        let base = options.resolve_config()?;
        let mut builder = Spring::builder()
            .from(options.from)
            .to(options.from)
            .config(base);
        if let Some(observer) = observer {
            builder = builder.observer(observer);
        }
        let mut controller = Self {
            spring: builder.build(scheduler)?,
            base,
            delay_ms: options.delay_ms,
        };
        if options.immediate && options.to != options.from {
            controller.animate(options.to, None)?;
        }
        Ok(controller)
    }

    /// Animates toward `to`, optionally with different spring parameters for this animation.
    ///
    /// When the spring is at rest, a new run begins after the configured delay. When it is already
    /// moving (or waiting out its delay), it is retargeted in place and keeps its momentum.
    pub fn animate(&mut self, to: f64, overrides: Option<SpringConfigOverride>) -> Result<()> {
        let config = match overrides {
            Some(overrides) => self.base.merge(&overrides)?,
            None => self.base,
        };
        self.spring.set_target(to, Some(config.into()))?;
        if self.spring.is_active() {
            return Ok(());
        }
        debug!(to, delay_ms = self.delay_ms, "controller starting animation");
        self.spring.start(self.delay_ms)
    }

    /// Stops any animation in progress, including one still waiting for its delay. The value stays
    /// where it is.
    pub fn stop(&mut self) {
        self.spring.stop();
    }

    /// Sets the value immediately, without animating, and stops any animation in progress.
    pub fn set_value(&mut self, value: f64) -> Result<()> {
        self.spring.jump_to(value)
    }

    pub fn value(&self) -> f64 {
        self.spring.value()
    }

    /// Whether an animation is running or waiting for its start delay.
    pub fn is_animating(&self) -> bool {
        self.spring.is_active()
    }

    /// Base configuration, before any per-animation override.
    pub fn config(&self) -> SpringConfig {
        self.base
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// The underlying spring, for inspection.
    pub fn spring(&self) -> &Spring {
        &self.spring
    }

    /// The underlying spring, for direct control (e.g. replacing its observer).
    pub fn spring_mut(&mut self) -> &mut Spring {
        &mut self.spring
    }
}
