//! Spring-physics animation for a single scalar value, independent of any UI framework.
//!
//! A [`Spring`] moves a value toward a target as if attached to it by a damped spring. It is driven
//! by a [`FrameScheduler`] supplied by the host, and reports every new value to a
//! [`SpringObserver`]. A [`SpringController`] adds the "animate to X after a delay" bookkeeping
//! that a UI component usually wants.
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use tensile::prelude::*;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let mut spring = Spring::builder()
//!     .from(0.0)
//!     .to(100.0)
//!     .config(Preset::Gentle)
//!     .on_update(|value| println!("{value:.2}"))
//!     .build(scheduler.clone())
//!     .unwrap();
//!
//! spring.start(0).unwrap();
//! scheduler.run_frames(Duration::from_millis(16), 1000);
//! assert_eq!(spring.value(), 100.0);
//! ```

pub mod prelude;

pub use tensile_core::{
    channel::{Channel, SlideDirection},
    config::{SpringConfig, SpringConfigOverride, Tolerances},
    controller::{SpringController, SpringOptions},
    error::{ConfigError, Result, SpringError},
    observer::{SpringCallbacks, SpringObserver},
    presets::{Preset, UnknownPreset},
    scheduler::{CancelHandle, FrameCallback, FrameLoop, FrameScheduler, ManualScheduler},
    spring::{Motion, Spring, SpringBuilder, Status},
};
