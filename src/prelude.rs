//! Includes the types commonly used for building spring animations.

pub use crate::{
    Channel, FrameLoop, FrameScheduler, ManualScheduler, Preset, SlideDirection, Spring,
    SpringCallbacks, SpringConfig, SpringConfigOverride, SpringController, SpringObserver,
    SpringOptions, Status, Tolerances,
};
