//! Core types for Tensile.
//!
//! This crate holds the spring integrator and everything it depends on. Applications normally
//! depend on `tensile` instead, which re-exports the important types.

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod presets;
pub mod scheduler;
pub mod spring;
