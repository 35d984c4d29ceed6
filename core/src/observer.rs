//! Receivers for the values produced by a running spring.

/// Receives the output of a [`Spring`](crate::spring::Spring).
///
/// Both methods have empty default implementations, so an observer only needs to implement the
/// notifications it cares about. Notifications are delivered on the thread that runs the frame
/// scheduler, after the spring has finished updating its own state; an observer may therefore call
/// back into the spring (for example to chain another animation from `on_complete`).
pub trait SpringObserver {
    /// Called once per tick with the newly integrated value, and once more with the exact target
    /// when the spring settles.
    fn on_update(&mut self, _value: f64) {}

    /// Called exactly once when a run settles on its target. Not called when the run is stopped.
    fn on_complete(&mut self) {}
}

impl<T: SpringObserver + ?Sized> SpringObserver for Box<T> {
    fn on_update(&mut self, value: f64) {
        (**self).on_update(value);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}

/// A [`SpringObserver`] made from closures.
///
/// ```
/// use tensile_core::observer::{SpringCallbacks, SpringObserver};
///
/// let mut callbacks = SpringCallbacks::new()
///     .with_update(|value| println!("value = {value}"))
///     .with_complete(|| println!("done"));
/// callbacks.on_update(0.5);
/// ```
#[derive(Default)]
pub struct SpringCallbacks {
    on_update: Option<Box<dyn FnMut(f64)>>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl SpringCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the closure invoked for every reported value, replacing any previous one.
    pub fn with_update(mut self, on_update: impl FnMut(f64) + 'static) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Sets the closure invoked when a run completes, replacing any previous one.
    pub fn with_complete(mut self, on_complete: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Whether neither closure has been set.
    pub fn is_empty(&self) -> bool {
        self.on_update.is_none() && self.on_complete.is_none()
    }
}

impl SpringObserver for SpringCallbacks {
    fn on_update(&mut self, value: f64) {
        if let Some(on_update) = self.on_update.as_mut() {
            on_update(value);
        }
    }

    fn on_complete(&mut self) {
        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete();
        }
    }
}

impl std::fmt::Debug for SpringCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringCallbacks")
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
