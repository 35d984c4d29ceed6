//! The spring integrator: a single animated scalar that follows a damped spring toward its target,
//! one scheduled frame at a time.
//!
//! # Lifecycle
//!
//! A [`Spring`] starts out [`Idle`](Status::Idle), holding its initial value. Calling
//! [`start`](Spring::start) (or [`animate`](Spring::animate)) begins a _run_:
//!
//! - with no delay, the spring becomes [`Running`](Status::Running) and performs its first tick
//!   immediately;
//! - with a delay, it is [`Scheduled`](Status::Scheduled) until the delay elapses on the frame
//!   clock, and then becomes `Running` on its first tick.
//!
//! A run ends in [`Settled`](Status::Settled), either because the spring came to rest on its target
//! (the observer receives `on_complete`) or because it was [stopped](Spring::stop) (it does not).
//! A settled spring can be started again at any time; it continues from wherever it stopped.
//!
//! # Integration
//!
//! Each tick applies semi-implicit (symplectic) Euler integration:
//!
//! ```text
//! acceleration = (stiffness * (target - value) - damping * velocity) / mass
//! velocity    += acceleration * dt
//! value       += velocity * dt
//! ```
//!
//! where `dt` is the measured time since the previous tick, clamped to
//! [`Tolerances::max_frame_seconds`]. When `dt` is longer than the config's
//! [stable time step](SpringConfig::stable_time_step), the tick is split into equal substeps that
//! are not, so very stiff or heavily damped springs never blow up. The first tick of every run has
//! `dt = 0`. Because the state is
//! only ever advanced incrementally, the target and the spring parameters may both be changed
//! while a run is in progress without any discontinuity in the value.

use crate::config::{SpringConfig, SpringConfigOverride, Tolerances};
use crate::error::{ConfigError, Result};
use crate::observer::{SpringCallbacks, SpringObserver};
use crate::scheduler::{CancelHandle, FrameScheduler};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`Spring`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Status {
    /// Never started.
    #[default]
    Idle,
    /// Started with a delay that has not elapsed yet.
    Scheduled,
    /// Ticking on every frame.
    Running,
    /// Came to rest on the target, or was stopped.
    Settled,
}

/// Instantaneous physical state of a spring.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    pub value: f64,
    pub velocity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Notice {
    Update(f64),
    Complete,
}

enum Step {
    Moving(f64),
    Settled { reported: f64 },
}

struct SpringState {
    motion: Motion,
    target: f64,
    config: SpringConfig,
    tolerances: Tolerances,
    status: Status,
    // Incremented whenever a run starts or is abandoned. Callbacks and notices belonging to any
    // other run are ignored.
    run: u64,
    pending: Option<CancelHandle>,
    last_frame: Option<Duration>,
    scheduler: Rc<dyn FrameScheduler>,
    observer: Option<Box<dyn SpringObserver>>,
    outbox: VecDeque<(u64, Notice)>,
    delivering: bool,
}

impl SpringState {
    fn step(&mut self, now: Duration) -> Step {
        let elapsed = self.last_frame.and_then(|last| now.checked_sub(last));
        self.last_frame = Some(now);
        let dt = self.tolerances.clamp_frame_time(elapsed);

        let Motion { value, velocity } = self.motion;
        let (substeps, h) = split_step(dt, self.config.stable_time_step());
        let mut next = self.motion;
        let mut displacement = self.target - value;
        for _ in 0..substeps {
            displacement = self.target - next.value;
            let spring_force = self.config.stiffness() * displacement;
            let damping_force = self.config.damping() * next.velocity;
            let acceleration = (spring_force - damping_force) / self.config.mass();
            next.velocity += acceleration * h;
            next.value += next.velocity * h;
        }

        if !(next.value.is_finite() && next.velocity.is_finite()) {
            warn!(
                value,
                velocity, dt, "spring produced a non-finite result; settling on target"
            );
            self.settle();
            return Step::Settled { reported: value };
        }

        self.motion = next;
        trace!(
            value = next.value,
            velocity = next.velocity,
            dt,
            substeps,
            "spring tick"
        );

        if displacement.abs() < self.tolerances.position
            && next.velocity.abs() < self.tolerances.velocity
        {
            self.settle();
            return Step::Settled {
                reported: next.value,
            };
        }
        Step::Moving(next.value)
    }

    fn settle(&mut self) {
        self.motion = Motion {
            value: self.target,
            velocity: 0.0,
        };
        self.status = Status::Settled;
        self.last_frame = None;
        debug!(to = self.target, "spring settled");
    }

    fn post(&mut self, step: Step) {
        match step {
            Step::Moving(value) => self.outbox.push_back((self.run, Notice::Update(value))),
            Step::Settled { reported } => {
                self.outbox.push_back((self.run, Notice::Update(reported)));
                self.outbox.push_back((self.run, Notice::Update(self.target)));
                self.outbox.push_back((self.run, Notice::Complete));
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

// Most integration substeps a single tick may take. Past this, the spring runs slower than the
// frame clock rather than taking steps it cannot integrate stably.
const MAX_SUBSTEPS: u32 = 64;

// Splits `dt` into equal substeps no longer than `stable`.
fn split_step(dt: f64, stable: f64) -> (u32, f64) {
    let count = ((dt / stable).ceil().min(MAX_SUBSTEPS as f64) as u32).max(1);
    (count, (dt / f64::from(count)).min(stable))
}

fn schedule_frame(
    state: Weak<RefCell<SpringState>>,
    scheduler: &dyn FrameScheduler,
    delay: Option<Duration>,
    run: u64,
) -> Result<CancelHandle> {
    let callback = Box::new(move |now| {
        if let Some(state) = state.upgrade() {
            run_frame(&state, run, now);
        }
    });
    match delay {
        Some(delay) => scheduler.schedule_after(delay, callback),
        None => scheduler.schedule_once(callback),
    }
}

fn run_frame(state: &Rc<RefCell<SpringState>>, run: u64, now: Duration) {
    {
        let mut s = state.borrow_mut();
        if s.run != run || !matches!(s.status, Status::Scheduled | Status::Running) {
            trace!(run, "ignoring stale spring frame");
            return;
        }
        s.pending = None;
        if s.status == Status::Scheduled {
            debug!(value = s.motion.value, to = s.target, "spring delay elapsed");
            s.status = Status::Running;
            s.last_frame = Some(now);
        }
        let step = s.step(now);
        if matches!(step, Step::Moving(_)) {
            let scheduler = s.scheduler.clone();
            match schedule_frame(Rc::downgrade(state), &*scheduler, None, run) {
                Ok(handle) => s.pending = Some(handle),
                Err(error) => {
                    warn!(%error, "could not schedule next spring frame; stopping");
                    s.run += 1;
                    s.status = Status::Settled;
                    s.motion.velocity = 0.0;
                    s.last_frame = None;
                    s.post(step);
                    drop(s);
                    deliver(state);
                    return;
                }
            }
        }
        s.post(step);
    }
    deliver(state);
}

// Hands queued notices to the observer with no borrow held. Re-entrant calls (an observer that
// restarts its own spring) only enqueue; the outermost call drains everything.
fn deliver(state: &RefCell<SpringState>) {
    let mut observer = {
        let mut s = state.borrow_mut();
        if s.delivering {
            return;
        }
        match s.observer.take() {
            Some(observer) => {
                s.delivering = true;
                observer
            }
            None => {
                s.outbox.clear();
                return;
            }
        }
    };
    loop {
        let notice = {
            let mut s = state.borrow_mut();
            let current_run = s.run;
            let mut next = None;
            while let Some((run, notice)) = s.outbox.pop_front() {
                if run == current_run {
                    next = Some(notice);
                    break;
                }
            }
            next
        };
        match notice {
            Some(Notice::Update(value)) => observer.on_update(value),
            Some(Notice::Complete) => observer.on_complete(),
            None => break,
        }
    }
    let mut s = state.borrow_mut();
    s.delivering = false;
    if s.observer.is_none() {
        s.observer = Some(observer);
    }
}

fn check_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFiniteValue(value).into())
    }
}

/// A single animated scalar driven by damped spring physics.
///
/// The spring is exclusively owned by whoever created it; all of its methods, and all frames of
/// the [`FrameScheduler`] that drives it, must run on the same thread. The scheduler only holds a
/// weak reference to the spring's state, so dropping the spring is always safe and also cancels
/// whatever frame or delay it was waiting on.
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use tensile_core::presets::Preset;
/// use tensile_core::scheduler::ManualScheduler;
/// use tensile_core::spring::{Spring, Status};
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let mut spring = Spring::builder()
///     .from(0.0)
///     .to(1.0)
///     .config(Preset::Stiff)
///     .on_complete(|| println!("settled"))
///     .build(scheduler.clone())
///     .unwrap();
///
/// spring.start(0).unwrap();
/// scheduler.run_frames(Duration::from_millis(16), 1000);
///
/// assert_eq!(spring.status(), Status::Settled);
/// assert_eq!(spring.value(), 1.0);
/// ```
pub struct Spring {
    state: Rc<RefCell<SpringState>>,
}

impl Spring {
    /// Creates an idle spring at `from`, which will move toward `to` once started.
    pub fn new(
        from: f64,
        to: f64,
        config: SpringConfig,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Result<Self> {
        Self::builder().from(from).to(to).config(config).build(scheduler)
    }

    /// Creates a [`SpringBuilder`] with default values.
    pub fn builder() -> SpringBuilder {
        SpringBuilder::default()
    }

    /// Begins a run toward the current target, after `delay_ms` milliseconds of frame-clock time.
    ///
    /// With no delay, the first tick happens before this method returns. Starting a spring that is
    /// already scheduled or running abandons the current run (without completing it) and begins a
    /// new one from the current value and velocity, so there is no visible jump.
    ///
    /// Returns [`SchedulerUnavailable`](crate::error::SpringError::SchedulerUnavailable) if the
    /// frame scheduler refuses the request, in which case the spring is left exactly as it was.
    pub fn start(&mut self, delay_ms: u32) -> Result<()> {
        let weak = Rc::downgrade(&self.state);
        {
            let mut s = self.state.borrow_mut();
            let run = s.run + 1;
            let scheduler = s.scheduler.clone();
            let delay = (delay_ms > 0).then(|| Duration::from_millis(delay_ms.into()));
            // Reserve the next frame before touching any state, so that a failure leaves nothing
            // half-started.
            let handle = schedule_frame(weak, &*scheduler, delay, run)?;
            s.cancel_pending();
            s.run = run;
            s.pending = Some(handle);
            debug!(
                value = s.motion.value,
                to = s.target,
                delay_ms,
                "spring started"
            );
            if delay.is_some() {
                s.status = Status::Scheduled;
                s.last_frame = None;
                return Ok(());
            }

            let now = scheduler.now();
            s.status = Status::Running;
            s.last_frame = Some(now);
            let step = s.step(now);
            if matches!(step, Step::Settled { .. }) {
                s.cancel_pending();
            }
            s.post(step);
        }
        deliver(&self.state);
        Ok(())
    }

    /// Abandons the current run, if any, leaving the value wherever it currently is.
    ///
    /// The observer does not receive `on_complete`, and no further notifications from the
    /// abandoned run are delivered. Stopping a spring that is idle or already settled does nothing.
    pub fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        if !matches!(s.status, Status::Scheduled | Status::Running) {
            return;
        }
        s.cancel_pending();
        s.run += 1;
        s.status = Status::Settled;
        s.motion.velocity = 0.0;
        s.last_frame = None;
        debug!(value = s.motion.value, "spring stopped");
    }

    /// Changes the target, optionally merging new spring parameters over the current ones.
    ///
    /// Value and velocity are untouched, so a running spring carries its momentum toward the new
    /// target. An idle or settled spring does not start moving until it is started again.
    pub fn set_target(
        &mut self,
        target: f64,
        overrides: Option<SpringConfigOverride>,
    ) -> Result<()> {
        let target = check_finite(target)?;
        let mut s = self.state.borrow_mut();
        let config = match overrides {
            Some(overrides) => s.config.merge(&overrides)?,
            None => s.config,
        };
        s.target = target;
        s.config = config;
        debug!(to = target, status = ?s.status, "spring retargeted");
        Ok(())
    }

    /// Retargets the spring and makes sure it is moving.
    ///
    /// A running or scheduled spring simply continues toward the new target from its current value
    /// and velocity. An idle or settled one is [started](Self::start) with no delay.
    pub fn animate(&mut self, target: f64, overrides: Option<SpringConfigOverride>) -> Result<()> {
        self.set_target(target, overrides)?;
        if self.is_active() {
            Ok(())
        } else {
            self.start(0)
        }
    }

    /// Moves the spring to `value` instantly, without animating, and stops any run in progress.
    ///
    /// The target is moved as well, so a later [`start`](Self::start) has nothing to do until the
    /// target changes again.
    pub fn jump_to(&mut self, value: f64) -> Result<()> {
        let value = check_finite(value)?;
        self.stop();
        let mut s = self.state.borrow_mut();
        s.motion = Motion {
            value,
            velocity: 0.0,
        };
        s.target = value;
        Ok(())
    }

    /// Current value. Before the first tick this is the initial value; once settled it is exactly
    /// the target.
    pub fn value(&self) -> f64 {
        self.state.borrow().motion.value
    }

    pub fn velocity(&self) -> f64 {
        self.state.borrow().motion.velocity
    }

    pub fn motion(&self) -> Motion {
        self.state.borrow().motion
    }

    pub fn target(&self) -> f64 {
        self.state.borrow().target
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status
    }

    /// Whether the spring is currently ticking. A spring waiting out its start delay is not running
    /// yet; see [`is_active`](Self::is_active).
    pub fn is_running(&self) -> bool {
        self.status() == Status::Running
    }

    /// Whether a run is in progress, including one still waiting for its start delay.
    pub fn is_active(&self) -> bool {
        matches!(self.status(), Status::Scheduled | Status::Running)
    }

    pub fn config(&self) -> SpringConfig {
        self.state.borrow().config
    }

    /// Replaces the spring parameters. Takes effect on the next tick, including mid-run.
    pub fn set_config(&mut self, config: impl Into<SpringConfig>) {
        self.state.borrow_mut().config = config.into();
    }

    pub fn tolerances(&self) -> Tolerances {
        self.state.borrow().tolerances
    }

    /// Replaces the settle thresholds and frame-time limit.
    pub fn set_tolerances(&mut self, tolerances: Tolerances) -> Result<()> {
        tolerances.validate()?;
        self.state.borrow_mut().tolerances = tolerances;
        Ok(())
    }

    /// Replaces the observer that receives this spring's updates.
    pub fn set_observer(&mut self, observer: impl SpringObserver + 'static) {
        self.state.borrow_mut().observer = Some(Box::new(observer));
    }

    /// Removes the observer; subsequent ticks still run but are not reported.
    pub fn clear_observer(&mut self) {
        self.state.borrow_mut().observer = None;
    }
}

impl Drop for Spring {
    fn drop(&mut self) {
        if let Ok(mut s) = self.state.try_borrow_mut() {
            s.cancel_pending();
            s.run += 1;
        }
    }
}

impl std::fmt::Debug for Spring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("Spring")
            .field("motion", &s.motion)
            .field("target", &s.target)
            .field("config", &s.config)
            .field("status", &s.status)
            .finish()
    }
}

/// Builder for a [`Spring`].
///
/// Every setting is optional: by default the spring goes from `0.0` to `0.0` using the
/// [`default`](crate::presets::Preset::Default) preset and the default [`Tolerances`].
#[derive(Default)]
pub struct SpringBuilder {
    from: f64,
    to: f64,
    config: SpringConfig,
    overrides: SpringConfigOverride,
    tolerances: Tolerances,
    callbacks: SpringCallbacks,
    observer: Option<Box<dyn SpringObserver>>,
}

impl SpringBuilder {
    /// Builds the spring, consuming self. The spring is idle until started.
    ///
    /// Fails with [`InvalidConfig`](crate::error::SpringError::InvalidConfig) if the
    /// [overrides](Self::overrides) produce an invalid configuration, if the tolerances are
    /// invalid, or if either value is not finite.
    pub fn build(self, scheduler: Rc<dyn FrameScheduler>) -> Result<Spring> {
        let from = check_finite(self.from)?;
        let to = check_finite(self.to)?;
        let config = self.config.merge(&self.overrides)?;
        self.tolerances.validate()?;
        let observer = match self.observer {
            Some(observer) => Some(observer),
            None if !self.callbacks.is_empty() => {
                Some(Box::new(self.callbacks) as Box<dyn SpringObserver>)
            }
            None => None,
        };
        let state = SpringState {
            motion: Motion {
                value: from,
                velocity: 0.0,
            },
            target: to,
            config,
            tolerances: self.tolerances,
            status: Status::Idle,
            run: 0,
            pending: None,
            last_frame: None,
            scheduler,
            observer,
            outbox: VecDeque::new(),
            delivering: false,
        };
        Ok(Spring {
            state: Rc::new(RefCell::new(state)),
        })
    }

    /// Initial value.
    pub fn from(mut self, from: f64) -> Self {
        self.from = from;
        self
    }

    /// Target value.
    pub fn to(mut self, to: f64) -> Self {
        self.to = to;
        self
    }

    /// Base spring parameters; accepts a [`SpringConfig`] or a [`Preset`](crate::presets::Preset).
    pub fn config(mut self, config: impl Into<SpringConfig>) -> Self {
        self.config = config.into();
        self
    }

    /// Individual parameters merged over the [base config](Self::config) when building.
    pub fn overrides(mut self, overrides: SpringConfigOverride) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Sets the observer, taking precedence over [`on_update`](Self::on_update) and
    /// [`on_complete`](Self::on_complete).
    pub fn observer(mut self, observer: impl SpringObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn on_update(mut self, on_update: impl FnMut(f64) + 'static) -> Self {
        self.callbacks = self.callbacks.with_update(on_update);
        self
    }

    pub fn on_complete(mut self, on_complete: impl FnMut() + 'static) -> Self {
        self.callbacks = self.callbacks.with_complete(on_complete);
        self
    }
}
