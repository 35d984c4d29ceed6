//! The frame-clock capability that drives springs, plus two hosts for it.
//!
//! Springs never own a timer. Instead they are given a [`FrameScheduler`], which the host
//! application implements on top of whatever frame clock it has (a window's redraw callback, a
//! game loop, a display link). Two implementations are included:
//!
//! - [`ManualScheduler`] runs on a virtual clock that only moves when told to. It is fully
//!   deterministic and is the natural choice for tests and offline rendering.
//! - [`FrameLoop`] runs on the real clock at a fixed target rate, sleeping between frames. It is
//!   meant for simple command-line or headless hosts that have no other frame source.

use crate::error::{Result, SpringError};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::mem;
use std::time::{Duration, Instant};

/// Callback invoked by a [`FrameScheduler`] with the timestamp of the frame being run.
///
/// Timestamps are measured on the scheduler's own monotonic clock, the same one reported by
/// [`FrameScheduler::now`].
pub type FrameCallback = Box<dyn FnOnce(Duration)>;

/// Identifies one scheduled callback, so that it can be cancelled before it runs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CancelHandle(u64);

impl CancelHandle {
    /// Creates a handle from a scheduler-specific id. Ids only need to be unique within a single
    /// scheduler instance.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Capability to run callbacks on the host's frame clock.
///
/// All methods take `&self`, because a scheduler is shared by every spring that it drives and
/// callbacks are free to schedule further callbacks while they are running. Implementations must
/// never invoke a callback synchronously from inside [`schedule_once`](Self::schedule_once) or
/// [`schedule_after`](Self::schedule_after).
///
/// Frames may be late, skipped or coalesced; springs measure the actual elapsed time between
/// callbacks rather than assuming a fixed rate.
pub trait FrameScheduler {
    /// Current time on the scheduler's frame clock.
    fn now(&self) -> Duration;

    /// Runs `callback` once, on the next frame.
    ///
    /// Returns [`SpringError::SchedulerUnavailable`] if the host can no longer run frames.
    fn schedule_once(&self, callback: FrameCallback) -> Result<CancelHandle>;

    /// Runs `callback` once, on the first frame at least `delay` after [`now`](Self::now).
    fn schedule_after(&self, delay: Duration, callback: FrameCallback) -> Result<CancelHandle>;

    /// Prevents a previously scheduled callback from running. Cancelling a callback that already
    /// ran, or was already cancelled, has no effect.
    fn cancel(&self, handle: CancelHandle);
}

struct Entry {
    handle: CancelHandle,
    due: Option<Duration>,
    callback: FrameCallback,
}

// Bookkeeping shared by both schedulers. Callbacks are always invoked with no borrow held, so that
// they can schedule or cancel freely.
#[derive(Default)]
struct CallbackQueue {
    next_id: u64,
    entries: Vec<Entry>,
    cancelled: HashSet<CancelHandle>,
}

impl CallbackQueue {
    fn push(&mut self, due: Option<Duration>, callback: FrameCallback) -> CancelHandle {
        self.next_id += 1;
        let handle = CancelHandle::new(self.next_id);
        self.entries.push(Entry {
            handle,
            due,
            callback,
        });
        handle
    }

    fn cancel(&mut self, handle: CancelHandle) {
        let count = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        if self.entries.len() == count {
            // Might be in the batch currently being dispatched.
            self.cancelled.insert(handle);
        }
    }

    fn take_due(&mut self, now: Duration) -> Vec<Entry> {
        self.cancelled.clear();
        let (ready, waiting): (Vec<Entry>, Vec<Entry>) = mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due.map_or(true, |due| due <= now));
        self.entries = waiting;
        ready
    }
}

fn dispatch(queue: &RefCell<CallbackQueue>, now: Duration) -> usize {
    let ready = queue.borrow_mut().take_due(now);
    let mut count = 0;
    for entry in ready {
        if queue.borrow_mut().cancelled.remove(&entry.handle) {
            continue;
        }
        (entry.callback)(now);
        count += 1;
    }
    count
}

/// A [`FrameScheduler`] driven by a virtual clock.
///
/// Time stands still until [`advance`](Self::advance) is called, which moves the clock forward and
/// runs one frame. Callbacks scheduled during a frame run on the following frame, exactly as they
/// would with a real display clock.
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use tensile_core::scheduler::ManualScheduler;
/// use tensile_core::spring::Spring;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let mut spring = Spring::new(0.0, 100.0, Default::default(), scheduler.clone()).unwrap();
/// spring.start(0).unwrap();
/// scheduler.run_frames(Duration::from_millis(16), 1000);
/// assert_eq!(spring.value(), 100.0);
/// ```
pub struct ManualScheduler {
    now: Cell<Duration>,
    available: Cell<bool>,
    queue: RefCell<CallbackQueue>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Creates a scheduler whose clock starts at zero.
    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            available: Cell::new(true),
            queue: RefCell::default(),
        }
    }

    /// Moves the clock forward by `elapsed` and runs one frame. Returns the number of callbacks
    /// that ran.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let now = self.now.get() + elapsed;
        self.now.set(now);
        dispatch(&self.queue, now)
    }

    /// Moves the clock forward by `elapsed` without running a frame, as when the host is suspended.
    /// The next frame will observe the whole gap.
    pub fn skip(&self, elapsed: Duration) {
        self.now.set(self.now.get() + elapsed);
    }

    /// Repeatedly [advances](Self::advance) by `frame_time` until nothing is scheduled, or until
    /// `max_frames` frames have run. Returns the number of frames that ran.
    pub fn run_frames(&self, frame_time: Duration, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.advance(frame_time);
            frames += 1;
        }
        frames
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Simulates a host that has lost (or regained) its frame clock. While unavailable, every
    /// attempt to schedule fails with [`SpringError::SchedulerUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    fn push(&self, due: Option<Duration>, callback: FrameCallback) -> Result<CancelHandle> {
        if !self.available.get() {
            return Err(SpringError::SchedulerUnavailable);
        }
        Ok(self.queue.borrow_mut().push(due, callback))
    }
}

impl FrameScheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn schedule_once(&self, callback: FrameCallback) -> Result<CancelHandle> {
        self.push(None, callback)
    }

    fn schedule_after(&self, delay: Duration, callback: FrameCallback) -> Result<CancelHandle> {
        let due = self.now() + delay;
        self.push(Some(due), callback)
    }

    fn cancel(&self, handle: CancelHandle) {
        self.queue.borrow_mut().cancel(handle);
    }
}

/// A [`FrameScheduler`] on the real clock, for hosts without a frame source of their own.
///
/// The loop does nothing by itself; the host calls [`run_until_idle`](Self::run_until_idle) (or
/// [`run_frame`](Self::run_frame) from its own loop) on the thread that owns the springs.
pub struct FrameLoop {
    origin: Instant,
    target_fps: u32,
    queue: RefCell<CallbackQueue>,
}

impl FrameLoop {
    /// Creates a loop that runs frames at `target_fps` frames per second (at least 1).
    pub fn new(target_fps: u32) -> Self {
        Self {
            origin: Instant::now(),
            target_fps: target_fps.max(1),
            queue: RefCell::default(),
        }
    }

    /// Time between frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps
    }

    /// Runs one frame immediately, returning the number of callbacks that ran.
    pub fn run_frame(&self) -> usize {
        dispatch(&self.queue, self.now())
    }

    /// Runs frames at the target rate, sleeping in between, until nothing is scheduled. Returns the
    /// number of frames that ran.
    pub fn run_until_idle(&self) -> usize {
        let interval = self.frame_interval();
        let mut frames = 0;
        let mut next_frame = Instant::now();
        while self.pending() > 0 {
            next_frame += interval;
            let now = Instant::now();
            if next_frame > now {
                std::thread::sleep(next_frame - now);
            } else {
                // Fell behind; don't try to catch up with a burst of frames.
                next_frame = now;
            }
            let callbacks = self.run_frame();
            tracing::trace!(frame = frames, callbacks, "frame loop tick");
            frames += 1;
        }
        frames
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameScheduler for FrameLoop {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule_once(&self, callback: FrameCallback) -> Result<CancelHandle> {
        Ok(self.queue.borrow_mut().push(None, callback))
    }

    fn schedule_after(&self, delay: Duration, callback: FrameCallback) -> Result<CancelHandle> {
        let due = self.now() + delay;
        Ok(self.queue.borrow_mut().push(Some(due), callback))
    }

    fn cancel(&self, handle: CancelHandle) {
        self.queue.borrow_mut().cancel(handle);
    }
}
