//! Deferred execution and resize debouncing.
//!
//! The engine never sleeps or spawns on its own. All deferral goes through a [`Scheduler`], so a
//! host can plug in its runtime ([`TokioScheduler`]) and tests can drive a virtual clock
//! ([`ManualScheduler`]).
//!
//! [`ResizeScheduler`] sits on top of a scheduler and turns a burst of resize notifications into a
//! single trailing call: every notification cancels the pending one and schedules a new one, so
//! only the last size inside a quiet window is ever acted upon.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use responsive_viewport::scheduler::{ManualScheduler, ResizeScheduler};
//! use responsive_viewport::viewport::Size;
//!
//! let clock = Arc::new(ManualScheduler::new());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! let resize = ResizeScheduler::new(clock.clone(), Duration::from_millis(300), move |size| {
//!     sink.lock().unwrap().push(size);
//! });
//!
//! resize.on_resize(Size::new(1000.0, 700.0));
//! resize.on_resize(Size::new(1200.0, 800.0));
//! clock.advance(Duration::from_millis(300));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![Size::new(1200.0, 800.0)]);
//! ```

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use crate::lock;
use crate::viewport::Size;

/// Manual (virtual clock) scheduler.
pub mod manual;
/// Tokio runtime backed scheduler.
pub mod tokio_timer;

pub use manual::ManualScheduler;
pub use tokio_timer::TokioScheduler;

/// Default quiet period before a resize is acted upon.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Work item handed to a [`Scheduler`].
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run once after `delay`. The returned handle cancels it.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Cancels a scheduled task. Dropping the handle does not cancel.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

impl TimerHandle {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A handle whose cancel does nothing.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancels the task if it has not run yet.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

type ResizeCallback = Arc<dyn Fn(Size) + Send + Sync>;

#[derive(Debug, Default)]
struct DebounceState {
    /// Bumped on every resize. A fired task only runs if its generation is still current.
    generation: u64,
    pending: Option<TimerHandle>,
    destroyed: bool,
}

/// Debounces resize notifications into a single trailing callback.
pub struct ResizeScheduler {
    scheduler: Arc<dyn Scheduler>,
    debounce: Duration,
    callback: ResizeCallback,
    state: Arc<Mutex<DebounceState>>,
}

impl ResizeScheduler {
    pub fn new<F>(scheduler: Arc<dyn Scheduler>, debounce: Duration, callback: F) -> Self
    where
        F: Fn(Size) + Send + Sync + 'static,
    {
        Self {
            scheduler,
            debounce,
            callback: Arc::new(callback),
            state: Arc::new(Mutex::new(DebounceState::default())),
        }
    }

    /// Records a raw container size. Cancels any pending call and schedules a new one for `size`.
    pub fn on_resize(&self, size: Size) {
        let mut state = lock(&self.state);
        if state.destroyed {
            return;
        }

        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
        state.generation += 1;

        let generation = state.generation;
        let weak_state = Arc::downgrade(&self.state);
        let callback = self.callback.clone();
        let task: TimerTask = Box::new(move || fire(weak_state, generation, callback, size));

        state.pending = Some(self.scheduler.schedule(self.debounce, task));
    }

    /// True while a call is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Cancels the pending call, if any, and ignores every later resize.
    pub fn destroy(&self) {
        let mut state = lock(&self.state);
        state.destroyed = true;
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

fn fire(state: Weak<Mutex<DebounceState>>, generation: u64, callback: ResizeCallback, size: Size) {
    let Some(state) = state.upgrade() else {
        return;
    };

    {
        let mut guard = lock(&state);
        // superseded by a newer resize whose cancel arrived too late, or torn down
        if guard.destroyed || guard.generation != generation {
            return;
        }
        guard.pending = None;
    }

    callback(size);
}
