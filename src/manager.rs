//! The responsive manager: the host-facing surface of the engine.
//!
//! A [`ResponsiveManager`] owns one element registry and the current [`ViewportState`]. Hosts
//! register drawables during scene setup, forward every container resize to
//! [`on_resize`](ResponsiveManager::on_resize), and call [`destroy`](ResponsiveManager::destroy)
//! when the scene ends.
//!
//! Flow of a resize:
//!
//! ```text
//! on_resize(size) -> [debounce] -> ViewportState::compute -> has_changed?
//!     no, or size not finite and positive -> counted as skipped, registry untouched
//!     yes -> prune stale elements, snapshot descriptors, release the lock
//!         -> UpdateDispatcher::apply_all -> PerformanceMonitor::record
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use responsive_viewport::prelude::*;
//!
//! struct Node { pos: Point, scale: f64 }
//!
//! impl Transformable for Node {
//!     fn position(&self) -> Point { self.pos }
//!     fn scale(&self) -> f64 { self.scale }
//!     fn set_position(&mut self, x: f64, y: f64) -> Result<(), TransformError> {
//!         self.pos = Point::new(x, y);
//!         Ok(())
//!     }
//!     fn set_scale(&mut self, factor: f64) -> Result<(), TransformError> {
//!         self.scale = factor;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), ResponsiveError> {
//! let clock = Arc::new(ManualScheduler::new());
//! let config = ResponsiveConfig::builder().base_resolution(800.0, 600.0).build()?;
//! let manager = ResponsiveManager::new(config, clock.clone())?;
//!
//! let hero = Arc::new(Mutex::new(Node { pos: Point::new(100.0, 100.0), scale: 1.0 }));
//! manager.register_element(Some("hero".into()), Arc::<Mutex<Node>>::downgrade(&hero), ElementKind::GameObject, RegisterOptions::default())?;
//!
//! manager.on_resize(Size::new(1600.0, 1200.0));
//! clock.advance(Duration::from_millis(300));
//!
//! assert_eq!(hero.lock().unwrap().scale, 2.0);
//! # Ok(()) }
//! ```

use std::fmt::Display;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::config::ResponsiveConfig;
use crate::dispatch::{UpdateDispatcher, UpdateOutcome};
use crate::element::{ElementDescriptor, ElementId, ElementKind, ElementRef, RegisterOptions};
use crate::errors::ResponsiveError;
use crate::lock;
use crate::monitor::{PerformanceMonitor, PerformanceSnapshot};
use crate::registry::ElementRegistry;
use crate::scheduler::{ResizeScheduler, Scheduler, TimerHandle};
use crate::viewport::{has_changed, Size, ViewportState};

/// Element count above which [`ResponsiveManager::optimization_hints`] suggests grouping.
const MANY_ELEMENTS: usize = 100;
/// Average pass duration (ms) above which a longer debounce is suggested.
const SLOW_PASS_MS: f64 = 50.0;
/// Debounce (ms) below which resizes are likely processed too often.
const SHORT_DEBOUNCE_MS: u64 = 50;

/// A unique identifier for a manager, used to tell managers apart in logs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagerId(Uuid);

impl ManagerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ManagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ManagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a single pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum PassResult {
    /// The viewport did not change enough, the size was unusable, or the manager is destroyed;
    /// nothing was touched.
    Skipped,
    /// Elements were updated against a new viewport.
    Applied(UpdateOutcome),
}

/// State shared between the manager, its debounce callback and the stale sweep.
struct ManagerState {
    label: String,
    base: Size,
    threshold_px: f64,
    registry: ElementRegistry,
    dispatcher: UpdateDispatcher,
    /// The live viewport. Replaced only by a pass that applies.
    viewport: ViewportState,
    /// Last usable raw size seen by a pass, used by force_update
    last_size: Size,
    monitor: PerformanceMonitor,
    destroyed: bool,
}

/// A pass prepared under the state lock. Dispatch happens after the lock is released, so drawables
/// may call back into the manager from their setters.
struct PendingPass {
    previous: ViewportState,
    next: ViewportState,
    dispatcher: UpdateDispatcher,
    elements: Vec<ElementDescriptor>,
    started: Instant,
}

impl PendingPass {
    fn run(self, state: &Mutex<ManagerState>) -> PassResult {
        let outcome = self.dispatcher.apply_all(&self.elements, &self.next);
        lock(state).finish_pass(&self, &outcome);
        PassResult::Applied(outcome)
    }
}

impl ManagerState {
    fn begin_update(&mut self, size: Size) -> Option<PendingPass> {
        if self.destroyed {
            return None;
        }
        // hidden or minimized containers report 0x0; keep the last good layout
        if !size.is_positive() {
            log::warn!(
                "{}: ignoring unusable container size {}x{}",
                self.label,
                size.width,
                size.height
            );
            self.monitor.record_skip();
            return None;
        }
        self.last_size = size;

        let next = ViewportState::compute(size, self.base);
        if !has_changed(&self.viewport, &next, self.threshold_px) {
            log::debug!(
                "{}: viewport {}x{} unchanged, skipping update",
                self.label,
                next.width,
                next.height
            );
            self.monitor.record_skip();
            return None;
        }

        Some(self.begin_pass(next))
    }

    fn begin_pass(&mut self, next: ViewportState) -> PendingPass {
        let started = Instant::now();
        let previous = std::mem::replace(&mut self.viewport, next);

        self.prune();

        PendingPass {
            previous,
            next,
            dispatcher: self.dispatcher.clone(),
            elements: self.registry.iter().cloned().collect(),
            started,
        }
    }

    fn finish_pass(&mut self, pass: &PendingPass, outcome: &UpdateOutcome) {
        // destroyed mid-pass: counters were already reset
        if self.destroyed {
            return;
        }
        self.monitor.record(pass.started.elapsed(), outcome.errored as u64);

        log::info!(
            "{}: viewport {}x{} -> {}x{} (scale {:.3}, {}, {}): {} updated, {} errored, {} skipped",
            self.label,
            pass.previous.width,
            pass.previous.height,
            pass.next.width,
            pass.next.height,
            pass.next.scale,
            pass.next.device_type,
            pass.next.orientation,
            outcome.updated,
            outcome.errored,
            outcome.skipped,
        );
    }

    fn prune(&mut self) -> Vec<ElementId> {
        let pruned = self.registry.prune_stale();
        self.monitor.record_pruned(pruned.len());
        pruned
    }
}

/// Runs a debounced or immediate update for `size`.
fn update(state: &Mutex<ManagerState>, size: Size) -> PassResult {
    let pass = lock(state).begin_update(size);
    match pass {
        Some(pass) => pass.run(state),
        None => PassResult::Skipped,
    }
}

/// Periodic sweep that drops stale elements in scenes that never resize.
///
/// Re-arms itself through the manager's scheduler after every run until stopped.
struct StaleSweep {
    scheduler: Arc<dyn Scheduler>,
    every: Duration,
    state: Weak<Mutex<ManagerState>>,
    timer: Mutex<SweepTimer>,
}

#[derive(Default)]
struct SweepTimer {
    handle: Option<TimerHandle>,
    stopped: bool,
}

impl StaleSweep {
    fn start(scheduler: Arc<dyn Scheduler>, every: Duration, state: Weak<Mutex<ManagerState>>) -> Arc<Self> {
        let sweep = Arc::new(Self {
            scheduler,
            every,
            state,
            timer: Mutex::new(SweepTimer::default()),
        });
        sweep.arm();
        sweep
    }

    fn arm(self: &Arc<Self>) {
        let mut timer = lock(&self.timer);
        if timer.stopped {
            return;
        }
        let weak = Arc::downgrade(self);
        let handle = self.scheduler.schedule(
            self.every,
            Box::new(move || {
                if let Some(sweep) = weak.upgrade() {
                    sweep.run();
                }
            }),
        );
        timer.handle = Some(handle);
    }

    fn run(self: &Arc<Self>) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        {
            let mut state = lock(&state);
            if state.destroyed {
                return;
            }
            let pruned = state.prune();
            if !pruned.is_empty() {
                log::debug!("{}: sweep removed {} stale elements", state.label, pruned.len());
            }
        }
        self.arm();
    }

    fn stop(&self) {
        let handle = {
            let mut timer = lock(&self.timer);
            timer.stopped = true;
            timer.handle.take()
        };
        if let Some(handle) = handle {
            handle.cancel();
        }
    }
}

pub struct ResponsiveManager {
    id: ManagerId,
    config: ResponsiveConfig,
    state: Arc<Mutex<ManagerState>>,
    resize: ResizeScheduler,
    sweep: Option<Arc<StaleSweep>>,
}

impl std::fmt::Debug for ResponsiveManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsiveManager")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("viewport", &self.viewport())
            .field("elements", &self.element_count())
            .finish()
    }
}

impl ResponsiveManager {
    /// Creates a manager for `config`, deferring resizes through `scheduler`.
    ///
    /// The initial viewport is the base resolution itself (scale 1.0) until the host reports a
    /// container size. Fails only on an invalid configuration.
    pub fn new(config: ResponsiveConfig, scheduler: Arc<dyn Scheduler>) -> Result<Self, ResponsiveError> {
        config.validate()?;

        let id = ManagerId::new();
        let label = format!("Responsive[{}]", id);
        let base = config.base_resolution();

        let state = Arc::new(Mutex::new(ManagerState {
            label: label.clone(),
            base,
            threshold_px: config.change_threshold_px,
            registry: ElementRegistry::new(label.clone()),
            dispatcher: UpdateDispatcher::new(label.clone()),
            viewport: ViewportState::compute(base, base),
            last_size: base,
            monitor: PerformanceMonitor::new(),
            destroyed: false,
        }));

        let weak: Weak<Mutex<ManagerState>> = Arc::downgrade(&state);
        let sweep = config
            .sweep_interval()
            .map(|every| StaleSweep::start(scheduler.clone(), every, weak.clone()));
        let resize = ResizeScheduler::new(scheduler, config.debounce(), move |size| {
            if let Some(state) = weak.upgrade() {
                update(&state, size);
            }
        });

        log::info!(
            "{}: created (base {}x{}, debounce {}ms, threshold {}px)",
            label,
            config.base_width,
            config.base_height,
            config.debounce_ms,
            config.change_threshold_px
        );

        Ok(Self { id, config, state, resize, sweep })
    }

    pub fn id(&self) -> ManagerId {
        self.id
    }

    pub fn config(&self) -> &ResponsiveConfig {
        &self.config
    }

    /// Starts tracking `element`. Without an `id` a unique one is generated.
    ///
    /// The element's current position, scale and size become its baseline. Elements registered
    /// without constraints get the configured default constraints, if any. A dead or destroyed
    /// element is rejected; the registry is left untouched and the caller gets the error back.
    pub fn register_element(
        &self,
        id: Option<ElementId>,
        element: ElementRef,
        kind: ElementKind,
        mut options: RegisterOptions,
    ) -> Result<ElementId, ResponsiveError> {
        if options.constraints.is_none() {
            options.constraints = self.config.default_constraints;
        }

        let mut state = lock(&self.state);
        if state.destroyed {
            return Err(ResponsiveError::ManagerDestroyed);
        }
        state.registry.register(id, element, kind, options)
    }

    /// Stops tracking `id`. Unknown ids return `false`.
    pub fn unregister_element(&self, id: &ElementId) -> bool {
        lock(&self.state).registry.unregister(id)
    }

    /// Reports a new container size. The update runs after the debounce period, and only for the
    /// last size reported within it.
    pub fn on_resize(&self, size: Size) {
        self.resize.on_resize(size);
    }

    /// Re-applies the viewport for the last known container size to every element right away,
    /// bypassing the debounce and change detection. Any pending debounced update still runs.
    pub fn force_update(&self) -> PassResult {
        let pass = {
            let mut state = lock(&self.state);
            if state.destroyed {
                return PassResult::Skipped;
            }
            log::debug!("{}: forced update", state.label);

            let next = ViewportState::compute(state.last_size, state.base);
            state.begin_pass(next)
        };
        pass.run(&self.state)
    }

    /// Runs an update for `size` immediately, without the debounce. Sizes that are not finite and
    /// positive are ignored and counted as skipped.
    pub fn update_now(&self, size: Size) -> PassResult {
        update(&self.state, size)
    }

    /// Copy of the current viewport.
    pub fn viewport(&self) -> ViewportState {
        lock(&self.state).viewport
    }

    pub fn element_count(&self) -> usize {
        lock(&self.state).registry.len()
    }

    pub fn is_registered(&self, id: &ElementId) -> bool {
        lock(&self.state).registry.contains(id)
    }

    /// Removes elements whose drawable is gone, without waiting for the next pass.
    pub fn prune_stale(&self) -> Vec<ElementId> {
        lock(&self.state).prune()
    }

    pub fn performance_stats(&self) -> PerformanceSnapshot {
        lock(&self.state).monitor.stats()
    }

    pub fn reset_stats(&self) {
        lock(&self.state).monitor.reset();
    }

    /// Advisory notes for the host when the manager looks overloaded or misconfigured.
    pub fn optimization_hints(&self) -> Vec<String> {
        let (count, stats) = {
            let state = lock(&self.state);
            (state.registry.len(), state.monitor.stats())
        };

        let mut hints = Vec::new();
        if count > MANY_ELEMENTS {
            hints.push(format!("{count} elements registered, consider grouping them into containers"));
        }
        if stats.average_update_duration_ms > SLOW_PASS_MS {
            hints.push(format!(
                "average update pass takes {:.2}ms, consider a longer debounce",
                stats.average_update_duration_ms
            ));
        }
        if self.config.debounce_ms < SHORT_DEBOUNCE_MS {
            hints.push(format!("debounce of {}ms is short and may cause redundant passes", self.config.debounce_ms));
        }
        hints
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.state).destroyed
    }

    /// Cancels any pending update, clears the registry and resets the counters. Later resizes and
    /// registrations are ignored. Calling it twice is harmless.
    pub fn destroy(&self) {
        self.resize.destroy();
        if let Some(sweep) = &self.sweep {
            sweep.stop();
        }

        let mut state = lock(&self.state);
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        state.registry.clear();
        state.monitor.reset();
        log::info!("{}: destroyed", state.label);
    }
}

impl Drop for ResponsiveManager {
    fn drop(&mut self) {
        self.resize.destroy();
        if let Some(sweep) = &self.sweep {
            sweep.stop();
        }
    }
}
