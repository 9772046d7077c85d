//! Responsive viewport and element-scaling engine.
//!
//! Keeps registered drawables (backgrounds, game objects, UI, text) sized and positioned for the
//! current container while the host window, device or orientation changes. The host forwards raw
//! container sizes; the engine debounces them, computes one uniform "fit" scale against the base
//! resolution, skips changes that are only noise, and transforms every element with per-element
//! error isolation.
//!
//! Start with [`ResponsiveManager`](manager::ResponsiveManager).

use std::sync::{Mutex, MutexGuard};

pub mod config;
pub mod dispatch;
pub mod element;
pub mod errors;
pub mod manager;
pub mod monitor;
pub mod registry;
pub mod scheduler;
pub mod viewport;

pub use config::ResponsiveConfig;
pub use errors::{ResponsiveError, TransformError};
pub use manager::{ManagerId, PassResult, ResponsiveManager};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::config::ResponsiveConfig;
    pub use crate::element::{Anchor, Constraints, ElementId, ElementKind, ElementRef, RegisterOptions, Transformable};
    pub use crate::errors::{ResponsiveError, TransformError};
    pub use crate::manager::{PassResult, ResponsiveManager};
    pub use crate::monitor::PerformanceSnapshot;
    pub use crate::scheduler::{ManualScheduler, Scheduler, TokioScheduler};
    pub use crate::viewport::{DeviceType, Orientation, Point, Size, ViewportState};
}

/// Locks `m`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
