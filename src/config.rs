//! Responsive manager configuration.
//!
//! `ResponsiveConfig` holds the base (design) resolution the layout was authored against, the
//! resize debounce, the change threshold and the stale-element sweep interval. It has defaults via
//! [`Default`], a fluent [`ResponsiveConfig::builder()`] with validation, and can be loaded from
//! JSON with serde (missing fields fall back to the defaults).
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use responsive_viewport::config::ResponsiveConfig;
//! let cfg = ResponsiveConfig::default();
//! assert_eq!(cfg.debounce_ms, 300);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use responsive_viewport::config::ResponsiveConfig;
//! use responsive_viewport::element::Constraints;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ResponsiveConfig::builder()
//!     .base_resolution(800.0, 600.0)
//!     .debounce_ms(150)
//!     .change_threshold_px(4.0)
//!     .default_constraints(Constraints::between(0.3, 2.0))
//!     .build()?; // returns Result<ResponsiveConfig, ResponsiveError>
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Validation fails with a configuration [`ResponsiveError`] when the base resolution is not
//! finite and positive, or the change threshold is negative or not finite. There is no safe
//! fallback for a broken base resolution, so a manager refuses to start with one.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::element::Constraints;
use crate::errors::ResponsiveError;
use crate::viewport::{Size, DEFAULT_CHANGE_THRESHOLD_PX};

/// Design resolution of the original game layout.
const DEFAULT_BASE_WIDTH: f64 = 1274.0;
const DEFAULT_BASE_HEIGHT: f64 = 739.0;
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsiveConfig {
    /// Base resolution width in pixels
    pub base_width: f64,
    /// Base resolution height in pixels
    pub base_height: f64,
    /// Quiet period before a resize is acted upon
    pub debounce_ms: u64,
    /// Pixel delta that counts as a real resize
    pub change_threshold_px: f64,
    /// Constraints for elements registered without their own
    pub default_constraints: Option<Constraints>,
    /// Period of the background sweep that drops stale elements; 0 disables it
    pub sweep_interval_ms: u64,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            base_width: DEFAULT_BASE_WIDTH,
            base_height: DEFAULT_BASE_HEIGHT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            change_threshold_px: DEFAULT_CHANGE_THRESHOLD_PX,
            default_constraints: None,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl ResponsiveConfig {
    pub fn builder() -> ResponsiveConfigBuilder {
        ResponsiveConfigBuilder::default()
    }

    pub fn base_resolution(&self) -> Size {
        Size::new(self.base_width, self.base_height)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Sweep period, or `None` when the periodic sweep is off.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }

    /// Checks the configuration. Called by the manager on construction.
    pub fn validate(&self) -> Result<(), ResponsiveError> {
        if !self.base_resolution().is_positive() {
            return Err(ResponsiveError::InvalidBaseResolution {
                width: self.base_width,
                height: self.base_height,
            });
        }
        if !self.change_threshold_px.is_finite() || self.change_threshold_px < 0.0 {
            return Err(ResponsiveError::InvalidThreshold(self.change_threshold_px));
        }
        Ok(())
    }
}

/// Builder for [`ResponsiveConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResponsiveConfigBuilder {
    inner: ResponsiveConfig,
}

impl ResponsiveConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ResponsiveConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn base_resolution(self, width: f64, height: f64) -> Self {
        self.map(|c| {
            c.base_width = width;
            c.base_height = height;
        })
    }
    pub fn debounce_ms(self, ms: u64) -> Self { self.map(|c| c.debounce_ms = ms) }
    pub fn debounce(self, d: Duration) -> Self { self.map(|c| c.debounce_ms = millis(d)) }
    pub fn change_threshold_px(self, px: f64) -> Self { self.map(|c| c.change_threshold_px = px) }
    pub fn default_constraints(self, constraints: Constraints) -> Self { self.map(|c| c.default_constraints = Some(constraints)) }
    pub fn sweep_interval(self, d: Duration) -> Self { self.map(|c| c.sweep_interval_ms = millis(d)) }
    pub fn disable_sweep(self) -> Self { self.map(|c| c.sweep_interval_ms = 0) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ResponsiveConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ResponsiveConfig, ResponsiveError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
