//! Viewport state for the responsive engine.
//!
//! A [`ViewportState`] is the single snapshot every element transform is computed against. It is
//! derived from the raw container size and the base (design) resolution by
//! [`ViewportState::compute`], and replaced only when [`has_changed`] reports a meaningful
//! difference from the current one.
//!
//! # Examples
//!
//! Computing the fit scale for a wide container:
//! ```
//! use responsive_viewport::viewport::{DeviceType, Orientation, Size, ViewportState};
//!
//! let vp = ViewportState::compute(Size::new(1600.0, 900.0), Size::new(800.0, 600.0));
//! assert_eq!(vp.scale, 1.5);
//! assert_eq!(vp.device_type, DeviceType::Desktop);
//! assert_eq!(vp.orientation, Orientation::Landscape);
//! ```
//!
//! Ignoring resize noise:
//! ```
//! use responsive_viewport::viewport::{has_changed, Size, ViewportState, DEFAULT_CHANGE_THRESHOLD_PX};
//!
//! let base = Size::new(800.0, 600.0);
//! let a = ViewportState::compute(Size::new(1280.0, 720.0), base);
//! let b = ViewportState::compute(Size::new(1280.0, 714.0), base);
//! assert!(!has_changed(&a, &b, DEFAULT_CHANGE_THRESHOLD_PX));
//! ```

use std::fmt::Display;
use serde::{Deserialize, Serialize};

/// Default pixel delta below which a resize is treated as noise.
pub const DEFAULT_CHANGE_THRESHOLD_PX: f64 = 10.0;

/// Containers narrower than this are mobile.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;
/// Containers narrower than this (and not mobile) are tablets.
pub const TABLET_MAX_WIDTH: f64 = 1024.0;

/// Width/height pair in pixels. Used both for raw container sizes and for the base resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiplies both coordinates by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Coarse device class derived from container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    /// Classifies a container width: `< 768` mobile, `< 1024` tablet, otherwise desktop.
    pub fn from_width(width: f64) -> Self {
        if width < MOBILE_MAX_WIDTH {
            DeviceType::Mobile
        } else if width < TABLET_MAX_WIDTH {
            DeviceType::Tablet
        } else {
            DeviceType::Desktop
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Mobile => write!(f, "mobile"),
            DeviceType::Tablet => write!(f, "tablet"),
            DeviceType::Desktop => write!(f, "desktop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Landscape only when strictly wider than tall; a square container is portrait.
    pub fn from_size(size: Size) -> Self {
        if size.width > size.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Landscape => write!(f, "landscape"),
            Orientation::Portrait => write!(f, "portrait"),
        }
    }
}

/// The current viewport snapshot. Exactly one is live per manager; it is replaced, never merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Container width in pixels.
    pub width: f64,
    /// Container height in pixels.
    pub height: f64,
    /// Uniform scale relative to the base resolution.
    pub scale: f64,
    pub device_type: DeviceType,
    pub orientation: Orientation,
}

impl ViewportState {
    /// Maps a raw container size onto a viewport relative to `base`.
    ///
    /// The scale is `min(width / base.width, height / base.height)`: the whole base canvas always
    /// fits inside the container and is never cropped. Using `max` here crops the canvas on any
    /// container whose aspect ratio differs from the base.
    ///
    /// `base` must be positive; [`ResponsiveConfig`](crate::config::ResponsiveConfig) validation
    /// guarantees this for managed viewports.
    pub fn compute(raw: Size, base: Size) -> Self {
        let zoom_x = raw.width / base.width;
        let zoom_y = raw.height / base.height;

        Self {
            width: raw.width,
            height: raw.height,
            scale: zoom_x.min(zoom_y),
            device_type: DeviceType::from_width(raw.width),
            orientation: Orientation::from_size(raw),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Returns true if `next` differs enough from `previous` to warrant a layout pass.
///
/// A change is either side moving by more than `threshold_px`, or a device class or orientation
/// flip (which can happen on a delta smaller than the threshold when crossing a boundary).
pub fn has_changed(previous: &ViewportState, next: &ViewportState, threshold_px: f64) -> bool {
    (next.width - previous.width).abs() > threshold_px
        || (next.height - previous.height).abs() > threshold_px
        || next.device_type != previous.device_type
        || next.orientation != previous.orientation
}
