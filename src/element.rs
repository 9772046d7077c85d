//! Responsive elements: the [`Transformable`] capability and the descriptor captured for each
//! registered drawable.

use std::fmt::Display;
use std::sync::{Arc, Mutex, Weak};
use serde::{Deserialize, Serialize};
use crate::errors::{ResponsiveError, TransformError};
use crate::viewport::{Point, Size};

/// Capability every registered drawable must provide.
///
/// Adapters wrap whatever the host draws with (canvas sprite, DOM node, scene-graph node) and expose
/// its current transform plus the two setters the engine drives.
pub trait Transformable {
    /// Current position in container pixels.
    fn position(&self) -> Point;

    /// Current uniform scale.
    fn scale(&self) -> f64;

    /// Intrinsic size, when the drawable has one.
    fn size(&self) -> Option<Size> {
        None
    }

    fn set_position(&mut self, x: f64, y: f64) -> Result<(), TransformError>;

    fn set_scale(&mut self, factor: f64) -> Result<(), TransformError>;

    /// True once the host has torn the drawable down. Destroyed elements are pruned from the
    /// registry before the next update pass.
    fn is_destroyed(&self) -> bool {
        false
    }

    /// Inactive elements are left alone during a pass but stay registered.
    fn is_active(&self) -> bool {
        true
    }
}

/// Non-owning reference to a host drawable. The registry never keeps a drawable alive.
pub type ElementRef = Weak<Mutex<dyn Transformable + Send>>;

/// Opaque element identifier, unique within one registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a responsive element. Each kind has its own update strategy slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Background,
    GameObject,
    Ui,
    Text,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Background => write!(f, "background"),
            ElementKind::GameObject => write!(f, "gameObject"),
            ElementKind::Ui => write!(f, "ui"),
            ElementKind::Text => write!(f, "text"),
        }
    }
}

/// Normalized pivot point of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Default for Anchor {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Per-element bounds on the applied scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    /// The engine only applies uniform scales, so this always holds; adapters may read it.
    pub keep_aspect_ratio: bool,
}

impl Constraints {
    pub fn max(max_scale: f64) -> Self {
        Self { max_scale: Some(max_scale), ..Self::default() }
    }

    pub fn min(min_scale: f64) -> Self {
        Self { min_scale: Some(min_scale), ..Self::default() }
    }

    pub fn between(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale: Some(min_scale),
            max_scale: Some(max_scale),
            keep_aspect_ratio: false,
        }
    }

    /// Bounds `scale` by the minimum first, then the maximum. With crossed bounds the maximum wins.
    pub fn clamp(&self, scale: f64) -> f64 {
        let mut clamped = scale;
        if let Some(min) = self.min_scale {
            clamped = clamped.max(min);
        }
        if let Some(max) = self.max_scale {
            clamped = clamped.min(max);
        }
        clamped
    }
}

/// Optional settings passed along with a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegisterOptions {
    pub anchor: Option<Anchor>,
    pub constraints: Option<Constraints>,
}

impl RegisterOptions {
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// A tracked element and the baseline captured when it was registered.
///
/// The baseline (`original_*`) is read once from the drawable and never changes afterwards; every
/// pass scales from it rather than from the drawable's current transform, so repeated passes do not
/// compound.
#[derive(Clone)]
pub struct ElementDescriptor {
    id: ElementId,
    element: ElementRef,
    kind: ElementKind,
    original_position: Point,
    original_scale: f64,
    original_size: Option<Size>,
    anchor: Anchor,
    constraints: Option<Constraints>,
}

impl std::fmt::Debug for ElementDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("alive", &!self.is_stale())
            .field("original_position", &self.original_position)
            .field("original_scale", &self.original_scale)
            .field("original_size", &self.original_size)
            .field("anchor", &self.anchor)
            .field("constraints", &self.constraints)
            .finish()
    }
}

impl ElementDescriptor {
    /// Reads the baseline transform from `element`.
    ///
    /// Fails when the reference no longer upgrades or the drawable reports itself destroyed.
    pub fn capture(
        id: ElementId,
        element: ElementRef,
        kind: ElementKind,
        options: RegisterOptions,
    ) -> Result<Self, ResponsiveError> {
        let Some(strong) = element.upgrade() else {
            return Err(ResponsiveError::InvalidElement { id });
        };

        let (position, scale, size) = {
            let guard = strong.lock().map_err(|_| ResponsiveError::Poisoned)?;
            if guard.is_destroyed() {
                return Err(ResponsiveError::ElementDestroyed { id });
            }
            (guard.position(), guard.scale(), guard.size())
        };

        Ok(Self {
            id,
            element,
            kind,
            original_position: position,
            original_scale: scale,
            original_size: size,
            anchor: options.anchor.unwrap_or_default(),
            constraints: options.constraints,
        })
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn original_position(&self) -> Point {
        self.original_position
    }

    pub fn original_scale(&self) -> f64 {
        self.original_scale
    }

    pub fn original_size(&self) -> Option<Size> {
        self.original_size
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn constraints(&self) -> Option<&Constraints> {
        self.constraints.as_ref()
    }

    /// Strong handle to the drawable, if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<Mutex<dyn Transformable + Send>>> {
        self.element.upgrade()
    }

    /// True if the drawable was dropped or reports itself destroyed.
    pub fn is_stale(&self) -> bool {
        let Some(strong) = self.element.upgrade() else {
            return true;
        };
        // poisoned: a setter panicked mid-update, treat the drawable as gone
        let destroyed = match strong.lock() {
            Ok(el) => el.is_destroyed(),
            Err(_) => true,
        };
        destroyed
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording drawable used by the tests in this crate.

    use super::*;

    #[derive(Debug, Default)]
    pub struct Sprite {
        pub position: Point,
        pub scale: f64,
        pub size: Option<Size>,
        pub destroyed: bool,
        pub active: bool,
        pub fail_scale: bool,
        pub position_calls: usize,
        pub scale_calls: usize,
    }

    impl Sprite {
        pub fn at(x: f64, y: f64, scale: f64) -> Self {
            Self {
                position: Point::new(x, y),
                scale,
                active: true,
                ..Self::default()
            }
        }

        pub fn shared(x: f64, y: f64, scale: f64) -> Arc<Mutex<Sprite>> {
            Arc::new(Mutex::new(Self::at(x, y, scale)))
        }

        pub fn calls(&self) -> usize {
            self.position_calls + self.scale_calls
        }
    }

    impl Transformable for Sprite {
        fn position(&self) -> Point {
            self.position
        }

        fn scale(&self) -> f64 {
            self.scale
        }

        fn size(&self) -> Option<Size> {
            self.size
        }

        fn set_position(&mut self, x: f64, y: f64) -> Result<(), TransformError> {
            self.position_calls += 1;
            if self.destroyed {
                return Err(TransformError::Destroyed);
            }
            self.position = Point::new(x, y);
            Ok(())
        }

        fn set_scale(&mut self, factor: f64) -> Result<(), TransformError> {
            self.scale_calls += 1;
            if self.fail_scale {
                return Err(TransformError::Rejected("texture released".into()));
            }
            self.scale = factor;
            Ok(())
        }

        fn is_destroyed(&self) -> bool {
            self.destroyed
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    /// Downgrades a concrete sprite into the engine's reference type.
    pub fn weak(sprite: &Arc<Mutex<Sprite>>) -> ElementRef {
        let strong: Arc<Mutex<dyn Transformable + Send>> = sprite.clone();
        Arc::downgrade(&strong)
    }
}
