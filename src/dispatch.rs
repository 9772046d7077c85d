//! Applies a viewport to every registered element.
//!
//! Each element gets `scale = clamp(viewport.scale * original_scale)` and
//! `position = original_position * viewport.scale`. Position deliberately ignores the per-element
//! clamp so a clamped object still sits at its proportional spot.
//!
//! A failing element never stops the pass: its error is logged, counted and the loop moves on.

use crate::element::{ElementDescriptor, ElementId, ElementKind, Transformable};
use crate::errors::{ResponsiveError, TransformError};
use crate::viewport::{Point, ViewportState};

/// Fallback when a computed scale is unusable (non-finite or not positive).
const FALLBACK_SCALE: f64 = 1.0;

/// Result of one update pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Elements that received their new transform
    pub updated: usize,
    /// Elements whose update failed
    pub errored: usize,
    /// Elements left alone because they were inactive
    pub skipped: usize,
    /// Ids of the failed elements, in iteration order
    pub failed: Vec<ElementId>,
}

/// Target transform for one element under `viewport`.
pub fn target_transform(descriptor: &ElementDescriptor, viewport: &ViewportState) -> (Point, f64) {
    let raw_scale = viewport.scale * descriptor.original_scale();
    let mut scale = match descriptor.constraints() {
        Some(c) => c.clamp(raw_scale),
        None => raw_scale,
    };
    if !scale.is_finite() || scale <= 0.0 {
        log::debug!(
            "element {}: unusable scale {}, falling back to {}",
            descriptor.id(),
            scale,
            FALLBACK_SCALE
        );
        scale = FALLBACK_SCALE;
    }

    (descriptor.original_position().scaled(viewport.scale), scale)
}

#[derive(Debug, Clone)]
pub struct UpdateDispatcher {
    label: String,
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new("Responsive")
    }
}

impl UpdateDispatcher {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self { label: label.into() }
    }

    /// Applies `viewport` to every element in `elements`.
    ///
    /// The manager passes a snapshot here; no manager lock is held while drawables run their setters.
    pub fn apply_all<'a, I>(&self, elements: I, viewport: &ViewportState) -> UpdateOutcome
    where
        I: IntoIterator<Item = &'a ElementDescriptor>,
    {
        let mut outcome = UpdateOutcome::default();

        for descriptor in elements {
            match self.apply_one(descriptor, viewport) {
                Ok(true) => outcome.updated += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    log::warn!("{}: {}", self.label, e);
                    outcome.errored += 1;
                    outcome.failed.push(descriptor.id().clone());
                }
            }
        }

        outcome
    }

    /// Applies `viewport` to a single element. Returns `Ok(false)` when the element is inactive.
    pub fn apply_one(&self, descriptor: &ElementDescriptor, viewport: &ViewportState) -> Result<bool, ResponsiveError> {
        let update_err = |source: TransformError| ResponsiveError::Update {
            id: descriptor.id().clone(),
            source,
        };

        // dropped since the last prune
        let strong = descriptor.upgrade().ok_or_else(|| update_err(TransformError::Destroyed))?;
        let mut element = strong.lock().map_err(|_| ResponsiveError::Poisoned)?;

        if element.is_destroyed() {
            return Err(update_err(TransformError::Destroyed));
        }
        if !element.is_active() {
            log::debug!("{}: element {} inactive, skipped", self.label, descriptor.id());
            return Ok(false);
        }

        let (position, scale) = target_transform(descriptor, viewport);
        if !position.is_finite() {
            return Err(update_err(TransformError::NonFinitePosition {
                x: position.x,
                y: position.y,
            }));
        }

        let target: &mut dyn Transformable = &mut *element;
        let res = match descriptor.kind() {
            ElementKind::Background => apply_background(target, position, scale),
            ElementKind::GameObject => apply_game_object(target, position, scale),
            ElementKind::Ui => apply_ui(target, position, scale),
            ElementKind::Text => apply_text(target, position, scale),
        };
        res.map_err(update_err)?;

        Ok(true)
    }
}

// One strategy per kind. They share the same setter today; text is the likely first to diverge
// (re-wrapping on scale change).

fn apply_background(el: &mut dyn Transformable, position: Point, scale: f64) -> Result<(), TransformError> {
    set_transform(el, position, scale)
}

fn apply_game_object(el: &mut dyn Transformable, position: Point, scale: f64) -> Result<(), TransformError> {
    set_transform(el, position, scale)
}

fn apply_ui(el: &mut dyn Transformable, position: Point, scale: f64) -> Result<(), TransformError> {
    set_transform(el, position, scale)
}

fn apply_text(el: &mut dyn Transformable, position: Point, scale: f64) -> Result<(), TransformError> {
    set_transform(el, position, scale)
}

/// Sets position then scale. If the scale is refused the old position is put back, so the element
/// keeps its last good transform.
fn set_transform(el: &mut dyn Transformable, position: Point, scale: f64) -> Result<(), TransformError> {
    let previous = el.position();
    el.set_position(position.x, position.y)?;

    if let Err(e) = el.set_scale(scale) {
        if let Err(restore) = el.set_position(previous.x, previous.y) {
            log::debug!("could not restore position ({}, {}): {}", previous.x, previous.y, restore);
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testing::{weak, Sprite};
    use crate::element::{Constraints, RegisterOptions};
    use crate::registry::ElementRegistry;
    use crate::viewport::Size;

    fn viewport(w: f64, h: f64) -> ViewportState {
        ViewportState::compute(Size::new(w, h), Size::new(800.0, 600.0))
    }

    #[test]
    fn clamp_bounds_scale_but_not_position() {
        let mut reg = ElementRegistry::default();
        let enemy = Sprite::shared(100.0, 40.0, 2.0);
        reg.register(
            Some("enemy".into()),
            weak(&enemy),
            ElementKind::GameObject,
            RegisterOptions::default().with_constraints(Constraints::max(1.5)),
        )
        .unwrap();

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(1600.0, 1200.0));
        assert_eq!(outcome.updated, 1);

        let enemy = enemy.lock().unwrap();
        // raw scale 2.0 * 2.0 = 4.0, clamped
        assert_eq!(enemy.scale, 1.5);
        assert_eq!(enemy.position, Point::new(200.0, 80.0));
    }

    #[test]
    fn every_kind_gets_position_and_scale() {
        let mut reg = ElementRegistry::default();
        let kinds = [ElementKind::Background, ElementKind::GameObject, ElementKind::Ui, ElementKind::Text];
        let sprites: Vec<_> = kinds.iter().map(|_| Sprite::shared(10.0, 10.0, 1.0)).collect();
        for (kind, sprite) in kinds.iter().zip(&sprites) {
            reg.register(None, weak(sprite), *kind, RegisterOptions::default()).unwrap();
        }

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(400.0, 300.0));
        assert_eq!(outcome.updated, 4);
        for sprite in &sprites {
            let s = sprite.lock().unwrap();
            assert_eq!(s.scale, 0.5);
            assert_eq!(s.position, Point::new(5.0, 5.0));
        }
    }

    #[test]
    fn failing_element_does_not_abort_pass() {
        let mut reg = ElementRegistry::default();
        let a = Sprite::shared(10.0, 10.0, 1.0);
        let b = Sprite::shared(20.0, 20.0, 1.0);
        let c = Sprite::shared(30.0, 30.0, 1.0);
        b.lock().unwrap().fail_scale = true;

        reg.register(Some("a".into()), weak(&a), ElementKind::Ui, RegisterOptions::default()).unwrap();
        reg.register(Some("b".into()), weak(&b), ElementKind::Ui, RegisterOptions::default()).unwrap();
        reg.register(Some("c".into()), weak(&c), ElementKind::Ui, RegisterOptions::default()).unwrap();

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(1600.0, 1200.0));
        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.errored, 1);
        assert_eq!(outcome.failed, vec![ElementId::from("b")]);

        assert_eq!(a.lock().unwrap().scale, 2.0);
        assert_eq!(c.lock().unwrap().scale, 2.0);
        // refused scale rolls the position back
        assert_eq!(b.lock().unwrap().position, Point::new(20.0, 20.0));
        assert_eq!(b.lock().unwrap().scale, 1.0);
        assert_eq!(c.lock().unwrap().position, Point::new(60.0, 60.0));
    }

    #[test]
    fn inactive_elements_are_skipped() {
        let mut reg = ElementRegistry::default();
        let idle = Sprite::shared(10.0, 10.0, 1.0);
        reg.register(None, weak(&idle), ElementKind::Ui, RegisterOptions::default()).unwrap();
        idle.lock().unwrap().active = false;

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(1600.0, 1200.0));
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.updated, 0);
        assert_eq!(idle.lock().unwrap().calls(), 0);
    }

    #[test]
    fn dropped_element_counts_as_error() {
        let mut reg = ElementRegistry::default();
        let gone = Sprite::shared(10.0, 10.0, 1.0);
        reg.register(None, weak(&gone), ElementKind::Background, RegisterOptions::default()).unwrap();
        drop(gone);

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(1600.0, 1200.0));
        assert_eq!(outcome.errored, 1);
    }

    #[test]
    fn unusable_scale_falls_back() {
        let mut reg = ElementRegistry::default();
        let flat = Sprite::shared(10.0, 10.0, 0.0);
        let id = reg.register(None, weak(&flat), ElementKind::Ui, RegisterOptions::default()).unwrap();

        let (_, scale) = target_transform(reg.get(&id).unwrap(), &viewport(1600.0, 1200.0));
        assert_eq!(scale, FALLBACK_SCALE);
    }

    #[test]
    fn non_finite_position_is_an_update_error() {
        let mut reg = ElementRegistry::default();
        let far = Sprite::shared(f64::INFINITY, 0.0, 1.0);
        reg.register(None, weak(&far), ElementKind::GameObject, RegisterOptions::default()).unwrap();

        let outcome = UpdateDispatcher::default().apply_all(reg.iter(), &viewport(1600.0, 1200.0));
        assert_eq!(outcome.errored, 1);
        assert_eq!(far.lock().unwrap().calls(), 0);
    }
}
