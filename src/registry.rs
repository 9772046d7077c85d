//! Element registry: owns the id → descriptor map for one manager.

use std::collections::BTreeMap;
use crate::element::{ElementDescriptor, ElementId, ElementKind, ElementRef, RegisterOptions};
use crate::errors::ResponsiveError;

/// Prefix for generated element ids.
const GENERATED_ID_PREFIX: &str = "element-";

pub struct ElementRegistry {
    /// Log prefix of the owning manager
    label: String,
    /// Registered elements, iterated in id order
    elements: BTreeMap<ElementId, ElementDescriptor>,
    /// Next sequence number for generated ids. Never reset, so generated ids are not reused.
    next_seq: u64,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new("Responsive")
    }
}

impl ElementRegistry {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            elements: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Registers `element` under `id`, or under a generated id when none is given.
    ///
    /// Registering an existing id replaces the previous descriptor. Dead or destroyed elements are
    /// rejected and leave the registry untouched.
    pub fn register(
        &mut self,
        id: Option<ElementId>,
        element: ElementRef,
        kind: ElementKind,
        options: RegisterOptions,
    ) -> Result<ElementId, ResponsiveError> {
        let id = match id {
            Some(id) => id,
            None => self.generate_id(),
        };

        let descriptor = match ElementDescriptor::capture(id.clone(), element, kind, options) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                log::warn!("{}: cannot register element {}: {}", self.label, id, e);
                return Err(e);
            }
        };

        if self.elements.insert(id.clone(), descriptor).is_some() {
            log::warn!("{}: element {} was already registered, replacing it", self.label, id);
        }
        log::debug!("{}: registered {} element {}", self.label, kind, id);

        Ok(id)
    }

    /// Removes `id`. Unknown ids return `false`.
    pub fn unregister(&mut self, id: &ElementId) -> bool {
        if self.elements.remove(id).is_some() {
            log::debug!("{}: unregistered element {}", self.label, id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &ElementId) -> Option<&ElementDescriptor> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementDescriptor> {
        self.elements.values()
    }

    /// Drops every descriptor whose drawable is gone or destroyed. Returns the removed ids.
    pub fn prune_stale(&mut self) -> Vec<ElementId> {
        let stale: Vec<ElementId> = self
            .elements
            .values()
            .filter(|d| d.is_stale())
            .map(|d| d.id().clone())
            .collect();

        for id in &stale {
            self.elements.remove(id);
            log::warn!("{}: pruned stale element {}", self.label, id);
        }

        stale
    }

    fn generate_id(&mut self) -> ElementId {
        loop {
            let candidate = ElementId::new(format!("{}{}", GENERATED_ID_PREFIX, self.next_seq));
            self.next_seq += 1;
            // a caller may have picked a name that looks generated
            if !self.elements.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, Weak};
    use super::*;
    use crate::element::testing::{weak, Sprite};
    use crate::element::Constraints;

    #[test]
    fn register_and_unregister_round_trip() {
        let mut reg = ElementRegistry::default();
        let sprite = Sprite::shared(10.0, 20.0, 1.0);
        let before = reg.len();

        let id = reg
            .register(Some("hud".into()), weak(&sprite), ElementKind::Ui, RegisterOptions::default())
            .unwrap();
        assert_eq!(id.as_str(), "hud");
        assert_eq!(reg.len(), before + 1);
        assert!(reg.get(&id).is_some());

        assert!(reg.unregister(&id));
        assert_eq!(reg.len(), before);
    }

    #[test]
    fn unregister_unknown_is_false() {
        let mut reg = ElementRegistry::default();
        let sprite = Sprite::shared(0.0, 0.0, 1.0);
        reg.register(None, weak(&sprite), ElementKind::Text, RegisterOptions::default()).unwrap();

        assert!(!reg.unregister(&ElementId::from("nope")));
        assert_eq!(reg.len(), 1);

        // idempotent on a known id too
        let id = reg.iter().next().unwrap().id().clone();
        assert!(reg.unregister(&id));
        assert!(!reg.unregister(&id));
    }

    #[test]
    fn generated_ids_are_unique_and_not_reused() {
        let mut reg = ElementRegistry::default();
        let sprite = Sprite::shared(0.0, 0.0, 1.0);

        let a = reg.register(None, weak(&sprite), ElementKind::GameObject, RegisterOptions::default()).unwrap();
        assert!(reg.unregister(&a));
        let b = reg.register(None, weak(&sprite), ElementKind::GameObject, RegisterOptions::default()).unwrap();
        assert_ne!(a, b);

        // a caller-chosen id that collides with the next generated one
        reg.register(Some("element-2".into()), weak(&sprite), ElementKind::Ui, RegisterOptions::default())
            .unwrap();
        let c = reg.register(None, weak(&sprite), ElementKind::Ui, RegisterOptions::default()).unwrap();
        assert_ne!(c.as_str(), "element-2");
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn rejects_dead_reference() {
        let mut reg = ElementRegistry::default();
        let dead: Weak<Mutex<Sprite>> = Weak::new();

        let res = reg.register(Some("ghost".into()), dead, ElementKind::Background, RegisterOptions::default());
        assert!(matches!(res, Err(ResponsiveError::InvalidElement { .. })));
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_id_replaces_descriptor() {
        let mut reg = ElementRegistry::default();
        let first = Sprite::shared(1.0, 1.0, 1.0);
        let second = Sprite::shared(2.0, 2.0, 3.0);

        reg.register(Some("player".into()), weak(&first), ElementKind::GameObject, RegisterOptions::default())
            .unwrap();
        reg.register(
            Some("player".into()),
            weak(&second),
            ElementKind::GameObject,
            RegisterOptions::default().with_constraints(Constraints::max(2.0)),
        )
        .unwrap();

        assert_eq!(reg.len(), 1);
        let desc = reg.get(&"player".into()).unwrap();
        assert_eq!(desc.original_scale(), 3.0);
    }

    #[test]
    fn prune_removes_dropped_and_destroyed() {
        let mut reg = ElementRegistry::default();
        let keep = Sprite::shared(0.0, 0.0, 1.0);
        let dropped = Sprite::shared(0.0, 0.0, 1.0);
        let destroyed = Sprite::shared(0.0, 0.0, 1.0);

        reg.register(Some("keep".into()), weak(&keep), ElementKind::Ui, RegisterOptions::default()).unwrap();
        reg.register(Some("dropped".into()), weak(&dropped), ElementKind::Ui, RegisterOptions::default()).unwrap();
        reg.register(Some("destroyed".into()), weak(&destroyed), ElementKind::Ui, RegisterOptions::default())
            .unwrap();

        drop(dropped);
        destroyed.lock().unwrap().destroyed = true;

        let pruned = reg.prune_stale();
        assert_eq!(pruned, vec![ElementId::from("destroyed"), ElementId::from("dropped")]);
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&"keep".into()));
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = ElementRegistry::default();
        let sprite = Sprite::shared(0.0, 0.0, 1.0);
        for _ in 0..3 {
            reg.register(None, weak(&sprite), ElementKind::Background, RegisterOptions::default()).unwrap();
        }
        assert_eq!(reg.len(), 3);
        reg.clear();
        assert!(reg.is_empty());
    }
}
