use crate::element::ElementId;

/// Errors surfaced by the responsive manager.
///
/// Only the configuration variants are fatal, and only at construction time. Everything else is
/// recovered locally: rejected registrations come back to the caller, update failures are logged
/// and counted but never leave an update pass.
#[derive(Debug, thiserror::Error)]
pub enum ResponsiveError {
    #[error("element reference for {id} is no longer alive")]
    InvalidElement { id: ElementId },

    #[error("element {id} is already destroyed")]
    ElementDestroyed { id: ElementId },

    #[error("update of element {id} failed: {source}")]
    Update {
        id: ElementId,
        #[source]
        source: TransformError,
    },

    #[error("invalid base resolution {width}x{height} (both sides must be finite and positive)")]
    InvalidBaseResolution { width: f64, height: f64 },

    #[error("change threshold {0} must be finite and not negative")]
    InvalidThreshold(f64),

    #[error("element lock poisoned")]
    Poisoned,

    #[error("manager has been destroyed")]
    ManagerDestroyed,
}

impl ResponsiveError {
    /// True for errors that stop a manager from being constructed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ResponsiveError::InvalidBaseResolution { .. } | ResponsiveError::InvalidThreshold(_)
        )
    }
}

/// Error returned by a [`Transformable`](crate::element::Transformable) adapter when it cannot
/// apply a transform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("drawable was destroyed")]
    Destroyed,

    #[error("drawable rejected transform: {0}")]
    Rejected(String),

    #[error("non-finite position ({x}, {y})")]
    NonFinitePosition { x: f64, y: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        let err = ResponsiveError::InvalidBaseResolution { width: 0.0, height: 600.0 };
        assert!(err.is_configuration());
        assert!(ResponsiveError::InvalidThreshold(-1.0).is_configuration());

        let err = ResponsiveError::InvalidElement { id: ElementId::from("hud") };
        assert!(!err.is_configuration());
    }

    #[test]
    fn update_error_keeps_source() {
        let err = ResponsiveError::Update {
            id: ElementId::from("enemy"),
            source: TransformError::Destroyed,
        };
        assert_eq!(err.to_string(), "update of element enemy failed: drawable was destroyed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
