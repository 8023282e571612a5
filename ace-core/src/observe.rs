//! Single-owner values with weak observers.
//!
//! A modifier owns its animatable state through an [`ObservedValue`]; the
//! render tree keeps an [`Observer`] and reads the latest committed value each
//! frame. Observers never keep the value alive.

use std::sync::{Arc, PoisonError, RwLock, Weak};

/// A value with exactly one owner and any number of weak observers.
#[derive(Debug, Default)]
pub struct ObservedValue<T> {
    inner: Arc<RwLock<T>>,
}

impl<T: Clone> ObservedValue<T> {
    /// Wrap `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Replace the published value.
    pub fn set(&self, value: T) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = value;
    }

    /// Clone of the published value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Create a weak observer of this value.
    #[must_use]
    pub fn observer(&self) -> Observer<T> {
        Observer {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak, read-only view of an [`ObservedValue`].
#[derive(Debug, Clone)]
pub struct Observer<T> {
    inner: Weak<RwLock<T>>,
}

impl<T: Clone> Observer<T> {
    /// The latest published value, or `None` once the owner is gone.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.inner.upgrade().map(|value| {
            value
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Whether the owner is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
