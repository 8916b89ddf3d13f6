use std::cell::RefCell;
use std::fmt;

/// Handle returned by every registration in the crate (bus listeners, storage
/// signals, realtime channels, synchronizer observers).
///
/// `unsubscribe` is idempotent and removes exactly the registration that produced
/// the handle. Dropping the handle does *not* unsubscribe.
pub struct Subscription {
    release: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: RefCell::new(Some(Box::new(release))),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self {
            release: RefCell::new(None),
        }
    }

    pub fn unsubscribe(&self) {
        let release = self.release.borrow_mut().take();
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.borrow().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
