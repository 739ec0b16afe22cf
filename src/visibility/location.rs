use std::sync::Mutex;

use crate::sky::Site;

/// Source of the observer location; `None` while it is not known yet.
pub trait LocationProvider: Send + Sync {
    fn current(&self) -> Option<Site>;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Site);

impl LocationProvider for FixedLocation {
    fn current(&self) -> Option<Site> {
        Some(self.0)
    }
}

/// Location set at runtime, e.g. once the mount reports its position.
#[derive(Debug, Default)]
pub struct SharedLocation {
    site: Mutex<Option<Site>>,
}

impl SharedLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, site: Option<Site>) {
        *self.site.lock().unwrap() = site;
    }
}

impl LocationProvider for SharedLocation {
    fn current(&self) -> Option<Site> {
        *self.site.lock().unwrap()
    }
}
