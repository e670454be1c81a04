//! Process-lifetime record of opened notifications

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Notification ids whose open has already been confirmed
///
/// The set only grows; it lives as long as the listener that owns it.
#[derive(Debug, Default)]
pub struct OpenedIdSet {
    ids: Mutex<HashSet<String>>,
}

impl OpenedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `notification_id` as opened
    ///
    /// Returns `true` only for the first caller; check and insert happen
    /// under a single lock acquisition.
    pub fn mark_opened(&self, notification_id: &str) -> bool {
        let mut ids = self.ids();
        if ids.contains(notification_id) {
            return false;
        }
        ids.insert(notification_id.to_string())
    }

    pub fn contains(&self, notification_id: &str) -> bool {
        self.ids().contains(notification_id)
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}
