//! Session influence tracking
//!
//! The tracker remembers which notifications the device received and which
//! one (if any) was tapped to open the app, and classifies the current
//! session from that history.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use super::types::Influence;
use crate::clock::Clock;
use crate::config::InfluenceConfig;

/// Influence subsystem contract driven by the notification listener
///
/// Both calls are fire-and-forget: the listener never waits on or
/// inspects their effect.
pub trait InfluenceManager: Send + Sync {
    /// A notification arrived on the device
    fn on_notification_received(&self, notification_id: &str);

    /// A notification was tapped and will start the upcoming session
    fn on_direct_influence_from_notification(&self, notification_id: &str);
}

#[derive(Debug, Clone)]
struct ReceivedEntry {
    notification_id: String,
    received_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TrackerState {
    /// Oldest first, bounded by `notification_limit`
    received: VecDeque<ReceivedEntry>,
    direct_id: Option<String>,
}

/// In-memory, time-windowed influence tracker
pub struct InfluenceTracker {
    config: InfluenceConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<TrackerState>,
}

impl InfluenceTracker {
    pub fn new(config: InfluenceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(TrackerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Classify the current session
    pub fn session_influence(&self) -> Influence {
        if !self.config.enabled {
            return Influence::disabled();
        }

        let state = self.state();
        if let Some(id) = &state.direct_id {
            return Influence::direct(id.clone());
        }

        // A window too large to represent covers the whole history
        let cutoff = TimeDelta::try_minutes(self.config.indirect_window_minutes)
            .and_then(|window| self.clock.now().checked_sub_signed(window));
        let ids: Vec<String> = state
            .received
            .iter()
            .filter(|entry| cutoff.is_none_or(|cutoff| entry.received_at > cutoff))
            .map(|entry| entry.notification_id.clone())
            .collect();

        if ids.is_empty() {
            Influence::unattributed()
        } else {
            Influence::indirect(ids)
        }
    }

    /// Forget the direct source; the next session is classified from history
    pub fn end_session(&self) {
        self.state().direct_id = None;
    }

    /// Notification ids currently remembered, oldest first
    pub fn received_ids(&self) -> Vec<String> {
        self.state()
            .received
            .iter()
            .map(|entry| entry.notification_id.clone())
            .collect()
    }
}

impl InfluenceManager for InfluenceTracker {
    fn on_notification_received(&self, notification_id: &str) {
        if !self.config.enabled {
            return;
        }

        let received_at = self.clock.now();
        let mut state = self.state();
        state
            .received
            .retain(|entry| entry.notification_id != notification_id);
        state.received.push_back(ReceivedEntry {
            notification_id: notification_id.to_string(),
            received_at,
        });
        while state.received.len() > self.config.notification_limit {
            state.received.pop_front();
        }
        debug!(notification_id, tracked = state.received.len(), "Notification received");
    }

    fn on_direct_influence_from_notification(&self, notification_id: &str) {
        if !self.config.enabled {
            return;
        }

        debug!(notification_id, "Direct influence from notification");
        self.state().direct_id = Some(notification_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::influence::InfluenceType;
    use crate::notifications::mock::FixedClock;

    fn tracker(config: InfluenceConfig) -> (InfluenceTracker, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_millis(1_700_000_000_000));
        (InfluenceTracker::new(config, clock.clone()), clock)
    }

    #[test]
    fn no_history_is_unattributed() {
        let (tracker, _) = tracker(InfluenceConfig::default());
        assert_eq!(tracker.session_influence(), Influence::unattributed());
    }

    #[test]
    fn received_notifications_are_indirect_oldest_first() {
        let (tracker, _) = tracker(InfluenceConfig::default());
        tracker.on_notification_received("n-1");
        tracker.on_notification_received("n-2");

        let influence = tracker.session_influence();
        assert_eq!(influence.influence_type, InfluenceType::Indirect);
        assert_eq!(influence.notification_ids, vec!["n-1", "n-2"]);
    }

    #[test]
    fn direct_wins_over_received_history() {
        let (tracker, _) = tracker(InfluenceConfig::default());
        tracker.on_notification_received("n-1");
        tracker.on_direct_influence_from_notification("n-2");

        assert_eq!(tracker.session_influence(), Influence::direct("n-2"));
    }

    #[test]
    fn ending_session_falls_back_to_history() {
        let (tracker, _) = tracker(InfluenceConfig::default());
        tracker.on_notification_received("n-1");
        tracker.on_direct_influence_from_notification("n-1");
        tracker.end_session();

        assert_eq!(
            tracker.session_influence().influence_type,
            InfluenceType::Indirect
        );
    }

    #[test]
    fn notifications_outside_window_are_not_credited() {
        let config = InfluenceConfig {
            indirect_window_minutes: 30,
            ..InfluenceConfig::default()
        };
        let (tracker, clock) = tracker(config);
        tracker.on_notification_received("old");
        clock.advance(Duration::minutes(20));
        tracker.on_notification_received("recent");
        clock.advance(Duration::minutes(15));

        let influence = tracker.session_influence();
        assert_eq!(influence.influence_type, InfluenceType::Indirect);
        assert_eq!(influence.notification_ids, vec!["recent"]);

        clock.advance(Duration::minutes(30));
        assert_eq!(tracker.session_influence(), Influence::unattributed());
    }

    #[test]
    fn oversized_window_credits_all_history() {
        let config = InfluenceConfig {
            indirect_window_minutes: i64::MAX,
            ..InfluenceConfig::default()
        };
        let (tracker, clock) = tracker(config);
        tracker.on_notification_received("n-1");
        clock.advance(Duration::days(3650));

        let influence = tracker.session_influence();
        assert_eq!(influence.influence_type, InfluenceType::Indirect);
        assert_eq!(influence.notification_ids, vec!["n-1"]);
    }

    #[test]
    fn history_is_bounded_by_limit() {
        let config = InfluenceConfig {
            notification_limit: 2,
            ..InfluenceConfig::default()
        };
        let (tracker, _) = tracker(config);
        tracker.on_notification_received("n-1");
        tracker.on_notification_received("n-2");
        tracker.on_notification_received("n-3");

        assert_eq!(tracker.received_ids(), vec!["n-2", "n-3"]);
    }

    #[test]
    fn re_receipt_moves_id_to_newest() {
        let (tracker, _) = tracker(InfluenceConfig::default());
        tracker.on_notification_received("n-1");
        tracker.on_notification_received("n-2");
        tracker.on_notification_received("n-1");

        assert_eq!(tracker.received_ids(), vec!["n-2", "n-1"]);
    }

    #[test]
    fn disabled_tracker_ignores_everything() {
        let (tracker, _) = tracker(InfluenceConfig::disabled());
        tracker.on_notification_received("n-1");
        tracker.on_direct_influence_from_notification("n-1");

        assert!(tracker.received_ids().is_empty());
        assert_eq!(tracker.session_influence(), Influence::disabled());
    }
}
