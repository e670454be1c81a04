//! Notification listener
//!
//! Turns platform receive/open callbacks into receipt acknowledgments,
//! opened confirmations, analytics events and influence updates. Each
//! notification's open is confirmed at most once per listener lifetime.

use serde_json::Value;
use tracing::{debug, warn};

use super::confirm::{ConfirmationQueue, OpenedConfirmation};
use super::dedup::OpenedIdSet;
use super::format::{ANDROID_NOTIFICATION_ID_KEY, OpenedResult, notification_id_from_json};
use super::services::{NotificationLifecycleHandler, NotificationServices};
use super::types::{AppEntryAction, NotificationGenerationJob, Surface};
use crate::error::NotificationError;

/// Listener driving the engagement pipeline
pub struct NotificationListener {
    services: NotificationServices,
    confirmations: ConfirmationQueue,
    opened_ids: OpenedIdSet,
}

impl NotificationListener {
    /// Create a listener submitting confirmations to `confirmations`
    pub fn new(services: NotificationServices, confirmations: ConfirmationQueue) -> Self {
        Self {
            services,
            confirmations,
            opened_ids: OpenedIdSet::new(),
        }
    }

    /// Ids whose open has been confirmed so far
    pub fn opened_ids(&self) -> &OpenedIdSet {
        &self.opened_ids
    }

    /// Build the opened view for a received notification
    fn received_result(
        &self,
        job: &NotificationGenerationJob,
    ) -> Result<OpenedResult, NotificationError> {
        let mut payload = job.payload.clone();
        let object = payload.as_object_mut().ok_or_else(|| {
            NotificationError::MalformedPayload("payload is not an object".to_string())
        })?;
        object.insert(ANDROID_NOTIFICATION_ID_KEY.to_string(), Value::from(job.android_id));

        OpenedResult::from_data(std::slice::from_ref(&payload), self.services.clock.as_ref())
    }

    /// Whether this open starts a session directly caused by the notification
    ///
    /// An unreadable open setting counts as "open".
    fn should_init_direct_session(&self, surface: &Surface) -> bool {
        if self.services.application.is_in_foreground() {
            return false;
        }

        match self.services.open_settings.should_open_destination(surface) {
            Ok(open) => open,
            Err(e) => {
                // TODO: decide whether unreadable settings should still attribute the session
                warn!("Failed to read open settings, treating open as direct: {}", e);
                true
            }
        }
    }
}

impl NotificationLifecycleHandler for NotificationListener {
    fn on_notification_received(&self, job: &NotificationGenerationJob) {
        let notification_id = job.api_notification_id.as_str();

        self.services.receipts.enqueue_receive_receipt(notification_id);
        self.services.influence.on_notification_received(notification_id);

        let result = match self.received_result(job) {
            Ok(result) => result,
            Err(e) => {
                warn!(notification_id, "Skipping received analytics: {}", e);
                return;
            }
        };

        match result.notification_id() {
            Some(id) => {
                self.services
                    .analytics
                    .track_received_event(id, &result.campaign_name());
            }
            None => {
                warn!(
                    notification_id,
                    "Skipping received analytics: {}",
                    NotificationError::MissingNotificationId
                );
            }
        }
    }

    fn on_notification_opened(&self, surface: &Surface, data: &[Value]) {
        let app_id = self.services.config.app_id().unwrap_or_default();
        let subscription_id = self.services.subscriptions.push_subscription_id();
        let device_type = self.services.device.device_type();

        for payload in data {
            let Some(notification_id) = notification_id_from_json(payload) else {
                continue;
            };

            if !self.opened_ids.mark_opened(&notification_id) {
                debug!(%notification_id, "Open already confirmed, skipping");
                continue;
            }

            self.confirmations.submit(OpenedConfirmation {
                app_id: app_id.clone(),
                notification_id,
                subscription_id: subscription_id.clone(),
                device_type,
            });
        }

        let result = OpenedResult::from_data(data, self.services.clock.as_ref())
            .unwrap_or_else(|e| {
                warn!("Could not normalize opened notification: {}", e);
                OpenedResult::default()
            });
        self.services.analytics.track_opened_event(
            result.notification_id().unwrap_or_default(),
            &result.campaign_name(),
        );

        let latest_notification_id = data.first().and_then(notification_id_from_json);

        if self.should_init_direct_session(surface) {
            self.services
                .application
                .set_entry_state(AppEntryAction::NotificationClick);
            if let Some(id) = &latest_notification_id {
                self.services.influence.on_direct_influence_from_notification(id);
            }
        }

        self.services.opener.open_destination(surface, data);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::notifications::confirm::confirmation_channel;
    use crate::notifications::services::ApplicationService;
    use crate::notifications::mock::{
        AnalyticsEvent, MockServices, StaticIdentity, StaticOpenSettings,
    };

    fn payload(id: &str) -> Value {
        json!({ "custom": { "i": id }, "title": "Flash sale today" })
    }

    /// Run `f` against a fresh listener, then drain the confirmation worker
    async fn with_listener(mocks: &MockServices, f: impl FnOnce(&NotificationListener)) {
        let (queue, worker) = confirmation_channel(mocks.backend.clone());
        let handle = tokio::spawn(worker.run());
        let listener = NotificationListener::new(mocks.services(), queue);
        f(&listener);
        drop(listener);
        handle.await.unwrap();
    }

    // ==================== Receive ====================

    #[tokio::test]
    async fn receive_acknowledges_registers_and_tracks() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_received(&NotificationGenerationJob::new(
                "n-1",
                12,
                payload("n-1"),
            ));
        })
        .await;

        assert_eq!(mocks.receipts.enqueued(), vec!["n-1"]);
        assert_eq!(mocks.influence.received(), vec!["n-1"]);
        assert_eq!(
            mocks.analytics.events(),
            vec![AnalyticsEvent::Received {
                notification_id: "n-1".to_string(),
                campaign_name: "Flash sale".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn malformed_receive_payload_skips_only_analytics() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_received(&NotificationGenerationJob::new(
                "n-1",
                12,
                json!("not an object"),
            ));
            listener.on_notification_received(&NotificationGenerationJob::new(
                "n-2",
                13,
                json!({ "custom": "{broken" }),
            ));
            listener.on_notification_received(&NotificationGenerationJob::new(
                "n-3",
                14,
                json!({ "title": "no id" }),
            ));
        })
        .await;

        assert_eq!(mocks.receipts.enqueued(), vec!["n-1", "n-2", "n-3"]);
        assert_eq!(mocks.influence.received(), vec!["n-1", "n-2", "n-3"]);
        assert!(mocks.analytics.events().is_empty());
    }

    // ==================== Open ====================

    #[tokio::test]
    async fn open_confirms_each_id_once() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            let surface = Surface::new("main");
            listener.on_notification_opened(&surface, &[payload("n-1"), payload("n-2")]);
            listener.on_notification_opened(&surface, &[payload("n-1")]);
            assert!(listener.opened_ids().contains("n-2"));
        })
        .await;

        assert_eq!(mocks.backend.attempted_ids(), vec!["n-1", "n-2"]);
        assert_eq!(mocks.analytics.opened_count(), 2);
        assert_eq!(mocks.opener.opens().len(), 2);
    }

    #[tokio::test]
    async fn confirmation_carries_identity() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1")]);
        })
        .await;

        let attempts = mocks.backend.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].app_id, "test-app");
        assert_eq!(attempts[0].subscription_id, "test-subscription");
        assert_eq!(attempts[0].device_type.code(), 1);
    }

    #[tokio::test]
    async fn rejected_confirmation_stays_deduplicated() {
        let mocks = MockServices::new();
        mocks.backend.reject("n-1", 400, "invalid");
        with_listener(&mocks, |listener| {
            let surface = Surface::new("main");
            listener.on_notification_opened(&surface, &[payload("n-1")]);
            listener.on_notification_opened(&surface, &[payload("n-1")]);
            assert!(listener.opened_ids().contains("n-1"));
        })
        .await;

        assert_eq!(mocks.backend.attempted_ids(), vec!["n-1"]);
        assert!(mocks.backend.confirmed_ids().is_empty());
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(
                &Surface::new("main"),
                &[json!({ "custom": "{" }), payload("n-2"), json!(null)],
            );
        })
        .await;

        assert_eq!(mocks.backend.attempted_ids(), vec!["n-2"]);
        // The tapped element is unreadable, analytics still fires without an id
        assert_eq!(
            mocks.analytics.events(),
            vec![AnalyticsEvent::Opened {
                notification_id: String::new(),
                campaign_name: String::new(),
            }]
        );
        assert_eq!(mocks.opener.opens().len(), 1);
        assert!(mocks.influence.direct().is_empty());
        assert_eq!(
            mocks.application.entry_state(),
            AppEntryAction::NotificationClick
        );
    }

    #[tokio::test]
    async fn unreadable_grouped_entry_keeps_tapped_notification() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1"), json!(null)]);
        })
        .await;

        assert_eq!(
            mocks.analytics.events(),
            vec![AnalyticsEvent::Opened {
                notification_id: "n-1".to_string(),
                campaign_name: "Flash sale".to_string(),
            }]
        );
        assert_eq!(mocks.backend.attempted_ids(), vec!["n-1"]);
        assert_eq!(mocks.influence.direct(), vec!["n-1"]);
    }

    #[tokio::test]
    async fn empty_open_still_tracks_and_navigates() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[]);
        })
        .await;

        assert!(mocks.backend.attempted_ids().is_empty());
        assert_eq!(mocks.analytics.opened_count(), 1);
        assert_eq!(mocks.opener.opens().len(), 1);
        assert!(mocks.influence.direct().is_empty());
    }

    #[tokio::test]
    async fn already_opened_ids_still_track_and_navigate() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            let surface = Surface::new("main");
            listener.on_notification_opened(&surface, &[payload("n-1")]);
            listener.on_notification_opened(&surface, &[payload("n-1")]);
        })
        .await;

        assert_eq!(mocks.analytics.opened_count(), 2);
        assert_eq!(mocks.opener.opens().len(), 2);
        assert_eq!(mocks.influence.direct(), vec!["n-1", "n-1"]);
    }

    // ==================== Direct Session ====================

    #[tokio::test]
    async fn background_open_starts_direct_session() {
        let mocks = MockServices::new();
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(
                &Surface::new("main"),
                &[payload("n-1"), payload("n-0")],
            );
        })
        .await;

        assert_eq!(
            mocks.application.entry_state(),
            AppEntryAction::NotificationClick
        );
        assert_eq!(mocks.influence.direct(), vec!["n-1"]);
    }

    #[tokio::test]
    async fn foreground_open_does_not_start_direct_session() {
        let mocks = MockServices::new();
        mocks.application.set_foreground(true);
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1")]);
        })
        .await;

        assert_eq!(mocks.application.entry_state(), AppEntryAction::AppOpen);
        assert!(mocks.influence.direct().is_empty());
        assert_eq!(mocks.backend.attempted_ids(), vec!["n-1"]);
        assert_eq!(mocks.analytics.opened_count(), 1);
    }

    #[tokio::test]
    async fn disabled_open_setting_does_not_start_direct_session() {
        let mocks = MockServices::with_open_settings(StaticOpenSettings::DoNotOpen);
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1")]);
        })
        .await;

        assert_eq!(mocks.application.entry_state(), AppEntryAction::AppOpen);
        assert!(mocks.influence.direct().is_empty());
        assert_eq!(mocks.opener.opens().len(), 1);
    }

    #[tokio::test]
    async fn malformed_open_setting_defaults_to_direct_session() {
        let mocks = MockServices::with_open_settings(StaticOpenSettings::Malformed);
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1")]);
        })
        .await;

        assert_eq!(
            mocks.application.entry_state(),
            AppEntryAction::NotificationClick
        );
        assert_eq!(mocks.influence.direct(), vec!["n-1"]);
    }

    #[tokio::test]
    async fn missing_app_id_is_sent_empty() {
        let mut mocks = MockServices::new();
        mocks.identity = Arc::new(StaticIdentity {
            app_id: None,
            ..Default::default()
        });
        with_listener(&mocks, |listener| {
            listener.on_notification_opened(&Surface::new("main"), &[payload("n-1")]);
        })
        .await;

        assert_eq!(mocks.backend.attempts()[0].app_id, "");
    }
}
