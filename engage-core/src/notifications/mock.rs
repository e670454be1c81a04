//! Recording collaborators for tests and dry runs
//!
//! Every mock records what the listener asked of it so tests can assert
//! on the calls. `MockServices` wires a full set into a
//! [`NotificationServices`] bundle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use super::confirm::OpenedConfirmation;
use super::services::{
    AnalyticsTracker, ApplicationService, ConfigSource, DestinationOpener, DeviceService,
    NotificationBackend, NotificationServices, OpenAppSettings, ReceiveReceiptScheduler,
    SubscriptionSource,
};
use super::types::{AppEntryAction, DeviceType, Surface};
use crate::clock::Clock;
use crate::error::{BackendError, SettingsError};
use crate::influence::InfluenceManager;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Records receipt acknowledgment requests
#[derive(Debug, Default)]
pub struct RecordingReceipts {
    enqueued: Mutex<Vec<String>>,
}

impl RecordingReceipts {
    pub fn enqueued(&self) -> Vec<String> {
        lock(&self.enqueued).clone()
    }
}

impl ReceiveReceiptScheduler for RecordingReceipts {
    fn enqueue_receive_receipt(&self, notification_id: &str) {
        lock(&self.enqueued).push(notification_id.to_string());
    }
}

/// Records influence subsystem calls
#[derive(Debug, Default)]
pub struct RecordingInfluence {
    received: Mutex<Vec<String>>,
    direct: Mutex<Vec<String>>,
}

impl RecordingInfluence {
    pub fn received(&self) -> Vec<String> {
        lock(&self.received).clone()
    }

    pub fn direct(&self) -> Vec<String> {
        lock(&self.direct).clone()
    }
}

impl InfluenceManager for RecordingInfluence {
    fn on_notification_received(&self, notification_id: &str) {
        lock(&self.received).push(notification_id.to_string());
    }

    fn on_direct_influence_from_notification(&self, notification_id: &str) {
        lock(&self.direct).push(notification_id.to_string());
    }
}

/// Backend that accepts confirmations unless told to reject an id
#[derive(Debug, Default)]
pub struct MockNotificationBackend {
    rejections: Mutex<HashMap<String, (u16, String)>>,
    attempts: Mutex<Vec<OpenedConfirmation>>,
    confirmed: Mutex<Vec<OpenedConfirmation>>,
}

impl MockNotificationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every confirmation for `notification_id`
    pub fn reject(&self, notification_id: &str, status_code: u16, response: &str) {
        lock(&self.rejections).insert(
            notification_id.to_string(),
            (status_code, response.to_string()),
        );
    }

    /// Every confirmation the backend was asked for, in arrival order
    pub fn attempts(&self) -> Vec<OpenedConfirmation> {
        lock(&self.attempts).clone()
    }

    pub fn attempted_ids(&self) -> Vec<String> {
        lock(&self.attempts)
            .iter()
            .map(|c| c.notification_id.clone())
            .collect()
    }

    pub fn confirmed_ids(&self) -> Vec<String> {
        lock(&self.confirmed)
            .iter()
            .map(|c| c.notification_id.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationBackend for MockNotificationBackend {
    async fn update_notification_as_opened(
        &self,
        app_id: &str,
        notification_id: &str,
        subscription_id: &str,
        device_type: DeviceType,
    ) -> Result<(), BackendError> {
        let confirmation = OpenedConfirmation {
            app_id: app_id.to_string(),
            notification_id: notification_id.to_string(),
            subscription_id: subscription_id.to_string(),
            device_type,
        };
        lock(&self.attempts).push(confirmation.clone());

        if let Some((status_code, response)) = lock(&self.rejections).get(notification_id) {
            return Err(BackendError::Rejected {
                status_code: *status_code,
                response: Some(response.clone()),
            });
        }

        lock(&self.confirmed).push(confirmation);
        Ok(())
    }
}

/// Analytics call captured by [`RecordingAnalytics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    Received {
        notification_id: String,
        campaign_name: String,
    },
    Opened {
        notification_id: String,
        campaign_name: String,
    },
}

/// Records analytics events
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        lock(&self.events).clone()
    }

    pub fn opened_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| matches!(e, AnalyticsEvent::Opened { .. }))
            .count()
    }
}

impl AnalyticsTracker for RecordingAnalytics {
    fn track_received_event(&self, notification_id: &str, campaign_name: &str) {
        lock(&self.events).push(AnalyticsEvent::Received {
            notification_id: notification_id.to_string(),
            campaign_name: campaign_name.to_string(),
        });
    }

    fn track_opened_event(&self, notification_id: &str, campaign_name: &str) {
        lock(&self.events).push(AnalyticsEvent::Opened {
            notification_id: notification_id.to_string(),
            campaign_name: campaign_name.to_string(),
        });
    }
}

/// Records navigation requests as (surface, data list)
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opens: Mutex<Vec<(Surface, Vec<Value>)>>,
}

impl RecordingOpener {
    pub fn opens(&self) -> Vec<(Surface, Vec<Value>)> {
        lock(&self.opens).clone()
    }
}

impl DestinationOpener for RecordingOpener {
    fn open_destination(&self, surface: &Surface, data: &[Value]) {
        lock(&self.opens).push((surface.clone(), data.to_vec()));
    }
}

/// Open-destination setting with a fixed answer
#[derive(Debug, Clone)]
pub enum StaticOpenSettings {
    Open,
    DoNotOpen,
    /// The stored setting cannot be read
    Malformed,
}

impl OpenAppSettings for StaticOpenSettings {
    fn should_open_destination(&self, _surface: &Surface) -> Result<bool, SettingsError> {
        match self {
            Self::Open => Ok(true),
            Self::DoNotOpen => Ok(false),
            Self::Malformed => Err(SettingsError::Malformed(
                "open setting is not valid JSON".to_string(),
            )),
        }
    }
}

/// Application state controlled by the test
#[derive(Debug, Default)]
pub struct MockApplication {
    foreground: AtomicBool,
    entry_state: Mutex<AppEntryAction>,
}

impl MockApplication {
    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }
}

impl ApplicationService for MockApplication {
    fn is_in_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn entry_state(&self) -> AppEntryAction {
        *lock(&self.entry_state)
    }

    fn set_entry_state(&self, action: AppEntryAction) {
        *lock(&self.entry_state) = action;
    }
}

/// Fixed subscription, device and app id values
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    pub app_id: Option<String>,
    pub subscription_id: String,
    pub device_type: DeviceType,
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self {
            app_id: Some("test-app".to_string()),
            subscription_id: "test-subscription".to_string(),
            device_type: DeviceType::Android,
        }
    }
}

impl ConfigSource for StaticIdentity {
    fn app_id(&self) -> Option<String> {
        self.app_id.clone()
    }
}

impl SubscriptionSource for StaticIdentity {
    fn push_subscription_id(&self) -> String {
        self.subscription_id.clone()
    }
}

impl DeviceService for StaticIdentity {
    fn device_type(&self) -> DeviceType {
        self.device_type
    }
}

/// A complete set of recording collaborators
pub struct MockServices {
    pub application: Arc<MockApplication>,
    pub identity: Arc<StaticIdentity>,
    pub influence: Arc<RecordingInfluence>,
    pub receipts: Arc<RecordingReceipts>,
    pub opener: Arc<RecordingOpener>,
    pub open_settings: Arc<StaticOpenSettings>,
    pub analytics: Arc<RecordingAnalytics>,
    pub backend: Arc<MockNotificationBackend>,
    pub clock: Arc<FixedClock>,
}

impl MockServices {
    pub fn new() -> Self {
        Self::with_open_settings(StaticOpenSettings::Open)
    }

    pub fn with_open_settings(open_settings: StaticOpenSettings) -> Self {
        Self {
            application: Arc::new(MockApplication::default()),
            identity: Arc::new(StaticIdentity::default()),
            influence: Arc::new(RecordingInfluence::default()),
            receipts: Arc::new(RecordingReceipts::default()),
            opener: Arc::new(RecordingOpener::default()),
            open_settings: Arc::new(open_settings),
            analytics: Arc::new(RecordingAnalytics::default()),
            backend: Arc::new(MockNotificationBackend::new()),
            clock: Arc::new(FixedClock::at_millis(1_700_000_000_000)),
        }
    }

    /// Bundle the mocks, using `influence` in place of the recorder
    pub fn services_with_influence(
        &self,
        influence: Arc<dyn InfluenceManager>,
    ) -> NotificationServices {
        NotificationServices {
            application: self.application.clone(),
            config: self.identity.clone(),
            influence,
            subscriptions: self.identity.clone(),
            device: self.identity.clone(),
            receipts: self.receipts.clone(),
            opener: self.opener.clone(),
            open_settings: self.open_settings.clone(),
            analytics: self.analytics.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn services(&self) -> NotificationServices {
        self.services_with_influence(self.influence.clone())
    }
}

impl Default for MockServices {
    fn default() -> Self {
        Self::new()
    }
}
