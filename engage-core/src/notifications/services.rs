//! Collaborator contracts the notification listener drives
//!
//! Methods returning `()` are fire-and-forget: returning means the request
//! was accepted, and retries or failures belong to the implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::types::{AppEntryAction, DeviceType, NotificationGenerationJob, Surface};
use crate::clock::Clock;
use crate::error::{BackendError, SettingsError};
use crate::influence::InfluenceManager;

/// Schedules best-effort receipt acknowledgments
pub trait ReceiveReceiptScheduler: Send + Sync {
    fn enqueue_receive_receipt(&self, notification_id: &str);
}

/// Backend endpoint confirming notification opens
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn update_notification_as_opened(
        &self,
        app_id: &str,
        notification_id: &str,
        subscription_id: &str,
        device_type: DeviceType,
    ) -> Result<(), BackendError>;
}

/// Analytics sink for notification engagement
///
/// An empty `notification_id` means the id could not be extracted.
pub trait AnalyticsTracker: Send + Sync {
    fn track_received_event(&self, notification_id: &str, campaign_name: &str);

    fn track_opened_event(&self, notification_id: &str, campaign_name: &str);
}

/// Navigates to the destination a notification points at
pub trait DestinationOpener: Send + Sync {
    fn open_destination(&self, surface: &Surface, data: &[Value]);
}

/// Stored setting deciding whether a tap opens the app's destination
pub trait OpenAppSettings: Send + Sync {
    fn should_open_destination(&self, surface: &Surface) -> Result<bool, SettingsError>;
}

/// Application lifecycle state
pub trait ApplicationService: Send + Sync {
    fn is_in_foreground(&self) -> bool;

    fn entry_state(&self) -> AppEntryAction;

    fn set_entry_state(&self, action: AppEntryAction);
}

/// Read-only application configuration
pub trait ConfigSource: Send + Sync {
    fn app_id(&self) -> Option<String>;
}

/// Current push subscription
pub trait SubscriptionSource: Send + Sync {
    /// Push subscription id, empty when not yet registered
    fn push_subscription_id(&self) -> String;
}

/// Device metadata
pub trait DeviceService: Send + Sync {
    fn device_type(&self) -> DeviceType;
}

/// Entry points the platform calls when notifications arrive or are opened
///
/// Implementations must never panic or surface errors to the caller.
pub trait NotificationLifecycleHandler: Send + Sync {
    fn on_notification_received(&self, job: &NotificationGenerationJob);

    /// `data` is ordered newest first; element 0 triggered the open
    fn on_notification_opened(&self, surface: &Surface, data: &[Value]);
}

/// Collaborators injected into the listener
#[derive(Clone)]
pub struct NotificationServices {
    pub application: Arc<dyn ApplicationService>,
    pub config: Arc<dyn ConfigSource>,
    pub influence: Arc<dyn InfluenceManager>,
    pub subscriptions: Arc<dyn SubscriptionSource>,
    pub device: Arc<dyn DeviceService>,
    pub receipts: Arc<dyn ReceiveReceiptScheduler>,
    pub opener: Arc<dyn DestinationOpener>,
    pub open_settings: Arc<dyn OpenAppSettings>,
    pub analytics: Arc<dyn AnalyticsTracker>,
    pub clock: Arc<dyn Clock>,
}
