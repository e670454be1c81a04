//! Notification receive/open handling

mod confirm;
mod dedup;
mod format;
mod listener;
pub mod mock;
mod services;
mod types;

pub use confirm::{
    ConfirmationQueue, ConfirmationWorker, OpenedConfirmation, confirmation_channel,
};
pub use dedup::OpenedIdSet;
pub use format::{
    ANDROID_NOTIFICATION_ID_KEY, DEFAULT_TTL_SECONDS, Notification, OpenedResult,
    notification_id_from_json,
};
pub use listener::NotificationListener;
pub use services::{
    AnalyticsTracker, ApplicationService, ConfigSource, DestinationOpener, DeviceService,
    NotificationBackend, NotificationLifecycleHandler, NotificationServices, OpenAppSettings,
    ReceiveReceiptScheduler, SubscriptionSource,
};
pub use types::{AppEntryAction, DeviceType, NotificationGenerationJob, Surface};
