//! engage-core: notification engagement attribution
//!
//! This crate decides what happens when a push notification is received or
//! opened on a device:
//!
//! - **Listener** - [`NotificationListener`] acknowledges receipts, confirms
//!   each notification's open at most once, emits analytics events and
//!   promotes tapped notifications to direct influence
//! - **Influence** - [`InfluenceTracker`] classifies sessions as direct,
//!   indirect or unattributed from recent notification history
//! - **Outcomes** - [`OutcomeEvent`] with its full and compact encodings
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use engage_core::notifications::mock::MockServices;
//! use engage_core::{
//!     NotificationLifecycleHandler, NotificationListener, Surface, confirmation_channel,
//! };
//! use serde_json::json;
//!
//! # async fn example() {
//! let mocks = MockServices::new();
//! let (queue, worker) = confirmation_channel(mocks.backend.clone());
//! tokio::spawn(worker.run());
//!
//! let listener = Arc::new(NotificationListener::new(mocks.services(), queue));
//! listener.on_notification_opened(
//!     &Surface::new("main"),
//!     &[json!({ "custom": { "i": "notification-id" } })],
//! );
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! platform ──▶ NotificationListener ──▶ OpenedIdSet (dedup)
//!                   │        │
//!                   │        └──▶ ConfirmationQueue ──▶ ConfirmationWorker ──▶ backend
//!                   └──▶ receipts / influence / analytics / navigation
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod influence;
pub mod notifications;
pub mod outcomes;

// Re-export key types for convenience
pub use clock::{Clock, SystemClock};
pub use config::{EngageConfig, InfluenceConfig};
pub use error::{BackendError, NotificationError, OutcomeError, SettingsError};
pub use influence::{Influence, InfluenceManager, InfluenceTracker, InfluenceType};
pub use notifications::{
    AppEntryAction, ApplicationService, ConfirmationQueue, ConfirmationWorker, DeviceType,
    NotificationBackend, NotificationGenerationJob, NotificationLifecycleHandler,
    NotificationListener, NotificationServices, OpenedIdSet, Surface, confirmation_channel,
};
pub use outcomes::{
    EncodingMode, OutcomeEvent, OutcomeEventParams, OutcomeSource, OutcomeSourceBody,
};
