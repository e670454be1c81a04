//! Background delivery of opened confirmations
//!
//! The listener submits confirmations to an unbounded channel so a callback
//! never waits on the network. A single worker drains the channel in
//! submission order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::services::NotificationBackend;
use super::types::DeviceType;
use crate::error::BackendError;

/// One "notification opened" confirmation for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedConfirmation {
    pub app_id: String,
    pub notification_id: String,
    pub subscription_id: String,
    pub device_type: DeviceType,
}

/// Submitting half held by the listener
#[derive(Debug, Clone)]
pub struct ConfirmationQueue {
    tx: mpsc::UnboundedSender<OpenedConfirmation>,
}

/// Worker that sends queued confirmations to the backend
pub struct ConfirmationWorker {
    rx: mpsc::UnboundedReceiver<OpenedConfirmation>,
    backend: Arc<dyn NotificationBackend>,
}

/// Create a connected queue and worker
///
/// The worker must be spawned on a tokio runtime; it stops once every
/// queue handle has been dropped and the backlog is drained.
pub fn confirmation_channel(
    backend: Arc<dyn NotificationBackend>,
) -> (ConfirmationQueue, ConfirmationWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConfirmationQueue { tx }, ConfirmationWorker { rx, backend })
}

impl ConfirmationQueue {
    /// Hand a confirmation to the worker without waiting for it
    pub fn submit(&self, confirmation: OpenedConfirmation) {
        if let Err(mpsc::error::SendError(dropped)) = self.tx.send(confirmation) {
            warn!(
                notification_id = %dropped.notification_id,
                "Confirmation worker stopped, dropping opened confirmation"
            );
        }
    }
}

impl ConfirmationWorker {
    /// Deliver confirmations until the queue closes
    ///
    /// Failures are logged and dropped; nothing is retried.
    pub async fn run(mut self) {
        info!("Confirmation worker started");

        while let Some(confirmation) = self.rx.recv().await {
            let result = self
                .backend
                .update_notification_as_opened(
                    &confirmation.app_id,
                    &confirmation.notification_id,
                    &confirmation.subscription_id,
                    confirmation.device_type,
                )
                .await;

            match result {
                Ok(()) => {
                    debug!(
                        notification_id = %confirmation.notification_id,
                        "Opened confirmation sent"
                    );
                }
                Err(BackendError::Rejected {
                    status_code,
                    response,
                }) => {
                    error!(
                        notification_id = %confirmation.notification_id,
                        status_code,
                        response = response.as_deref().unwrap_or(""),
                        "Notification opened confirmation failed"
                    );
                }
            }
        }

        info!("Confirmation queue closed, stopping worker");
    }
}
