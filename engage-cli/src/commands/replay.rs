//! Replay scripted notification callbacks through a listener
//!
//! Collaborators are the recording mocks from engage-core, so nothing
//! leaves the process; the report shows what a device would have sent.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use engage_core::notifications::mock::{AnalyticsEvent, MockServices};
use engage_core::{
    AppEntryAction, ApplicationService, Clock, EngageConfig, Influence, InfluenceTracker,
    NotificationGenerationJob, NotificationLifecycleHandler, NotificationListener,
    NotificationServices, OutcomeEvent, OutcomeEventParams, Surface, SystemClock,
    confirmation_channel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON file holding the list of steps to replay
    pub script: PathBuf,

    /// Extra config file layered over user and project config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the outcome reported for the resulting session
    #[arg(long, default_value = "session_open")]
    pub outcome: String,
}

/// One platform callback
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Received {
        api_notification_id: String,
        #[serde(default)]
        android_id: i32,
        payload: Value,
    },
    Opened {
        #[serde(default = "default_surface")]
        surface: String,
        #[serde(default)]
        foreground: bool,
        data: Vec<Value>,
    },
    /// Close the current session so the next one is classified afresh
    EndSession,
}

fn default_surface() -> String {
    "main".to_string()
}

#[derive(Debug, Serialize)]
struct ConfirmationReport {
    notification_id: String,
    app_id: String,
    subscription_id: String,
    device_type: i32,
}

#[derive(Debug, Serialize)]
struct OutcomeReport {
    full: Value,
    compact: Value,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    confirmations: Vec<ConfirmationReport>,
    receipts: Vec<String>,
    analytics: Vec<AnalyticsEvent>,
    navigations: usize,
    entry_state: AppEntryAction,
    influence: Influence,
    outcome: OutcomeReport,
}

pub async fn run(args: ReplayArgs) -> Result<()> {
    let config = ConfigLoader::load(args.config.as_deref())?;
    let contents = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid replay script {}", args.script.display()))?;

    let report = replay(&config, &steps, &args.outcome).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn replay(
    config: &EngageConfig,
    steps: &[Step],
    outcome_name: &str,
) -> Result<ReplayReport> {
    let mocks = MockServices::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker = Arc::new(InfluenceTracker::new(config.influence.clone(), clock.clone()));
    let services = NotificationServices {
        config: Arc::new(config.clone()),
        influence: tracker.clone(),
        clock: clock.clone(),
        ..mocks.services()
    };

    let (queue, worker) = confirmation_channel(mocks.backend.clone());
    let worker_handle = tokio::spawn(worker.run());
    let listener = NotificationListener::new(services, queue);

    info!(steps = steps.len(), "Replaying notification callbacks");
    for step in steps {
        match step {
            Step::Received {
                api_notification_id,
                android_id,
                payload,
            } => {
                let job = NotificationGenerationJob::new(
                    api_notification_id.clone(),
                    *android_id,
                    payload.clone(),
                );
                listener.on_notification_received(&job);
            }
            Step::Opened {
                surface,
                foreground,
                data,
            } => {
                mocks.application.set_foreground(*foreground);
                listener.on_notification_opened(&Surface::new(surface.clone()), data);
            }
            Step::EndSession => {
                tracker.end_session();
                mocks.application.set_entry_state(AppEntryAction::AppClose);
            }
        }
    }

    drop(listener);
    worker_handle.await.context("Confirmation worker panicked")?;

    let influence = tracker.session_influence();
    let params = OutcomeEventParams::for_influence(
        outcome_name,
        &influence,
        0.0,
        clock.now().timestamp(),
    );
    let event = OutcomeEvent::from_params(&params);

    Ok(ReplayReport {
        confirmations: mocks
            .backend
            .attempts()
            .into_iter()
            .map(|c| ConfirmationReport {
                notification_id: c.notification_id,
                app_id: c.app_id,
                subscription_id: c.subscription_id,
                device_type: c.device_type.code(),
            })
            .collect(),
        receipts: mocks.receipts.enqueued(),
        analytics: mocks.analytics.events(),
        navigations: mocks.opener.opens().len(),
        entry_state: mocks.application.entry_state(),
        influence,
        outcome: OutcomeReport {
            full: event.to_json_object(),
            compact: event.to_json_object_for_measure(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engage_core::InfluenceType;

    fn script() -> Vec<Step> {
        serde_json::from_str(
            r#"[
                { "type": "received", "api_notification_id": "n-1", "android_id": 3,
                  "payload": { "custom": { "i": "n-1" }, "title": "Hello" } },
                { "type": "opened", "data": [ { "custom": { "i": "n-1" } } ] },
                { "type": "opened", "foreground": true,
                  "data": [ { "custom": { "i": "n-1" } } ] }
            ]"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_replay_confirms_once_and_attributes_directly() {
        let config = EngageConfig::with_app_id("app-9");
        let report = replay(&config, &script(), "session_open").await.unwrap();

        assert_eq!(report.confirmations.len(), 1);
        assert_eq!(report.confirmations[0].app_id, "app-9");
        assert_eq!(report.receipts, vec!["n-1"]);
        assert_eq!(report.navigations, 2);
        assert_eq!(report.entry_state, AppEntryAction::NotificationClick);
        assert_eq!(report.influence, Influence::direct("n-1"));
        assert_eq!(report.outcome.full["session"], "DIRECT");
        assert_eq!(report.outcome.compact["notification_ids"][0], "n-1");
    }

    #[tokio::test]
    async fn test_end_session_falls_back_to_indirect() {
        let mut steps = script();
        steps.push(Step::EndSession);
        let report = replay(&EngageConfig::default(), &steps, "session_open")
            .await
            .unwrap();

        assert_eq!(report.influence.influence_type, InfluenceType::Indirect);
        assert_eq!(report.entry_state, AppEntryAction::AppClose);
        assert_eq!(report.confirmations[0].app_id, "");
        assert!(report.outcome.compact.get("session").is_none());
    }

    #[test]
    fn test_step_defaults() {
        let step: Step = serde_json::from_str(r#"{ "type": "opened", "data": [] }"#).unwrap();
        match step {
            Step::Opened {
                surface,
                foreground,
                data,
            } => {
                assert_eq!(surface, "main");
                assert!(!foreground);
                assert!(data.is_empty());
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }
}
