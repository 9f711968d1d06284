use std::time::Duration;

use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::telemetry::{Properties, TelemetryEvent, TelemetryPort};

/// Forwards captured events to a PostHog project.
///
/// Events captured before [`PosthogClient::start`] (or with no project key at
/// all) are dropped. After `start`, `capture` only pushes onto a channel; a
/// background task does the HTTP work and never retries.
pub struct PosthogClient {
    api_key: Option<String>,
    host: String,
    sender: OnceCell<mpsc::UnboundedSender<TelemetryEvent>>,
}

impl PosthogClient {
    pub fn new(api_key: Option<String>, host: &str) -> Self {
        Self {
            api_key,
            host: host.trim_end_matches('/').to_string(),
            sender: OnceCell::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.sender.get().is_some()
    }

    /// Spawns the delivery task. Must run inside a tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let Some(api_key) = self.api_key.clone() else {
            tracing::info!("POSTHOG_KEY not set, analytics events will be dropped");
            return;
        };
        if self.is_ready() {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if self.sender.set(tx).is_err() {
            return;
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let endpoint = format!("{}/capture/", self.host);
        tracing::info!("PostHog forwarding enabled at {}", endpoint);
        tokio::spawn(deliver(client, endpoint, api_key, rx));
    }
}

impl TelemetryPort for PosthogClient {
    fn capture(&self, name: &str, properties: Properties) {
        match self.sender.get() {
            Some(tx) => {
                if tx.send(TelemetryEvent::new(name, properties)).is_err() {
                    tracing::debug!("PostHog delivery task is gone, dropping {}", name);
                }
            }
            None => tracing::debug!("PostHog not initialized, dropping {}", name),
        }
    }
}

pub(crate) fn capture_payload(api_key: &str, event: &TelemetryEvent) -> Value {
    let distinct_id = event
        .properties
        .get("distinct_id")
        .and_then(Value::as_str)
        .unwrap_or("anonymous")
        .to_string();
    json!({
        "api_key": api_key,
        "event": event.name,
        "distinct_id": distinct_id,
        "properties": event.properties,
        "timestamp": event.timestamp.to_rfc3339(),
    })
}

async fn deliver(
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    mut rx: mpsc::UnboundedReceiver<TelemetryEvent>,
) {
    while let Some(event) = rx.recv().await {
        let payload = capture_payload(&api_key, &event);
        match client.post(&endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("PostHog accepted {}", event.name);
            }
            Ok(response) => {
                tracing::debug!("PostHog rejected {} with status {}", event.name, response.status());
            }
            Err(e) => {
                tracing::debug!("PostHog delivery of {} failed: {}", event.name, e);
            }
        }
    }
}
