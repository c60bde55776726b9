//! Fire-and-forget usage analytics.
//!
//! Emission never blocks or fails a request: events are POSTed from a
//! spawned task and delivery errors are logged at debug. With no endpoint
//! configured, `emit` is a no-op.

use chrono::Utc;
use serde_json::json;

#[derive(Clone)]
pub struct Analytics {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl Analytics {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn emit(&self, event: &str, org_id: &str, user_id: &str, properties: serde_json::Value) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let payload = json!({
            "event": event,
            "org_id": org_id,
            "user_id": user_id,
            "timestamp": Utc::now().to_rfc3339(),
            "properties": properties,
        });
        let http = self.http.clone();
        let event = event.to_string();
        tokio::spawn(async move {
            if let Err(err) = http.post(&endpoint).json(&payload).send().await {
                tracing::debug!(event = %event, error = %err, "analytics emission failed");
            }
        });
    }
}
