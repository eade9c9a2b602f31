//! Application-under-test client
//!
//! Delivers synthesized Slack traffic to the endpoints a test configures:
//! events as JSON, interactions as a JSON-wrapped payload string, and
//! shortcuts form-encoded, matching what Slack itself sends.

use reqwest::Client;
use serde::Serialize;
use tracing::trace;

use crate::error::HarnessError;
use crate::types::{EventEnvelope, InteractionPayload};

/// Body wrapper for interactive payloads: Slack double-encodes them as a
/// JSON string under a `payload` key
#[derive(Debug, Clone, Serialize)]
struct PayloadEnvelope {
    payload: String,
}

/// HTTP client for the application under test
#[derive(Debug, Clone)]
pub struct AppClient {
    client: Client,
}

impl AppClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Deliver an event to the configured event endpoint
    pub async fn post_event(&self, url: &str, envelope: &EventEnvelope) -> Result<(), HarnessError> {
        trace!(url = %url, "Delivering event to application under test");

        self.client
            .post(url)
            .json(envelope)
            .send()
            .await
            .map_err(HarnessError::Request)?;

        Ok(())
    }

    /// Deliver a block_actions interaction as a JSON body
    pub async fn post_interaction(
        &self,
        url: &str,
        payload: &InteractionPayload,
    ) -> Result<(), HarnessError> {
        trace!(url = %url, "Delivering interaction to application under test");

        let payload = serde_json::to_string(payload)?;
        self.client
            .post(url)
            .json(&PayloadEnvelope { payload })
            .send()
            .await
            .map_err(HarnessError::Request)?;

        Ok(())
    }

    /// Deliver a shortcut interaction as a form-encoded body
    pub async fn post_shortcut(
        &self,
        url: &str,
        payload: &InteractionPayload,
    ) -> Result<(), HarnessError> {
        trace!(url = %url, "Delivering shortcut to application under test");

        let payload = serde_json::to_string(payload)?;
        self.client
            .post(url)
            .form(&[("payload", payload.as_str())])
            .send()
            .await
            .map_err(HarnessError::Request)?;

        Ok(())
    }
}

impl Default for AppClient {
    fn default() -> Self {
        Self::new()
    }
}
