use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use url::Url;

use crate::error::TransportError;

/// Body posted to the form-intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadSubmission {
    pub email: String,
    pub source: String,
    pub lead_magnet: String,
}

/// Outbound half of the lead pipeline. Resolves to the response status code.
pub trait LeadTransport: Send + Sync {
    fn post_json<'a>(
        &'a self,
        endpoint: &'a Url,
        submission: &'a LeadSubmission,
    ) -> BoxFuture<'a, Result<u16, TransportError>>;
}

/// reqwest-backed transport with a bounded request timeout.
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl LeadTransport for WebhookClient {
    fn post_json<'a>(
        &'a self,
        endpoint: &'a Url,
        submission: &'a LeadSubmission,
    ) -> BoxFuture<'a, Result<u16, TransportError>> {
        Box::pin(async move {
            // .json() sets Content-Type: application/json
            let response = self
                .client
                .post(endpoint.clone())
                .json(submission)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        TransportError::Timeout
                    } else {
                        TransportError::Request(e)
                    }
                })?;
            Ok(response.status().as_u16())
        })
    }
}
