use std::time::Duration;

pub const PIXEL_ENDPOINT: &str = "https://www.facebook.com/tr";

/// Third-party conversion tracker. Fire and forget.
#[cfg_attr(test, mockall::automock)]
pub trait ConversionPixel: Send + Sync {
    fn track(&self, event: &str);
}

pub struct MetaPixel {
    client: reqwest::Client,
    pixel_id: Option<String>,
    endpoint: String,
}

impl MetaPixel {
    pub fn new(pixel_id: Option<String>) -> Self {
        Self::with_endpoint(pixel_id, PIXEL_ENDPOINT)
    }

    pub fn with_endpoint(pixel_id: Option<String>, endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            pixel_id,
            endpoint: endpoint.to_string(),
        }
    }
}

impl ConversionPixel for MetaPixel {
    fn track(&self, event: &str) {
        let Some(pixel_id) = self.pixel_id.clone() else {
            tracing::debug!("META_PIXEL_ID not set, skipping pixel event {}", event);
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available, skipping pixel event {}", event);
            return;
        };

        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("id", pixel_id.as_str()), ("ev", event), ("noscript", "1")]);
        let event = event.to_string();
        runtime.spawn(async move {
            match request.send().await {
                Ok(response) => {
                    tracing::debug!("Pixel event {} sent, status {}", event, response.status())
                }
                Err(e) => tracing::debug!("Pixel event {} failed: {}", event, e),
            }
        });
    }
}
