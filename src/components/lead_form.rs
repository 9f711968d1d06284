use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::api::lead_webhook::{LeadSubmission, LeadTransport};
use crate::content::{
    LEAD_MAGNET, LEAD_SOURCE, MSG_BUSY, MSG_FAILURE, MSG_MISSING_EMAIL, MSG_NOT_READY, MSG_SUCCESS,
    SIGNUP_EVENT_SOURCE,
};
use crate::error::LeadError;
use crate::telemetry::{properties, TelemetryPort};

pub const EMAIL_FIELD: &str = "email";

/// Current values of the lead form's inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadForm {
    fields: HashMap<String, String>,
}

impl LeadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn with_email(email: &str) -> Self {
        let mut form = Self::new();
        form.set(EMAIL_FIELD, email);
        form
    }

    pub fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.to_string());
    }

    /// The email field, if present and not blank. No format check.
    pub fn email(&self) -> Option<&str> {
        self.fields
            .get(EMAIL_FIELD)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| v.is_empty())
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Applies the side effect an outcome has on the inputs.
    pub fn settle(&mut self, outcome: LeadOutcome) {
        if outcome.clears_form() {
            self.clear();
        }
    }
}

/// What the visitor sees after pressing submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadOutcome {
    Submitted,
    NotReady,
    Failed,
    Busy,
    MissingEmail,
}

impl LeadOutcome {
    pub fn message(self) -> &'static str {
        match self {
            LeadOutcome::Submitted => MSG_SUCCESS,
            LeadOutcome::NotReady => MSG_NOT_READY,
            LeadOutcome::Failed => MSG_FAILURE,
            LeadOutcome::Busy => MSG_BUSY,
            LeadOutcome::MissingEmail => MSG_MISSING_EMAIL,
        }
    }

    pub fn clears_form(self) -> bool {
        matches!(self, LeadOutcome::Submitted)
    }
}

impl From<&LeadError> for LeadOutcome {
    fn from(err: &LeadError) -> Self {
        match err {
            LeadError::FieldMissing(_) => LeadOutcome::MissingEmail,
            LeadError::ConfigMissing => LeadOutcome::NotReady,
            LeadError::InFlight => LeadOutcome::Busy,
            LeadError::Rejected(_) | LeadError::Transport(_) => LeadOutcome::Failed,
        }
    }
}

// Clears the in-flight flag even if the submit future is dropped midway.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns a form submission into a signup event plus one POST to the intake endpoint.
pub struct LeadPipeline {
    telemetry: Arc<dyn TelemetryPort>,
    transport: Arc<dyn LeadTransport>,
    endpoint: Option<Url>,
    in_flight: AtomicBool,
}

impl LeadPipeline {
    pub fn new(
        telemetry: Arc<dyn TelemetryPort>,
        transport: Arc<dyn LeadTransport>,
        endpoint: Option<Url>,
    ) -> Self {
        Self {
            telemetry,
            transport,
            endpoint,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submits and, on success, clears `form`.
    pub async fn submit_form(&self, form: &mut LeadForm) -> LeadOutcome {
        let outcome = self.submit(form).await;
        form.settle(outcome);
        outcome
    }

    /// Submits a snapshot of the form. The caller applies the outcome with [`LeadForm::settle`].
    pub async fn submit(&self, form: &LeadForm) -> LeadOutcome {
        match self.send(form).await {
            Ok(()) => LeadOutcome::Submitted,
            Err(e) => {
                match &e {
                    LeadError::ConfigMissing => tracing::warn!("Lead submitted but LEAD_WEBHOOK_URL is not configured"),
                    LeadError::InFlight | LeadError::FieldMissing(_) => tracing::debug!("Lead submission refused: {}", e),
                    _ => tracing::error!("Lead webhook error: {}", e),
                }
                LeadOutcome::from(&e)
            }
        }
    }

    async fn send(&self, form: &LeadForm) -> Result<(), LeadError> {
        let email = form.email().ok_or(LeadError::FieldMissing(EMAIL_FIELD))?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LeadError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.telemetry.capture(
            "lead_magnet_signup",
            properties(json!({
                "email": email,
                "source": SIGNUP_EVENT_SOURCE,
            })),
        );

        let endpoint = self.endpoint.as_ref().ok_or(LeadError::ConfigMissing)?;
        let submission = LeadSubmission {
            email: email.to_string(),
            source: LEAD_SOURCE.to_string(),
            lead_magnet: LEAD_MAGNET.to_string(),
        };

        let status = self.transport.post_json(endpoint, &submission).await?;
        if !(200..300).contains(&status) {
            return Err(LeadError::Rejected(status));
        }
        tracing::info!("Lead forwarded to intake endpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::telemetry::MemoryTelemetry;
    use futures::future::BoxFuture;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every call with a fixed status after an optional delay.
    struct CannedTransport {
        status: Option<u16>,
        delay: Duration,
        calls: AtomicUsize,
        bodies: Mutex<Vec<LeadSubmission>>,
    }

    impl CannedTransport {
        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status: Some(status),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                bodies: Mutex::new(Vec::new()),
            })
        }

        fn timing_out() -> Arc<Self> {
            Arc::new(Self {
                status: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                bodies: Mutex::new(Vec::new()),
            })
        }

        fn slow(status: u16, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                status: Some(status),
                delay,
                calls: AtomicUsize::new(0),
                bodies: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LeadTransport for CannedTransport {
        fn post_json<'a>(
            &'a self,
            _endpoint: &'a Url,
            submission: &'a LeadSubmission,
        ) -> BoxFuture<'a, Result<u16, TransportError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.bodies.lock().unwrap().push(submission.clone());
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.status.ok_or(TransportError::Timeout)
            })
        }
    }

    fn endpoint() -> Option<Url> {
        Url::parse("https://hooks.example.com/catch/1").ok()
    }

    fn pipeline(
        transport: Arc<CannedTransport>,
        endpoint: Option<Url>,
    ) -> (LeadPipeline, Arc<MemoryTelemetry>) {
        let telemetry = Arc::new(MemoryTelemetry::new());
        (LeadPipeline::new(telemetry.clone(), transport, endpoint), telemetry)
    }

    #[tokio::test]
    async fn no_endpoint_means_not_ready_and_no_call() {
        let transport = CannedTransport::status(200);
        let (pipeline, telemetry) = pipeline(transport.clone(), None);
        let mut form = LeadForm::with_email("reader@example.com");

        let outcome = pipeline.submit_form(&mut form).await;
        assert_eq!(outcome, LeadOutcome::NotReady);
        assert_eq!(outcome.message(), MSG_NOT_READY);
        assert_eq!(transport.calls(), 0);
        assert_eq!(form.email(), Some("reader@example.com"));
        // The signup event still goes out first.
        assert_eq!(telemetry.names(), vec!["lead_magnet_signup".to_string()]);
        assert!(!pipeline.is_in_flight());
    }

    #[tokio::test]
    async fn success_clears_the_form() {
        let transport = CannedTransport::status(200);
        let (pipeline, telemetry) = pipeline(transport.clone(), endpoint());
        let mut form = LeadForm::with_email("reader@example.com");

        let outcome = pipeline.submit_form(&mut form).await;
        assert_eq!(outcome, LeadOutcome::Submitted);
        assert_eq!(outcome.message(), MSG_SUCCESS);
        assert!(form.is_empty());
        assert_eq!(transport.calls(), 1);

        let body = transport.bodies.lock().unwrap()[0].clone();
        assert_eq!(body.email, "reader@example.com");
        assert_eq!(body.source, LEAD_SOURCE);
        assert_eq!(body.lead_magnet, LEAD_MAGNET);

        let events = telemetry.events();
        assert_eq!(events[0].properties["email"], "reader@example.com");
        assert_eq!(events[0].properties["source"], "landing_page");
    }

    #[tokio::test]
    async fn server_error_keeps_the_form() {
        let transport = CannedTransport::status(500);
        let (pipeline, _telemetry) = pipeline(transport.clone(), endpoint());
        let mut form = LeadForm::with_email("reader@example.com");

        let outcome = pipeline.submit_form(&mut form).await;
        assert_eq!(outcome, LeadOutcome::Failed);
        assert_eq!(outcome.message(), MSG_FAILURE);
        assert_eq!(form.email(), Some("reader@example.com"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn any_2xx_is_success() {
        let transport = CannedTransport::status(204);
        let (pipeline, _telemetry) = pipeline(transport, endpoint());
        assert_eq!(
            pipeline.submit(&LeadForm::with_email("a@b.c")).await,
            LeadOutcome::Submitted
        );
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let transport = CannedTransport::timing_out();
        let (pipeline, _telemetry) = pipeline(transport.clone(), endpoint());
        let mut form = LeadForm::with_email("reader@example.com");

        assert_eq!(pipeline.submit_form(&mut form).await, LeadOutcome::Failed);
        assert_eq!(transport.calls(), 1);
        assert!(!form.is_empty());
    }

    #[tokio::test]
    async fn missing_email_sends_nothing() {
        let transport = CannedTransport::status(200);
        let (pipeline, telemetry) = pipeline(transport.clone(), endpoint());

        assert_eq!(pipeline.submit(&LeadForm::new()).await, LeadOutcome::MissingEmail);
        assert_eq!(pipeline.submit(&LeadForm::with_email("   ")).await, LeadOutcome::MissingEmail);
        assert_eq!(transport.calls(), 0);
        assert!(telemetry.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_in_flight_is_refused() {
        let transport = CannedTransport::slow(200, Duration::from_secs(2));
        let (pipeline, telemetry) = pipeline(transport.clone(), endpoint());
        let form = LeadForm::with_email("reader@example.com");

        let (first, second) = tokio::join!(pipeline.submit(&form), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            pipeline.submit(&form).await
        });

        assert_eq!(first, LeadOutcome::Submitted);
        assert_eq!(second, LeadOutcome::Busy);
        assert_eq!(transport.calls(), 1);
        assert_eq!(telemetry.count("lead_magnet_signup"), 1);

        // Guard is released once the first call resolves.
        assert_eq!(pipeline.submit(&form).await, LeadOutcome::Submitted);
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn outcome_maps_from_errors() {
        assert_eq!(LeadOutcome::from(&LeadError::ConfigMissing), LeadOutcome::NotReady);
        assert_eq!(LeadOutcome::from(&LeadError::Rejected(404)), LeadOutcome::Failed);
        assert_eq!(
            LeadOutcome::from(&LeadError::Transport(TransportError::Timeout)),
            LeadOutcome::Failed
        );
        assert_eq!(LeadOutcome::from(&LeadError::InFlight), LeadOutcome::Busy);
    }
}
