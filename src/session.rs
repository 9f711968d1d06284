use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::api::lead_webhook::LeadTransport;
use crate::components::carousel::{CarouselEngine, CarouselGeometry, CarouselSnapshot, CarouselTicker};
use crate::components::cta::{self, CtaPlacement, CtaTarget};
use crate::components::lead_form::{LeadForm, LeadOutcome, LeadPipeline};
use crate::components::steps::{StepButton, StepNavigator, StepView};
use crate::components::viewport::{RegionObserver, ViewportTracker};
use crate::content::{
    CarouselItem, REFLECTION_STORAGE_KEY, STEPS, TESTIMONIALS, TESTIMONIALS_SECTION,
    TRACKED_SECTIONS,
};
use crate::error::{CarouselError, StepError};
use crate::telemetry::{properties, SessionTelemetry, TelemetryPort};

/// Shared collaborators every page session is wired to.
#[derive(Clone)]
pub struct SessionDeps {
    pub telemetry: Arc<dyn TelemetryPort>,
    pub lead_transport: Arc<dyn LeadTransport>,
    pub lead_endpoint: Option<Url>,
    pub default_step: usize,
    pub geometry: CarouselGeometry,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepPane {
    pub active: StepView,
    pub buttons: Vec<StepButton>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadResult {
    pub outcome: LeadOutcome,
    pub message: &'static str,
    pub form: LeadForm,
}

/// Engine state for one page load, from first render until the page goes away.
pub struct LandingSession {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
    telemetry: Arc<dyn TelemetryPort>,
    navigator: Mutex<StepNavigator>,
    carousel: Arc<Mutex<CarouselEngine>>,
    ticker: Mutex<Option<CarouselTicker>>,
    tracker: Mutex<ViewportTracker>,
    lead_form: Mutex<LeadForm>,
    lead: LeadPipeline,
}

impl LandingSession {
    /// Builds every component and mounts the carousel. Must run inside a tokio runtime.
    pub fn open(
        deps: &SessionDeps,
        observer: Option<Arc<dyn RegionObserver>>,
    ) -> Result<Self, StepError> {
        let id = Uuid::new_v4();
        let telemetry: Arc<dyn TelemetryPort> =
            Arc::new(SessionTelemetry::new(deps.telemetry.clone(), id.to_string()));

        let navigator = StepNavigator::new(&STEPS, deps.default_step)?;
        let mut tracker = ViewportTracker::attach(&TRACKED_SECTIONS, observer, telemetry.clone());

        let carousel = Arc::new(Mutex::new(CarouselEngine::new(&TESTIMONIALS, deps.geometry)));
        let ticker = CarouselTicker::mount(carousel.clone(), deps.geometry.tick_interval);
        // The carousel reports its own section once it is on the page.
        tracker.record_view(TESTIMONIALS_SECTION);

        let lead = LeadPipeline::new(
            telemetry.clone(),
            deps.lead_transport.clone(),
            deps.lead_endpoint.clone(),
        );

        tracing::debug!("Opened page session {}", id);
        Ok(Self {
            id,
            opened_at: Utc::now(),
            telemetry,
            navigator: Mutex::new(navigator),
            carousel,
            ticker: Mutex::new(Some(ticker)),
            tracker: Mutex::new(tracker),
            lead_form: Mutex::new(LeadForm::new()),
            lead,
        })
    }

    pub async fn steps(&self) -> StepPane {
        let navigator = self.navigator.lock().await;
        StepPane {
            active: navigator.render(),
            buttons: navigator.buttons(),
        }
    }

    /// A step button was pressed: report it, then switch the pane.
    pub async fn click_step(&self, index: usize) -> Result<StepPane, StepError> {
        let mut navigator = self.navigator.lock().await;
        let step = match navigator.step(index) {
            Some(step) => step,
            None => {
                let err = StepError::OutOfRange {
                    index,
                    len: navigator.len(),
                };
                tracing::error!("Step button rejected: {}", err);
                return Err(err);
            }
        };
        self.telemetry.capture(
            "step_button_click",
            properties(json!({
                "step_id": step.id,
                "label": step.label,
            })),
        );
        let active = navigator.select_step(index)?;
        Ok(StepPane {
            active,
            buttons: navigator.buttons(),
        })
    }

    pub async fn carousel(&self) -> CarouselSnapshot {
        self.carousel.lock().await.snapshot()
    }

    pub async fn click_carousel_item(&self, id: u32) -> Result<CarouselItem, CarouselError> {
        let carousel = self.carousel.lock().await;
        carousel.click_item(id, self.telemetry.as_ref()).cloned()
    }

    pub async fn focus_carousel_item(&self, index: usize) -> Result<f64, CarouselError> {
        self.carousel.lock().await.focus_item(index)
    }

    pub async fn is_carousel_running(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map(CarouselTicker::is_running)
            .unwrap_or(false)
    }

    /// Intersection report for a region. Returns whether its view event fired.
    pub async fn report_visibility(&self, region: &str, ratio: f64) -> bool {
        self.tracker.lock().await.on_intersection(region, ratio)
    }

    pub async fn tracking_enabled(&self) -> bool {
        self.tracker.lock().await.is_enabled()
    }

    pub fn click_cta(&self, placement: CtaPlacement) -> CtaTarget {
        cta::click_cta(placement, self.telemetry.as_ref())
    }

    pub fn click_thirst_image(&self) {
        cta::click_thirst_image(self.telemetry.as_ref());
    }

    pub async fn thirst_image_loaded(&self) -> bool {
        self.tracker.lock().await.record_once(
            REFLECTION_STORAGE_KEY,
            "reflection_storage_view",
            cta::reflection_storage_properties(),
        )
    }

    /// Submits the lead form. `fields`, when given, replaces what is typed in the form first.
    pub async fn submit_lead(&self, fields: Option<HashMap<String, String>>) -> LeadResult {
        let snapshot = {
            let mut form = self.lead_form.lock().await;
            if let Some(fields) = fields {
                *form = LeadForm::from_fields(fields);
            }
            form.clone()
        };

        let outcome = self.lead.submit(&snapshot).await;

        let mut form = self.lead_form.lock().await;
        // Input written while this submission was in flight belongs to a later attempt.
        if *form == snapshot {
            form.settle(outcome);
        }
        LeadResult {
            outcome,
            message: outcome.message(),
            form: form.clone(),
        }
    }

    pub fn lead_ready(&self) -> bool {
        self.lead.is_ready()
    }

    /// Page teardown: stops the carousel and releases every observation handle.
    pub async fn close(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.unmount().await;
        }
        self.tracker.lock().await.detach();
        tracing::debug!("Closed page session {}", self.id);
    }
}
