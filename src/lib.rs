use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

pub mod api {
    pub mod lead_webhook;
    pub mod meta_pixel;
    pub mod posthog;
}
pub mod components {
    pub mod carousel;
    pub mod cta;
    pub mod lead_form;
    pub mod steps;
    pub mod thanks;
    pub mod viewport;
}
pub mod handlers {
    pub mod landing_handlers;
    pub mod session_dtos;
}
pub mod config;
pub mod content;
pub mod error;
pub mod session;
pub mod telemetry;

use api::lead_webhook::LeadTransport;
use api::meta_pixel::ConversionPixel;
use components::carousel::CarouselGeometry;
use components::steps::StepNavigator;
use config::LandingConfig;
use error::StepError;
use handlers::landing_handlers;
use session::{LandingSession, SessionDeps};
use telemetry::TelemetryPort;

pub struct AppState {
    pub config: LandingConfig,
    pub session_deps: SessionDeps,
    pub pixel: Arc<dyn ConversionPixel>,
    pub sessions: DashMap<Uuid, Arc<LandingSession>>,
}

impl AppState {
    /// Wires the shared collaborators. Fails if the configured default step does not exist.
    pub fn new(
        config: LandingConfig,
        telemetry: Arc<dyn TelemetryPort>,
        pixel: Arc<dyn ConversionPixel>,
        lead_transport: Arc<dyn LeadTransport>,
    ) -> Result<Self, StepError> {
        StepNavigator::new(&content::STEPS, config.default_step)?;
        let session_deps = SessionDeps {
            telemetry,
            lead_transport,
            lead_endpoint: config.lead_webhook_url.clone(),
            default_step: config.default_step,
            geometry: CarouselGeometry::default(),
        };
        Ok(Self {
            config,
            session_deps,
            pixel,
            sessions: DashMap::new(),
        })
    }

    /// Closes sessions opened more than `max_age` ago. Returns how many went away.
    pub async fn reap_expired(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        let now = Utc::now();
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| now - entry.value().opened_at > max_age)
            .map(|entry| *entry.key())
            .collect();

        let mut closed = 0;
        for id in expired {
            if let Some((_, session)) = self.sessions.remove(&id) {
                session.close().await;
                closed += 1;
            }
        }
        if closed > 0 {
            tracing::info!("Reaped {} expired page sessions", closed);
        }
        closed
    }

    /// Closes every live session, for shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, session)) = self.sessions.remove(&id) {
                session.close().await;
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let session_routes = Router::new()
        .route("/api/sessions", post(landing_handlers::open_session))
        .route("/api/sessions/{id}", axum::routing::delete(landing_handlers::close_session))
        .route("/api/sessions/{id}/steps", get(landing_handlers::get_steps))
        .route("/api/sessions/{id}/steps/{index}", post(landing_handlers::select_step))
        .route("/api/sessions/{id}/carousel", get(landing_handlers::get_carousel))
        .route("/api/sessions/{id}/carousel/items/{item_id}/click", post(landing_handlers::click_carousel_item))
        .route("/api/sessions/{id}/carousel/focus/{index}", post(landing_handlers::focus_carousel_item))
        .route("/api/sessions/{id}/sections/{region}/visibility", post(landing_handlers::report_visibility))
        .route("/api/sessions/{id}/cta/{placement}", post(landing_handlers::click_cta))
        .route("/api/sessions/{id}/image/{event}", post(landing_handlers::thirst_image_event))
        .route("/api/sessions/{id}/lead", post(landing_handlers::submit_lead));

    Router::new()
        .route("/api/health", get(landing_handlers::health_check))
        .route("/api/site", get(landing_handlers::get_site))
        .route("/api/thanks", get(landing_handlers::thanks))
        .merge(session_routes)
        .with_state(state)
}
