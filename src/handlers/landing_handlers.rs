use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::components::cta::CtaPlacement;
use crate::components::thanks::{load_thanks, ThanksView};
use crate::components::viewport::{RegionObserver, RendererObserver};
use crate::content::SITE_TITLE;
use crate::handlers::session_dtos::{
    OpenSessionRequest, OpenSessionResponse, SiteResponse, VisibilityReport, VisibilityResponse,
};
use crate::session::{LandingSession, LeadResult, StepPane};
use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({"error": message.into()})))
}

fn find_session(state: &AppState, id: Uuid) -> Result<Arc<LandingSession>, ApiError> {
    state
        .sessions
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("Session {} not found", id)))
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn get_site(State(state): State<Arc<AppState>>) -> Json<SiteResponse> {
    Json(SiteResponse {
        title: SITE_TITLE,
        site_url: state.config.site_url.clone(),
        og_image: state.config.og_image_url(),
        pixel_id: state.config.meta_pixel_id.clone(),
        analytics_enabled: state.config.posthog_key.is_some(),
        lead_ready: state.session_deps.lead_endpoint.is_some(),
    })
}

pub async fn open_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<OpenSessionResponse>), ApiError> {
    if state.sessions.len() >= state.config.max_sessions {
        tracing::warn!("Refusing page session, {} already live", state.sessions.len());
        return Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Too many open sessions, try again later",
        ));
    }

    // An empty body means a browser with every capability.
    let request: OpenSessionRequest = if body.is_empty() {
        OpenSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| error(StatusCode::BAD_REQUEST, format!("Invalid session request: {}", e)))?
    };
    let observer: Option<Arc<dyn RegionObserver>> = if request.intersection_observer {
        Some(Arc::new(RendererObserver::new()))
    } else {
        None
    };

    let session = LandingSession::open(&state.session_deps, observer)
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let session = Arc::new(session);
    state.sessions.insert(session.id, session.clone());
    tracing::info!("Page session {} opened ({} live)", session.id, state.sessions.len());

    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: session.id,
            steps: session.steps().await,
            carousel: session.carousel().await,
            tracking_enabled: session.tracking_enabled().await,
            lead_ready: session.lead_ready(),
        }),
    ))
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let (_, session) = state
        .sessions
        .remove(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;
    session.close().await;
    tracing::info!("Page session {} closed", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_steps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepPane>, ApiError> {
    let session = find_session(&state, id)?;
    Ok(Json(session.steps().await))
}

pub async fn select_step(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<StepPane>, ApiError> {
    let session = find_session(&state, id)?;
    session
        .click_step(index)
        .await
        .map(Json)
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
}

pub async fn get_carousel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = find_session(&state, id)?;
    Ok(Json(json!(session.carousel().await)))
}

pub async fn click_carousel_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(Uuid, u32)>,
) -> Result<Json<Value>, ApiError> {
    let session = find_session(&state, id)?;
    let item = session
        .click_carousel_item(item_id)
        .await
        .map_err(|e| error(StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(json!({ "item": item })))
}

pub async fn focus_carousel_item(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<Value>, ApiError> {
    let session = find_session(&state, id)?;
    let offset = session
        .focus_carousel_item(index)
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(json!({ "offset": offset })))
}

pub async fn report_visibility(
    State(state): State<Arc<AppState>>,
    Path((id, region)): Path<(Uuid, String)>,
    Json(report): Json<VisibilityReport>,
) -> Result<Json<VisibilityResponse>, ApiError> {
    let session = find_session(&state, id)?;
    let fired = session.report_visibility(&region, report.ratio).await;
    Ok(Json(VisibilityResponse { region, fired }))
}

pub async fn click_cta(
    State(state): State<Arc<AppState>>,
    Path((id, placement)): Path<(Uuid, String)>,
) -> Result<Json<Value>, ApiError> {
    let session = find_session(&state, id)?;
    let placement: CtaPlacement = placement
        .parse()
        .map_err(|e: String| error(StatusCode::NOT_FOUND, e))?;
    Ok(Json(json!(session.click_cta(placement))))
}

pub async fn thirst_image_event(
    State(state): State<Arc<AppState>>,
    Path((id, event)): Path<(Uuid, String)>,
) -> Result<Json<Value>, ApiError> {
    let session = find_session(&state, id)?;
    match event.as_str() {
        "click" => {
            session.click_thirst_image();
            Ok(Json(json!({ "recorded": true })))
        }
        "load" => {
            let recorded = session.thirst_image_loaded().await;
            Ok(Json(json!({ "recorded": recorded })))
        }
        other => Err(error(
            StatusCode::NOT_FOUND,
            format!("Unknown image event: {}", other),
        )),
    }
}

pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(fields): Json<HashMap<String, String>>,
) -> Result<Json<LeadResult>, ApiError> {
    let session = find_session(&state, id)?;
    Ok(Json(session.submit_lead(Some(fields)).await))
}

pub async fn thanks(State(state): State<Arc<AppState>>) -> Json<ThanksView> {
    Json(load_thanks(state.pixel.as_ref()))
}
