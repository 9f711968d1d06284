use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use url::Url;

use kailo_landing::api::lead_webhook::{LeadSubmission, LeadTransport, WebhookClient};
use kailo_landing::api::meta_pixel::{ConversionPixel, MetaPixel};
use kailo_landing::api::posthog::PosthogClient;
use kailo_landing::components::lead_form::{LeadForm, LeadOutcome, LeadPipeline};
use kailo_landing::error::TransportError;
use kailo_landing::telemetry::{properties, MemoryTelemetry, TelemetryPort};

#[derive(Default)]
struct Received {
    bodies: Mutex<Vec<(Option<String>, Value)>>,
}

async fn accept(
    State(received): State<Arc<Received>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.bodies.lock().await.push((content_type, body));
    StatusCode::OK
}

async fn explode() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn stall() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(30)).await;
    StatusCode::OK
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn intake() -> (String, Arc<Received>) {
    let received = Arc::new(Received::default());
    let app = Router::new()
        .route("/catch", post(accept))
        .route("/broken", post(explode))
        .route("/slow", post(stall))
        .with_state(received.clone());
    (serve(app).await, received)
}

fn submission() -> LeadSubmission {
    LeadSubmission {
        email: "reader@example.com".to_string(),
        source: "KaiLo Landing Page".to_string(),
        lead_magnet: "AI 소크라테스: 나를 파고드는 질문 프롬프트 키트".to_string(),
    }
}

#[tokio::test]
async fn posts_json_body_to_endpoint() {
    let (base, received) = intake().await;
    let client = WebhookClient::new(Duration::from_secs(5));
    let endpoint = Url::parse(&format!("{}/catch", base)).unwrap();

    let status = client.post_json(&endpoint, &submission()).await.unwrap();
    assert_eq!(status, 200);

    let bodies = received.bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    let (content_type, body) = &bodies[0];
    assert!(content_type.as_deref().unwrap().starts_with("application/json"));
    assert_eq!(
        body,
        &json!({
            "email": "reader@example.com",
            "source": "KaiLo Landing Page",
            "lead_magnet": "AI 소크라테스: 나를 파고드는 질문 프롬프트 키트",
        })
    );
}

#[tokio::test]
async fn error_status_is_returned_not_raised() {
    let (base, _) = intake().await;
    let client = WebhookClient::new(Duration::from_secs(5));
    let endpoint = Url::parse(&format!("{}/broken", base)).unwrap();
    assert_eq!(client.post_json(&endpoint, &submission()).await.unwrap(), 500);
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let (base, _) = intake().await;
    let client = WebhookClient::new(Duration::from_millis(200));
    let endpoint = Url::parse(&format!("{}/slow", base)).unwrap();
    let result = client.post_json(&endpoint, &submission()).await;
    assert!(matches!(result, Err(TransportError::Timeout)));
}

#[tokio::test]
async fn pipeline_against_live_endpoint() {
    let (base, received) = intake().await;
    let telemetry = Arc::new(MemoryTelemetry::new());
    let pipeline = LeadPipeline::new(
        telemetry.clone(),
        Arc::new(WebhookClient::new(Duration::from_secs(5))),
        Some(Url::parse(&format!("{}/catch", base)).unwrap()),
    );

    let mut form = LeadForm::with_email("reader@example.com");
    let outcome = pipeline.submit_form(&mut form).await;
    assert_eq!(outcome, LeadOutcome::Submitted);
    assert!(form.is_empty());
    assert_eq!(received.bodies.lock().await.len(), 1);
    assert_eq!(telemetry.count("lead_magnet_signup"), 1);

    let failing = LeadPipeline::new(
        telemetry.clone(),
        Arc::new(WebhookClient::new(Duration::from_secs(5))),
        Some(Url::parse(&format!("{}/broken", base)).unwrap()),
    );
    let mut form = LeadForm::with_email("reader@example.com");
    assert_eq!(failing.submit_form(&mut form).await, LeadOutcome::Failed);
    assert_eq!(form.email(), Some("reader@example.com"));
}

#[tokio::test]
async fn unreachable_endpoint_fails_softly() {
    // Bind and drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pipeline = LeadPipeline::new(
        Arc::new(MemoryTelemetry::new()),
        Arc::new(WebhookClient::new(Duration::from_secs(2))),
        Some(Url::parse(&format!("http://{}/catch", addr)).unwrap()),
    );
    let mut form = LeadForm::with_email("reader@example.com");
    assert_eq!(pipeline.submit_form(&mut form).await, LeadOutcome::Failed);
}

#[tokio::test]
async fn posthog_forwards_captured_events() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let app = Router::new().route(
        "/capture/",
        post(move |Json(body): Json<Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(body);
                StatusCode::OK
            }
        }),
    );
    let base = serve(app).await;

    let client = PosthogClient::new(Some("phc_test".to_string()), &base);
    client.start();
    assert!(client.is_ready());
    client.capture(
        "hero_section_view",
        properties(json!({"section": "hero", "distinct_id": "page-1"})),
    );

    let body = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body["api_key"], "phc_test");
    assert_eq!(body["event"], "hero_section_view");
    assert_eq!(body["distinct_id"], "page-1");
    assert_eq!(body["properties"]["section"], "hero");
}

#[tokio::test]
async fn pixel_sends_event_query() {
    let (tx, mut rx) = mpsc::unbounded_channel::<HashMap<String, String>>();
    let app = Router::new().route(
        "/tr",
        axum::routing::get(move |Query(query): Query<HashMap<String, String>>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(query);
                StatusCode::OK
            }
        }),
    );
    let base = serve(app).await;

    let pixel = MetaPixel::with_endpoint(Some("998877".to_string()), &format!("{}/tr", base));
    pixel.track("Lead");

    let query = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(query.get("id").map(String::as_str), Some("998877"));
    assert_eq!(query.get("ev").map(String::as_str), Some("Lead"));
}
