use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use kailo_landing::api::lead_webhook::WebhookClient;
use kailo_landing::api::meta_pixel::MetaPixel;
use kailo_landing::api::posthog::PosthogClient;
use kailo_landing::config::LandingConfig;
use kailo_landing::{router, AppState};

const REAP_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kailo_landing=debug,hyper=warn,reqwest=warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = LandingConfig::from_env().context("Invalid configuration")?;
    if config.lead_webhook_url.is_none() {
        tracing::warn!("LEAD_WEBHOOK_URL not set, lead form will answer with the not-ready message");
    }

    let posthog = Arc::new(PosthogClient::new(config.posthog_key.clone(), &config.posthog_host));
    posthog.start();
    let pixel = Arc::new(MetaPixel::new(config.meta_pixel_id.clone()));
    let lead_transport = Arc::new(WebhookClient::new(config.lead_timeout));

    let state = Arc::new(
        AppState::new(config.clone(), posthog, pixel, lead_transport)
            .context("DEFAULT_STEP does not name an existing step")?,
    );

    let reaper_state = state.clone();
    let session_ttl = config.session_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_EVERY);
        loop {
            interval.tick().await;
            reaper_state.reap_expired(session_ttl).await;
        }
    });

    let frontend_origin: axum::http::HeaderValue = config
        .frontend_url
        .parse()
        .with_context(|| format!("Invalid FRONTEND_URL {}", config.frontend_url))?;
    let app = router(state.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_origin(AllowOrigin::exact(frontend_origin))
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::ORIGIN,
                ]),
        );

    tracing::info!("Starting landing engine on port {}", config.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    state.close_all().await;
    Ok(())
}
