// Glance API server
// Decision: the tracking surface is unauthenticated and CORS-permissive;
//           dashboard auth is handled by the deployment's gateway
// Decision: live updates are WebSocket fan-out from a process-local registry

mod error;
mod live;
mod registry;
mod track;
mod websites;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use glance_core::{GeoResolver, MaxmindGeo, NoopGeo, WootheeParser};
use glance_storage::Database;

use crate::registry::TopicRegistry;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    live_topics: usize,
}

async fn health(State(registry): State<Arc<TopicRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        live_topics: registry.topic_count().await,
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        track::track,
        websites::create_website,
        websites::list_websites,
        websites::get_website,
        websites::update_website,
        websites::delete_website,
        websites::website_activity,
    ),
    components(
        schemas(
            glance_core::TrackPayload,
            glance_core::ConnectionInfo,
            glance_core::PerformanceInfo,
            track::TrackResponse,
            websites::CreateWebsiteRequest,
            websites::UpdateWebsiteRequest,
            websites::Website,
            websites::WebsiteWithStats,
            websites::PageViewRecord,
            websites::EventRecord,
            websites::ActivityResponse,
        )
    ),
    tags(
        (name = "tracking", description = "Cookieless event ingestion"),
        (name = "websites", description = "Website management endpoints")
    ),
    info(
        title = "Glance API",
        version = "0.1.0",
        description = "Cookieless web analytics: ingestion, live fan-out, website management",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glance_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("glance-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Connected to database");

    // GeoIP is optional; without a database file country stays unresolved
    let geo: Arc<dyn GeoResolver> = match std::env::var("GEOIP_DB_PATH") {
        Ok(path) => {
            let resolver = MaxmindGeo::open(&path)
                .with_context(|| format!("Failed to open GeoIP database at {path}"))?;
            tracing::info!(%path, "GeoIP database loaded");
            Arc::new(resolver)
        }
        Err(_) => {
            tracing::warn!("GEOIP_DB_PATH not set, country resolution disabled");
            Arc::new(NoopGeo)
        }
    };

    let db = Arc::new(db);
    let registry = Arc::new(TopicRegistry::new());

    // Create module-specific states
    let track_state = track::AppState {
        db: db.clone(),
        registry: registry.clone(),
        ua_parser: Arc::new(WootheeParser::new()),
        geo,
    };
    let live_state = live::AppState {
        registry: registry.clone(),
    };
    let websites_state = websites::AppState { db: db.clone() };

    let app = Router::new()
        .route("/health", get(health).with_state(registry.clone()))
        .merge(track::routes(track_state))
        .merge(live::routes(live_state))
        .merge(websites::routes(websites_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Trackers post from every origin a website runs on
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
