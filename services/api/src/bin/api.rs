//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{BroadcastNotifier, JsonFileStore, MemoryStore, NotifyingStore},
    config::{Config, StoreBackend},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use discipline_core::{ChangeNotifier, RecordStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Shared Store ---
    let backing: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::File => {
            info!("Opening file store in {}", config.data_dir.display());
            Arc::new(JsonFileStore::open(&config.data_dir).await?)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; nothing will survive a restart.");
            Arc::new(MemoryStore::new())
        }
    };

    // Every write is announced so open tabs can reconcile right away.
    let notifier: Arc<dyn ChangeNotifier> = Arc::new(BroadcastNotifier::new());
    let store: Arc<dyn RecordStore> = Arc::new(NotifyingStore::new(backing, notifier.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), store, notifier));
    app_state.spawn_reaper();
    info!(
        "Closing tabs idle for more than {:?}",
        config.session_idle_timeout
    );

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
