mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod triggers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::http::header;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Settings;
use db::Database;
use services::dispatcher::Dispatcher;
use services::push_gateway::FcmClient;

pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub start_time: Instant,
    pub http_client: reqwest::Client,
    pub dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    let settings = Settings::from_env();
    init_tracing(&settings);

    tracing::info!(
        app = %settings.app_name,
        version = %settings.app_version,
        "Starting server"
    );

    // Connect to database
    let database = Database::connect(&settings)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    let migrations_dir = if std::path::Path::new("/app/migrations/sqlite").exists() {
        "/app/migrations/sqlite"
    } else {
        "./migrations/sqlite"
    };

    db::run_migrations(&database.pool, migrations_dir)
        .await
        .expect("Failed to run migrations");

    // Build shared HTTP client
    let http_client = reqwest::Client::new();

    // Build services
    let gateway = FcmClient::new(
        http_client.clone(),
        &settings.fcm_api_url,
        &settings.fcm_server_key,
        settings.fcm_timeout_seconds,
    );
    if settings.fcm_server_key.is_empty() {
        tracing::warn!("FCM server key not configured, deliveries will fail as transient");
    }

    let dispatcher = Dispatcher::new(database.pool.clone(), Arc::new(gateway));

    // Build app state
    let state = Arc::new(AppState {
        db: database,
        settings: settings.clone(),
        start_time: Instant::now(),
        http_client: http_client.clone(),
        dispatcher,
    });

    // Trigger sources register now but hold fire until the readiness signal,
    // set once after the startup delay. HTTP is reachable immediately.
    let (ready, gate) = triggers::ready_gate();
    if settings.triggers_enabled {
        triggers::spawn_triggers(state.clone(), gate);

        let delay = settings.startup_delay_seconds;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            tracing::info!(delay_seconds = delay, "Warm-up complete, triggers armed");
            ready.set_ready();
        });
    } else {
        tracing::info!("Trigger sources disabled by configuration");
    }

    // Build CORS layer
    let cors = build_cors(&settings);

    // Build router
    use axum::routing::{get, post};
    use routes::{health, notify, tokens};

    let app = Router::new()
        // Health / liveness
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/ping", get(health::ping))
        .route("/wake-up", get(health::wake_up))
        // Token lifecycle
        .route("/save-token", post(tokens::save_token))
        .route("/toggle-notification", post(tokens::toggle_notification))
        // Manual triggers
        .route("/send-namaz", get(notify::send_namaz))
        .route(
            "/send-hadith-notification",
            post(notify::send_hadith_notification),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", settings.host, settings.port);
    tracing::info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server error");
}

fn init_tracing(settings: &Settings) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_format == "json" {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }
}

fn build_cors(settings: &Settings) -> CorsLayer {
    let origins = settings.cors_origins_list();

    if origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        use axum::http::Method;
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
    }
}
