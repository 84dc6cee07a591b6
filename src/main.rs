use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use sgp_procurement_api::database::manager::DatabaseManager;
use sgp_procurement_api::{config, handlers, middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting SGP procurement API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("SGP_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 SGP procurement API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let config = config::config();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health-check", get(health_check))
        // Public auth routes (token acquisition)
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        // Everything else requires a valid bearer token
        .merge(protected_routes())
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

fn protected_routes() -> Router {
    use axum::routing::get;
    use handlers::{auth, dashboard, requests, summary, venues};

    Router::new()
        .route("/auth/whoami", get(auth::whoami))
        .route("/dashboard", get(dashboard::index))
        // Venues (mutations are superadmin-only, enforced in the service)
        .route("/venues", get(venues::index).post(venues::store))
        .route(
            "/venues/:id",
            get(venues::show).put(venues::update).delete(venues::destroy),
        )
        .route("/venues/:id/edit", get(venues::edit))
        // Procurement requests (scoped per principal)
        .route(
            "/procurement-requests",
            get(requests::index).post(requests::store),
        )
        .route(
            "/procurement-requests/:id",
            get(requests::show)
                .put(requests::update)
                .delete(requests::destroy),
        )
        .route("/procurement-requests/:id/edit", get(requests::edit))
        // Form-data alias for the request-creation page
        .route("/tambah-barang", get(requests::create_form))
        // Summary
        .route("/ringkasan", get(summary::index))
        .layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "SGP Procurement API",
            "version": version,
            "description": "Venue procurement request tracking API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/register (public - token acquisition)",
                "whoami": "/auth/whoami (protected)",
                "dashboard": "/dashboard (protected)",
                "venues": "/venues[/:id] (protected; mutations require superadmin)",
                "procurement_requests": "/procurement-requests[/:id] (protected)",
                "request_form": "/tambah-barang (protected)",
                "summary": "/ringkasan (protected)",
            }
        }
    }))
}

async fn health_check() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
