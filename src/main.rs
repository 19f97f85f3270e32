use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use medtrack_api::config;
use medtrack_api::database::manager::DatabaseManager;
use medtrack_api::handlers::{protected, public};
use medtrack_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting medtrack API in {:?} mode", config.environment);

    let app = app();

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("medtrack API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(cors_layer());

    if config::config().server.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn api_routes() -> Router {
    use protected::{
        appointments, auth, caregivers, intake_events, medications, patients, permissions,
        subscriptions, treatments,
    };

    Router::new()
        // Session
        .route("/api/auth/me", get(auth::me))
        // Patient profile
        .route("/api/patients/me", get(patients::get_me).put(patients::put_me))
        // Caregiver onboarding and profile
        .route("/api/caregivers/invite", post(caregivers::invite))
        .route("/api/caregivers/join", post(caregivers::join))
        .route("/api/caregivers/patients", get(caregivers::patients))
        .route("/api/caregivers/me", get(caregivers::get_me).put(caregivers::put_me))
        // Permission grants
        .route("/api/permissions/by-patient/:patient_profile_id", get(permissions::by_patient))
        .route("/api/permissions/:id", patch(permissions::patch))
        // Patient-scoped resources
        .route("/api/medications", get(medications::list).post(medications::create))
        .route(
            "/api/medications/:id",
            patch(medications::patch).delete(medications::delete),
        )
        .route("/api/treatments", get(treatments::list).post(treatments::create))
        .route("/api/treatments/:id", patch(treatments::patch).delete(treatments::delete))
        .route("/api/appointments", get(appointments::list).post(appointments::create))
        .route(
            "/api/appointments/:id",
            patch(appointments::patch).delete(appointments::delete),
        )
        .route(
            "/api/intake-events",
            get(intake_events::list).post(intake_events::create),
        )
        // Push notifications
        .route(
            "/api/subscribe",
            post(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    if origins.is_empty() {
        // Native apps send no Origin header; an empty allowlist means open CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> =
            origins.iter().filter_map(|origin| origin.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    }
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "medtrack API",
            "version": version,
            "description": "Medication-adherence tracker backend (Axum + SQLx)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "session": "/api/auth/me (protected)",
                "patients": "/api/patients/me (protected)",
                "caregivers": "/api/caregivers/* (protected)",
                "permissions": "/api/permissions/* (protected)",
                "medications": "/api/medications[/:id] (protected)",
                "treatments": "/api/treatments[/:id] (protected)",
                "appointments": "/api/appointments[/:id] (protected)",
                "intake_events": "/api/intake-events (protected)",
                "subscribe": "/api/subscribe (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
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
