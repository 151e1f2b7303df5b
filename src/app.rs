use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Build the full service. Every route also answers with a trailing slash.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_auth_routes())
        // Any authenticated user
        .merge(protected_routes(state.clone()))
        // Administrators only
        .merge(admin_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    NormalizePathLayer::trim_trailing_slash().layer(router.with_state(state))
}

fn public_auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{actuaciones, alertas, auth, cases, dashboard, notas};

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/dashboard", get(dashboard::dashboard))
        // Cases and their nested-record actions
        .route("/api/cases", get(cases::list).post(cases::create))
        .route(
            "/api/cases/:id",
            get(cases::get)
                .put(cases::replace)
                .patch(cases::update)
                .delete(cases::delete),
        )
        .route("/api/cases/:id/add_actuacion", post(cases::add_actuacion))
        .route("/api/cases/:id/add_alerta", post(cases::add_alerta))
        .route("/api/cases/:id/add_note", post(cases::add_note))
        // Actuaciones
        .route("/api/actuaciones", get(actuaciones::list).post(actuaciones::create))
        .route(
            "/api/actuaciones/:id",
            get(actuaciones::get)
                .put(actuaciones::replace)
                .patch(actuaciones::update)
                .delete(actuaciones::delete),
        )
        // Alertas
        .route("/api/alertas", get(alertas::list).post(alertas::create))
        .route(
            "/api/alertas/:id",
            get(alertas::get)
                .put(alertas::replace)
                .patch(alertas::update)
                .delete(alertas::delete),
        )
        .route("/api/alertas/:id/toggle_cumplida", post(alertas::toggle_cumplida))
        // Notas
        .route("/api/notas", get(notas::list).post(notas::create))
        .route(
            "/api/notas/:id",
            get(notas::get)
                .put(notas::replace)
                .patch(notas::update)
                .delete(notas::delete),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
        // Layers run outermost-last: authentication first, then the admin check
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Caseflow API",
            "version": version,
            "description": "Case management backend for law firms",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/refresh (public), /api/auth/me (protected)",
                "dashboard": "/api/dashboard (protected)",
                "cases": "/api/cases[/:id[/add_actuacion|add_alerta|add_note]] (protected)",
                "actuaciones": "/api/actuaciones[/:id] (protected)",
                "alertas": "/api/alertas[/:id[/toggle_cumplida]] (protected)",
                "notas": "/api/notas[/:id] (protected)",
                "users": "/api/users[/:id] (administrators)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
