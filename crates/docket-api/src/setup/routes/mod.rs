//! Route configuration and setup.
//!
//! Domain route groups live in [domains](domains); the health handler in
//! `handlers::health`.

mod domains;

use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use docket_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on files per upload request when sizing the body limit
const MAX_FILES_PER_REQUEST: usize = 10;

const MIN_MASTER_KEY_LEN: usize = 32;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = setup_auth_middleware(&state)?;

    let public_routes = public_routes();
    let protected_routes = protected_routes(state.clone()).layer(
        axum::middleware::from_fn_with_state(Arc::new(auth_state), auth_middleware),
    );

    let body_limit = config
        .max_upload_size_bytes()
        .saturating_mul(MAX_FILES_PER_REQUEST);

    let app = public_routes
        .merge(protected_routes)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn setup_auth_middleware(state: &Arc<AppState>) -> Result<AuthState, anyhow::Error> {
    let master_api_key = std::env::var("MASTER_API_KEY")
        .map_err(|_| anyhow::anyhow!("MASTER_API_KEY environment variable not set"))?;

    if master_api_key.len() < MIN_MASTER_KEY_LEN {
        return Err(anyhow::anyhow!(
            "MASTER_API_KEY must be at least {} characters long",
            MIN_MASTER_KEY_LEN
        ));
    }

    Ok(AuthState {
        master_api_key,
        api_key_repository: state.db.api_key_repository.clone(),
    })
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(domains::file_routes(state.clone()))
        .merge(domains::account_routes(state.clone()))
        .merge(domains::partner_routes(state.clone()))
        .merge(domains::corporation_routes(state.clone()))
        .merge(domains::user_routes(state.clone()))
        .merge(domains::task_routes(state.clone()))
        .with_state(state)
}
