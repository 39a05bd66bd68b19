//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, request tracing, caller
//! authentication, and all endpoint handlers.

use std::future::Future;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use triploom_core::config::TriploomConfig;
use triploom_core::TriploomError;

use crate::auth::{require_user, TEST_USER_HEADER};
use crate::handlers;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static(TEST_USER_HEADER),
        ])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    // The messages route reuses `{id}` so both conversation paths share one
    // parameter name in the route tree.
    let v1 = Router::new()
        .route("/ai/chat", post(handlers::chat))
        .route("/ai/planner/chat", post(handlers::planner_chat))
        .route("/ai/conversations/{id}", get(handlers::list_conversations))
        .route(
            "/ai/conversations/{id}/messages",
            get(handlers::list_messages),
        )
        .route("/ai/context/refresh", post(handlers::refresh_context))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API on the configured host and port until `shutdown` resolves.
pub async fn start_server<F>(
    config: &TriploomConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), TriploomError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TriploomError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Starting API server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TriploomError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
