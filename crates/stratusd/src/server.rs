//! Router assembly and CORS policy

use crate::handler;
use crate::state::AppState;
use axum::Router;
use axum::http::{HeaderName, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

/// Build the daemon router.
///
/// The API is consumed from browser frontends, so every route sits behind a
/// permissive CORS layer that also admits the custom headers those clients
/// attach.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/provision-resource", post(handler::provision_resource))
        .route("/test-connectivity", post(handler::test_connectivity))
        .route("/health", get(handler::health))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}
