//! Application router configuration.

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState, AssistantResponse, Error, endpoints,
    health::{get_health, get_service_status},
    logging::{MAX_BODY_SIZE, logging_middleware},
};

/// Return a router with all the app's routes.
///
/// Every response carries the CORS headers and any `OPTIONS` request is
/// answered as a preflight request.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_service_status))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::ASSISTANT, post(post_assistant))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .with_state(state)
}

/// Allow any origin to POST JSON to the API.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::POST, Method::OPTIONS])
}

/// Turn the sentence in the request body into a command object.
///
/// The body is read as raw bytes so that clients which do not set a JSON
/// content type are treated the same as those that do. A body that cannot be
/// read, e.g. one over [MAX_BODY_SIZE] bytes, gets the usual JSON error.
async fn post_assistant(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AssistantResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return Error::InvalidRequestBody(rejection.body_text()).into(),
    };

    let cancel = state.shutdown.child_token();
    // Cancels the upstream call if the client goes away and this future is dropped.
    let _guard = cancel.clone().drop_guard();

    state.assistant.respond(&body, &cancel).await
}
