//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// The largest request body the server reads, in bytes.
pub const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// The request line is logged at the `info` level and its body, which holds
/// the user's own words, only at the `debug` level. The response is logged
/// at the `info` level; if its body is longer than [LOG_BODY_LENGTH_LIMIT]
/// bytes it is truncated and the full body is logged at the `debug` level.
///
/// Request bodies over [MAX_BODY_SIZE] bytes are rejected without being
/// buffered in full.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::info!("{}", request_summary(&parts, None));
            return Error::InvalidRequestBody(error.to_string()).into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);
    log_request(&parts, &body_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::Internal(format!("could not read the response body: {error}"))
                .into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Cut `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(body: &str) -> Option<&str> {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return None;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    Some(&body[..end])
}

fn request_summary(parts: &axum::http::request::Parts, body_length: Option<usize>) -> String {
    let (method, uri) = (&parts.method, &parts.uri);

    match body_length {
        Some(length) => format!("Received request: {method} {uri} ({length} bytes)"),
        None => format!("Received request: {method} {uri} (unreadable body)"),
    }
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    tracing::info!("{}", request_summary(parts, Some(body.len())));
    tracing::debug!("Request body: {body:?}");
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    let status = parts.status;

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {status}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {status}\nbody: {body:?}"),
    }
}
