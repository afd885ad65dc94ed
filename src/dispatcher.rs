use std::any::Any;

use axum::Router;
use axum::body::Body;
use axum::extract::{Extension, Request};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::ServiceContext;
use crate::error::ApiError;
use crate::handlers::{health, not_found, random_sample, runtime_info, welcome};

/// Largest request body accepted by the JSON body parser.
pub const JSON_BODY_LIMIT: usize = 100 * 1024;

/// Fixed routing table. Unknown paths, and known paths hit with anything but
/// `GET`/`HEAD`, fall through to the 404 handler.
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/", get(welcome).fallback(not_found))
        .route("/api/info", get(runtime_info).fallback(not_found))
        .route("/api/random", get(random_sample).fallback(not_found))
        .fallback(not_found)
}

/// Builds the complete application: routes, error translation, CORS and tracing.
pub fn app(context: ServiceContext) -> Router {
    with_middleware(routes(), context)
}

fn with_middleware(router: Router, context: ServiceContext) -> Router {
    router
        .layer(middleware::from_fn(parse_json_body))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(Extension(context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Buffers and validates JSON request bodies. The parsed value is discarded;
/// the handlers only see the original bytes again.
async fn parse_json_body(request: Request, next: Next) -> Result<Response, ApiError> {
    if !is_json(&request) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, JSON_BODY_LIMIT)
        .await
        .map_err(|err| ApiError::internal(format!("failed to read request body: {err}")))?;

    if !bytes.is_empty() {
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .map_err(|err| ApiError::internal(format!("invalid JSON body: {err}")))?;
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        "handler panicked".to_owned()
    };

    ApiError::internal(message).into_response()
}
