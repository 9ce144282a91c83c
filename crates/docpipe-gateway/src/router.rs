use axum::Router;
use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tower_http::limit::RequestBodyLimitLayer;

use docpipe_llm::provider::LlmProvider;
use docpipe_ocr::backend::OcrBackend;

use super::handlers::{extract_handler, method_not_allowed};
use super::server::AppState;

pub(crate) fn build_router<B, P>(state: AppState<B, P>, max_body_size: usize) -> Router
where
    B: OcrBackend + 'static,
    P: LlmProvider + 'static,
{
    Router::new()
        .route(
            "/",
            post(extract_handler::<B, P>).fallback(method_not_allowed),
        )
        .fallback(method_not_allowed)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

/// Fixed CORS policy on every response; bare `OPTIONS` short-circuits to 204
/// before routing, for any path.
async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}
