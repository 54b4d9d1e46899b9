use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Fallback for routes that only accept some methods
pub async fn method_not_allowed_handler(method: Method) -> Response {
    tracing::debug!("Rejecting {} request", method);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Method not allowed",
    )
        .into_response()
}
