use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

use super::AppState;
use crate::services::AuthUser;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// GET /api/metrics
/// Prometheus text exposition; administrators only
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Opens the per-request span. The caller fields start empty and are filled
/// by [`record_caller`] once the token has been resolved. A client-supplied
/// `x-request-id` is reused, otherwise one is generated; either way it is
/// echoed on the response.
pub async fn request_span_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 64)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        user_id = tracing::field::Empty,
        role = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;

        let status = response.status().as_u16();
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            event = "http_request_finished",
            status_code = status,
            duration_ms,
            "Request finished"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Attaches the resolved caller to the current request span.
pub fn record_caller(user: &AuthUser) {
    let span = Span::current();
    span.record("user_id", user.id.value());
    span.record("role", user.role.as_str());
}

/// Metric label for the caller's role.
fn role_label(user: Option<&AuthUser>) -> &'static str {
    user.map_or("anonymous", |u| u.role.as_str())
}

/// Request counter and latency histogram, labelled by route template and
/// caller role. Installed as a route layer so the matched path is known
/// and the caller has already been identified.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |mp| mp.as_str().to_string());
    let role = role_label(req.extensions().get::<AuthUser>());

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("route", route),
        ("status", response.status().as_u16().to_string()),
        ("role", role.to_string()),
    ];

    metrics::counter!("rateboard_http_requests_total", &labels).increment(1);
    metrics::histogram!("rateboard_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    response
}

/// JSON-only API: nothing may be framed or sniffed, and responses carrying
/// tokens or account data must not be cached.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(request_span_middleware))
    }

    #[tokio::test]
    async fn request_id_is_generated_and_echoed() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(REQUEST_ID_HEADER, "client-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-42");
    }

    #[test]
    fn role_labels_are_bounded() {
        assert_eq!(role_label(None), "anonymous");

        let owner = AuthUser {
            id: UserId::new(3),
            email: "owner@example.com".to_string(),
            role: Role::StoreOwner,
        };
        assert_eq!(role_label(Some(&owner)), "Store Owner");
    }
}
