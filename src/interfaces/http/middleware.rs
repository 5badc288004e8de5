//! Authentication, deadline, panic recovery and response-header middleware
//! for Axum

use std::any::Any;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use super::error::ApiError;
use super::router::AppState;
use crate::domain::{TokenClaims, UserRole};

/// Caller identity recovered from a valid access token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Bearer access-token middleware. Refresh tokens are refused.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return ApiError::unauthorized("Missing authentication token").into_response();
    };

    let Some(token) = extract_token(&auth_header) else {
        return ApiError::unauthorized("Invalid authentication token").into_response();
    };

    match state.identity.validate_access(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from_claims(claims));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Abort requests that outlive the configured deadline.
///
/// The handler future is dropped on expiry, which rolls back any open
/// transaction it holds.
pub async fn request_deadline(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    match tokio::time::timeout(state.request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(
                %method,
                path = %uri,
                timeout_ms = state.request_timeout.as_millis() as u64,
                "Request deadline exceeded"
            );
            ApiError::timeout().into_response()
        }
    }
}

/// Panic handler for `CatchPanicLayer`: log the payload and answer with
/// the standard `INTERNAL_ERROR` envelope.
pub fn recover_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else {
        "non-string panic payload"
    };
    error!(panic = detail, "Handler panicked");

    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An unexpected error occurred",
    )
    .into_response()
}

/// Content-Security-Policy for API responses.
pub const DEFAULT_CSP: &str = "default-src 'self'";

/// Baseline hardening headers on every response.
///
/// Swagger UI under `/docs` relies on inline styles, so it gets no CSP.
/// Responses that already carry a CSP keep it.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let is_docs = request.uri().path().starts_with("/docs");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    if !is_docs && !headers.contains_key(header::CONTENT_SECURITY_POLICY) {
        headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(DEFAULT_CSP));
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    async fn get_path(router: Router, path: &str) -> Response {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap()
    }

    #[test]
    fn extracts_bearer_tokens_only() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("Bearer    "), None);
        assert_eq!(extract_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_token("abc.def.ghi"), None);
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error_envelope() {
        async fn explode() -> &'static str {
            panic!("handler blew up")
        }
        let router = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(recover_panic));

        let response = get_path(router, "/explode").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("blew up"));
    }

    #[tokio::test]
    async fn hardening_headers_spare_docs_and_existing_policies() {
        async fn own_policy() -> Response {
            (
                [(header::CONTENT_SECURITY_POLICY, "default-src 'none'")],
                "page",
            )
                .into_response()
        }
        let router = Router::new()
            .route("/api", get(|| async { "api" }))
            .route("/docs/", get(|| async { "docs" }))
            .route("/page", get(own_policy))
            .layer(axum::middleware::from_fn(security_headers));

        let api = get_path(router.clone(), "/api").await;
        assert_eq!(api.headers()[header::CONTENT_SECURITY_POLICY], DEFAULT_CSP);
        assert_eq!(api.headers()[header::X_XSS_PROTECTION], "1; mode=block");

        let docs = get_path(router.clone(), "/docs/").await;
        assert!(docs.headers().get(header::CONTENT_SECURITY_POLICY).is_none());
        assert_eq!(docs.headers()[header::X_FRAME_OPTIONS], "DENY");

        let page = get_path(router, "/page").await;
        assert_eq!(page.headers()[header::CONTENT_SECURITY_POLICY], "default-src 'none'");
    }
}
