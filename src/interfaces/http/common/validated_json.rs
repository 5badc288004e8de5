//! JSON extractor that also runs `validator` rules
//!
//! Malformed bodies are rejected with 400 `INVALID_REQUEST`; bodies that
//! parse but break a field rule get 422 `VALIDATION_ERROR` naming every
//! offending field, sorted by field name.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::interfaces::http::error::ApiError;

/// Drop-in for `axum::Json<T>` on request bodies that derive `Validate`.
///
/// ```ignore
/// async fn forgot_password(ValidatedJson(body): ValidatedJson<ForgotPasswordRequest>) {
///     // `body.email` is syntactically valid here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                format!("Invalid request body: {}", rejection.body_text()),
            )
        })?;

        value.validate().map_err(|errors| {
            ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                describe(&errors),
            )
        })?;

        Ok(Self(value))
    }
}

/// `field: message; field: message`, one entry per broken rule.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Credentials {
        #[validate(email(message = "invalid email"))]
        email: String,
        #[validate(length(min = 1, message = "password is required"))]
        password: String,
    }

    async fn echo(ValidatedJson(body): ValidatedJson<Credentials>) -> String {
        body.email
    }

    async fn post_raw(body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let response = Router::new()
            .route("/login", post(echo))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn passes_valid_bodies_through() {
        let body = json!({"email": "a@b.com", "password": "x"}).to_string();
        let (status, body) = post_raw(body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"a@b.com");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (status, body) = post_raw("{\"email\": ").await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn broken_rules_are_listed_in_field_order() {
        let (status, body) = post_raw(json!({"email": "nope", "password": ""}).to_string()).await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"],
            "email: invalid email; password: password is required"
        );
    }
}
