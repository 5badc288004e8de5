//! Authentication API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Form, Json,
};

use super::dto::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest,
    ResetPasswordForm, ResetPasswordQuery, ResetPasswordRequest, UserInfo,
};
use super::page;
use crate::domain::{DomainError, TokenPair};
use crate::interfaces::http::common::{ApiResponse, MessageResponse, ValidatedJson};
use crate::interfaces::http::error::{ApiError, ApiResult};
use crate::interfaces::http::router::AppState;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists with this email, a password reset link has been sent";

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserInfo>),
        (status = 400, description = "Invalid email, name or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserInfo>>)> {
    let user = state
        .identity
        .register(&request.email, &request.full_name, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let outcome = state.identity.login(&request.email, &request.password).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        tokens: outcome.tokens,
        user: outcome.user.into(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = ApiResponse<TokenPair>),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenPair>>> {
    let tokens = state
        .identity
        .refresh(&request.refresh_token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;

    Ok(Json(ApiResponse::success(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = ApiResponse<MessageResponse>)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Json<ApiResponse<MessageResponse>> {
    // The outcome is logged by the flow; the response never reveals it.
    let _ = state.identity.request_password_reset(&request.email).await;

    Json(ApiResponse::success(MessageResponse::new(
        FORGOT_PASSWORD_MESSAGE,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid, expired or used token, or weak password")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state
        .identity
        .complete_password_reset(&request.token, &request.new_password)
        .await
        .map_err(ApiError::from_reset)?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password has been reset successfully",
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/reset-password",
    tag = "Authentication",
    params(ResetPasswordQuery),
    responses(
        (
            status = 200,
            description = "HTML form for choosing a new password",
            body = String,
            content_type = "text/html"
        ),
        (status = 400, description = "Missing or malformed token")
    )
)]
pub async fn reset_password_page(
    Query(query): Query<ResetPasswordQuery>,
) -> ApiResult<Response> {
    let token = query.token.trim();
    if token.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "MISSING_TOKEN",
            "Token is required in URL",
        ));
    }
    if !page::is_token_shaped(token) {
        return Err(ApiError::from_reset(DomainError::InvalidToken));
    }

    Ok(page::reset_form(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password/form",
    tag = "Authentication",
    request_body(content = ResetPasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (
            status = 200,
            description = "Password replaced",
            body = String,
            content_type = "text/html"
        ),
        (
            status = 400,
            description = "Invalid, expired or used token, or weak password",
            body = String,
            content_type = "text/html"
        )
    )
)]
pub async fn submit_reset_form(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let outcome = state
        .identity
        .complete_password_reset(form.token.trim(), &form.new_password)
        .await
        .map_err(ApiError::from_reset);

    match outcome {
        Ok(()) => page::reset_done(),
        Err(err) => page::reset_failed(err.status(), err.message()),
    }
}
