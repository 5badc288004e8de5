//! Current-user handlers

use axum::{extract::State, Extension, Json};

use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::error::ApiResult;
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::auth::UserInfo;
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserInfo>),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> ApiResult<Json<ApiResponse<UserInfo>>> {
    let user = state.identity.current_user(caller.user_id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}
