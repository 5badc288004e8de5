//! API Router with Swagger UI

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, MessageResponse};
use super::middleware::{auth_middleware, recover_panic, request_deadline, security_headers};
use super::modules::request_id::request_id_middleware;
use super::modules::{auth, health, users};
use crate::application::IdentityServices;
use crate::domain::TokenPair;
use crate::infrastructure::{SeaOrmCredentialStore, SeaOrmUserStore};

/// Identity services over the SeaORM stores
pub type Identity = IdentityServices<SeaOrmUserStore, SeaOrmCredentialStore>;

/// State shared by every route
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<Identity>,
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(identity: Arc<Identity>, request_timeout: Duration) -> Self {
        Self {
            identity,
            request_timeout,
            started_at: Instant::now(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh,
        auth::forgot_password,
        auth::reset_password,
        auth::reset_password_page,
        auth::submit_reset_form,
        users::get_current_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            MessageResponse,
            TokenPair,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::ResetPasswordForm,
            auth::UserInfo,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service and database health"),
        (
            name = "Authentication",
            description = "Registration, login, token refresh and password reset"
        ),
        (name = "Users", description = "The authenticated caller"),
    ),
    info(
        title = "Identity Service API",
        version = "1.0.0",
        description = "Registration, JWT authentication and password reset",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/forgot-password", post(auth::forgot_password))
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/reset-password/form", post(auth::submit_reset_form));

    // User routes (protected)
    let user_routes = Router::new()
        .route("/me", get(users::get_current_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), request_deadline))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(recover_panic))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
