//! Reusable identity server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: config validation, database
//! init and migrations, wiring of the identity flows, the REST API and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{IdentityServices, ResetSettings};
use crate::auth::{PasswordHasher, TokenService};
use crate::config::{AppConfig, EmailProvider};
use crate::domain::EmailSender;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    init_database, LogEmailSender, ResendEmailSender, SeaOrmCredentialStore, SeaOrmUserStore,
};
use crate::interfaces::http::{create_api_router, AppState};
use crate::support::shutdown::ShutdownCoordinator;
use crate::support::time::SystemClock;

/// Options for starting the identity server.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running identity server.
///
/// ```rust,no_run
/// use identity_core::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting identity service...");

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Identity services ──────────────────────────────────
        let security = &app_cfg.security;
        let tokens = TokenService::new(
            &security.jwt_secret,
            &security.jwt_issuer,
            chrono::Duration::minutes(security.access_token_ttl_minutes),
            chrono::Duration::days(security.refresh_token_ttl_days),
        );
        info!(
            issuer = %security.jwt_issuer,
            access_ttl_minutes = security.access_token_ttl_minutes,
            refresh_ttl_days = security.refresh_token_ttl_days,
            "JWT configured"
        );

        let email = build_email_sender(&app_cfg)?;
        let reset = ResetSettings {
            token_ttl: chrono::Duration::minutes(app_cfg.password_reset.token_ttl_minutes),
        };

        let identity = IdentityServices::new(
            db.clone(),
            SeaOrmUserStore::new(),
            SeaOrmCredentialStore::new(),
            PasswordHasher::with_cost(security.bcrypt_cost),
            tokens,
            email,
            reset,
            Arc::new(SystemClock),
        );

        let state = AppState::new(
            Arc::new(identity),
            Duration::from_secs(app_cfg.server.request_timeout_secs),
        );

        // ── REST API server ────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();

        let api_addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_server = axum::serve(
            listener,
            create_api_router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the shutdown trigger, drain in-flight requests within the
    /// configured timeout and close the pool.
    pub async fn wait(self) {
        let api_task = self.api_task;
        let abort = api_task.abort_handle();

        let drained = self
            .shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
            })
            .await;
        if !drained {
            abort.abort();
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }

        info!("Identity service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down identity service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

fn build_email_sender(
    config: &AppConfig,
) -> Result<Arc<dyn EmailSender>, Box<dyn std::error::Error>> {
    match config.email.provider {
        EmailProvider::Log => {
            warn!("Email provider is 'log': reset emails will not be delivered");
            Ok(Arc::new(LogEmailSender))
        }
        EmailProvider::Resend => {
            let api_key = config
                .email
                .resend_api_key
                .clone()
                .ok_or("email.provider = \"resend\" requires RESEND_API_KEY")?;
            let sender = ResendEmailSender::new(
                api_key,
                config.email.from.clone(),
                config.password_reset.app_base_url.clone(),
                config.password_reset.token_ttl_minutes,
            )?;
            info!(from = %config.email.from, "Resend email provider configured");
            Ok(Arc::new(sender))
        }
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
