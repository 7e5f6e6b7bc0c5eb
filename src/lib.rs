pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AccessPolicy, Actor, AuthService, CurrentActor, Role, TokenService};
pub use db::{DbOperations, Message, Ticket, User, UserPublic};

/// Health check endpoint handler
/// Returns a fixed JSON payload for readiness probes
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Healthy"
    }))
}

fn extractor_error(err: impl std::fmt::Display) -> actix_web::Error {
    AppError::validation(err.to_string()).into()
}

/// Registers every route the server exposes.
///
/// Body, form, query and path extraction failures are reported as validation
/// errors in the usual error payload.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::FormConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| extractor_error(err)))
        .route("/", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::handlers::register))
                .route("/login", web::post().to(auth::handlers::login))
                .route("/me", web::get().to(auth::handlers::me)),
        )
        .service(
            web::resource("/tickets")
                .route(web::post().to(api::tickets::create_ticket))
                .route(web::get().to(api::tickets::list_tickets)),
        )
        .service(
            web::resource("/tickets/{ticket_id}")
                .route(web::get().to(api::tickets::get_ticket))
                .route(web::put().to(api::tickets::update_ticket)),
        )
        .route("/messages", web::post().to(api::messages::post_message))
        .route(
            "/messages/ticket/{ticket_id}",
            web::get().to(api::messages::list_messages),
        )
        .route("/users", web::get().to(api::users::list_users))
        .service(
            web::resource("/users/{user_id}")
                .route(web::get().to(api::users::get_user))
                .route(web::put().to(api::users::update_user)),
        );
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Validates the configuration, opens the database, applies migrations and
    /// builds the auth service. Any failure here is fatal for the server.
    pub async fn new(config: Settings) -> Result<Self> {
        config.validate()?;

        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;
        db.migrate().await?;
        info!("Database ready at {}", config.database.url);

        let auth = AuthService::new(db.clone(), &config.auth).await?;

        Ok(Self {
            config: Arc::new(config),
            db,
            auth: Arc::new(auth),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db.close().await;
        Ok(())
    }
}
