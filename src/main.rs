use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use customer_support_server::{configure_routes, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn build_cors(config: &Settings) -> Cors {
    let cors = match config.cors.origins() {
        None => Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
        Some(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
    };
    cors.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded ({} environment)", config.environment);
    if !config.auth.required {
        warn!("auth.required is false; every endpoint is open");
    }

    // Initialize application state
    let state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state")?;
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    let server_state = state.clone();
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&server_config))
            .app_data(server_state.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await?;

    state.shutdown().await?;
    info!("Server stopped");
    Ok(())
}
