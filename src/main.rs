use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use bank_ledger_api::infrastructure::config::AppConfig;
use bank_ledger_api::infrastructure::database;
use bank_ledger_api::infrastructure::logging::init_logging;
use bank_ledger_api::presentation::handlers::AppState;
use bank_ledger_api::presentation::middleware::{
    JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware,
};
use bank_ledger_api::presentation::routes;
use tracing::{info, instrument, warn};

fn cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    init_logging(&config.log_level);
    info!("Logging initialized successfully");
    if config.uses_development_secret() {
        warn!("JWT_SECRET is not set, using the development secret");
    }

    info!(database_url = %config.database_url, "Connecting to database");
    let pool = database::connect(&config.database_url, config.database_max_connections).await?;
    database::migrate(&pool).await?;

    info!("Initializing application state");
    let state = web::Data::new(AppState::new(
        pool,
        config.jwt_secret.clone(),
        config.jwt_ttl_secs,
    ));
    info!("Application state initialized");

    if config.cors_allowed_origin.is_none() {
        warn!("CORS_ALLOWED_ORIGIN is not set, allowing any origin");
    }

    let jwt_secret = config.jwt_secret.clone();
    let allowed_origin = config.cors_allowed_origin.clone();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(cors(allowed_origin.as_deref()))
            .configure(routes::configure)
    });

    info!(address = %config.bind_addr, "Binding server to address");
    let server = server.bind(config.bind_addr.as_str())?;
    info!(address = %config.bind_addr, scope = "/api", "Starting HTTP server");

    server.run().await?;
    Ok(())
}
