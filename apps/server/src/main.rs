//! UI Automation Server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

mod api;
mod config;
mod db;
mod entity;
mod error;
mod middleware;
mod migration;
mod models;
mod services;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::ApiDoc;
use crate::config::Config;
use crate::db::DbPool;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, AUTOMATION_DATABASE_URL must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  UI Automation Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Initialize database
    let pool = DbPool::new(&config)
        .await
        .expect("Failed to initialize database");

    // Run migrations for the tables this service owns
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");

    let bind_address = config.server.bind_address();
    let is_development = config.is_development();
    let allowed_origins = config.server.allowed_origins.clone();
    let server_workers = config.server.workers;
    let shared_config = config;

    let worker_count = if server_workers == 0 {
        num_cpus::get()
    } else {
        server_workers
    };

    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    let server = HttpServer::new(move || {
        // Development: allow the local frontend dev server.
        // Production: only allow origins listed in AUTOMATION_ALLOWED_ORIGINS;
        // an empty list means same-origin only.
        let allowed_methods = vec!["GET", "POST", "OPTIONS"];
        let allowed_headers = vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE];

        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(allowed_methods)
                .allowed_headers(allowed_headers)
                .max_age(3600)
        } else {
            let mut cors_builder = Cors::default()
                .allowed_methods(allowed_methods)
                .allowed_headers(allowed_headers)
                .max_age(3600);
            for origin in &allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
        };

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(shared_config.clone()))
            .service(
                web::scope("/api")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_automation_routes),
            );

        // Swagger UI is only available in development to avoid leaking the API schema
        if is_development {
            app = app.service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        app
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}
