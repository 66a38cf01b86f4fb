#[cfg(feature = "server")]
use std::sync::Arc;

#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_multipart::form::MultipartFormConfig;
#[cfg(feature = "server")]
use actix_web::error::InternalError;
#[cfg(feature = "server")]
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
#[cfg(feature = "server")]
use tera::Tera;

#[cfg(feature = "server")]
use crate::analysis::{AnalyzerRegistry, LlmAnalyzer, OllamaClient};
#[cfg(feature = "server")]
use crate::db::establish_connection_pool;
#[cfg(feature = "server")]
use crate::dto::api::ErrorResponse;
#[cfg(feature = "server")]
use crate::models::config::ServerConfig;
#[cfg(feature = "server")]
use crate::repository::DieselRepository;
#[cfg(feature = "server")]
use crate::services::bot_detection::BotDetector;

#[cfg(feature = "server")]
pub mod analysis;
pub mod db;
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
pub mod models;
#[cfg(feature = "server")]
pub mod pagination;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod schema;
#[cfg(feature = "server")]
pub mod services;

/// Slack added on top of the largest file limit for the other multipart fields.
#[cfg(feature = "server")]
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Registers every route of the application.
#[cfg(feature = "server")]
pub fn configure(cfg: &mut web::ServiceConfig) {
    use crate::routes::{api, campaigns, notifications, tracking};

    cfg.service(api::tool_router)
        .service(tracking::track_open)
        .service(tracking::track_click)
        .service(
            web::scope("/api")
                .service(api::list_scans)
                .service(campaigns::create_campaign)
                .service(campaigns::list_campaigns)
                .service(campaigns::show_campaign)
                .service(campaigns::add_recipients)
                .service(campaigns::upload_recipients)
                .service(campaigns::launch_campaign)
                .service(campaigns::complete_campaign)
                .service(campaigns::recount_campaign)
                .service(notifications::list_notifications)
                .service(notifications::mark_all_read)
                .service(notifications::mark_read),
        );
}

/// Answers malformed JSON bodies and query strings with the JSON error envelope.
#[cfg(feature = "server")]
pub fn json_error_config() -> (web::JsonConfig, web::QueryConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        InternalError::from_response(err, response).into()
    });
    let query = web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        InternalError::from_response(err, response).into()
    });
    (json, query)
}

/// `APP_`-prefixed environment overrides; `APP_BOT_IP_RANGES` is a comma-separated list.
#[cfg(feature = "server")]
pub fn environment_source() -> config::Environment {
    config::Environment::with_prefix("APP")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("bot_ip_ranges")
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    // Establish Diesel connection pool for the SQLite database.
    let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
        std::io::Error::other(format!("Failed to establish database connection: {e}"))
    })?;

    let repo = DieselRepository::new(pool);

    let ollama = OllamaClient::from_config(&server_config)
        .map_err(|e| std::io::Error::other(format!("Failed to build Ollama client: {e}")))?;
    let registry = AnalyzerRegistry::new().with_default(Arc::new(LlmAnalyzer::new(ollama)));

    let detector = BotDetector::from_config(&server_config);

    let tera = Tera::new(&server_config.templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

    let multipart_limit = server_config.max_upload_size() + MULTIPART_OVERHEAD;
    let bind_address = (server_config.address.clone(), server_config.port);

    log::info!(
        "Starting Petawall on {}:{}",
        server_config.address,
        server_config.port
    );

    HttpServer::new(move || {
        let (json_config, query_config) = json_error_config();

        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(configure)
            .app_data(json_config)
            .app_data(query_config)
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(multipart_limit)
                    .memory_limit(MULTIPART_OVERHEAD),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(detector.clone()))
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
