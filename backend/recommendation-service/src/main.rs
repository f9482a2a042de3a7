use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;

use recommendation_service::config::Config;
use recommendation_service::handlers::{self, RecommendationHandlerState};
use recommendation_service::services::{load_movielens, RecommendationEngine};
use recommendation_service::utils::init_tracing;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {:#}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&config.log_filter(), config.app.log_json);

    tracing::info!(
        "Starting recommendation-service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Environment: {}", config.app.env);

    // Load the dataset snapshot shared by every worker
    let dataset = match load_movielens(&config.dataset.directory) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            tracing::error!("Failed to load dataset: {}", e);
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    };

    let rec_handler_state = web::Data::new(RecommendationHandlerState {
        dataset,
        engine: RecommendationEngine::new(config.recommendation.hybrid_weights),
        default_limit: config.recommendation.default_limit,
        max_limit: config.recommendation.max_limit,
    });

    tracing::info!(
        port = config.app.port,
        weights = ?config.recommendation.hybrid_weights,
        "HTTP server listening"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(handlers::security_headers())
            .app_data(rec_handler_state.clone())
            .configure(handlers::configure)
    })
    .bind(format!("0.0.0.0:{}", config.app.port))?
    .run()
    .await
}
