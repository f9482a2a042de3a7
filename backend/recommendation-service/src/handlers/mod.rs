pub mod recommendations;

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

use crate::error::AppError;

// Re-export handlers for convenience
pub use recommendations::{
    post_recommendations, KeywordResponse, RankedResponse, RecommendationBody,
    RecommendationHandlerState, RecommendationResponse, RecommendedItem,
};

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self' data:; connect-src 'self';";

/// Response headers attached to every response
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY))
}

/// Register every route; the caller provides `RecommendationHandlerState` as app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(|| async { "OK" }))
    .service(post_recommendations);
}
