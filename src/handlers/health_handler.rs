use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::{
    app_state::AppState,
    errors::ErrorResponse,
    models::{
        domain::session::format_timestamp,
        dto::response::{HealthResponse, Success},
    },
};

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(Success::new(HealthResponse {
        message: format!("AstroQuiz API v{} is running", env!("CARGO_PKG_VERSION")),
        timestamp: format_timestamp(Utc::now()),
        environment: state.config.environment.clone(),
    }))
}

/// Readiness probe: succeeds only while the tabular store answers.
pub async fn health_check_ready(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(Success::new(HealthResponse {
            message: "ready".to_string(),
            timestamp: format_timestamp(Utc::now()),
            environment: state.config.environment.clone(),
        })),
        Err(err) => {
            log::warn!("Readiness check failed: {}", err);
            HttpResponse::ServiceUnavailable().json(ErrorResponse::from(&err))
        }
    }
}
