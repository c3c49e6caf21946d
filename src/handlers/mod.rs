pub mod health_handler;
pub mod quiz_handler;

use actix_web::{web, HttpResponse};

use crate::errors::AppError;

pub use health_handler::{health_check, health_check_ready};
pub use quiz_handler::{
    abandon_session, complete_session, get_questions, get_score_distribution, record_answer,
    start_session,
};

/// Registers every API route. Each path answers unsupported methods with a 405 envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/questions")
                .route(web::get().to(get_questions))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/sessions")
                .route(web::post().to(start_session))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/sessions/{id}/answers")
                .route(web::post().to(record_answer))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/sessions/{id}/complete")
                .route(web::post().to(complete_session))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/sessions/{id}/abandon")
                .route(web::post().to(abandon_session))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/score-distribution")
                .route(web::get().to(get_score_distribution))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/health")
                .route(web::get().to(health_check))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/health/ready")
                .route(web::get().to(health_check_ready))
                .default_service(web::to(method_not_allowed)),
        );
}

/// Reports undecodable JSON bodies through the validation envelope.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}
