use actix_web::{web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::{AppError, AppResult},
    models::dto::{
        request::{AbandonSessionRequest, CompleteSessionRequest, RecordAnswerRequest},
        response::Success,
    },
};

pub async fn get_questions(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let response = state.question_service.get_questions().await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

pub async fn start_session(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let response = state.session_service.start_session().await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

pub async fn record_answer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<RecordAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    ensure_same_session(&path, request.session_id.as_deref())?;

    let response = state.answer_service.record_answer(request).await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

pub async fn complete_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<CompleteSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    ensure_same_session(&path, request.session_id.as_deref())?;

    let response = state.session_service.complete_session(request).await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

pub async fn abandon_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<AbandonSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    ensure_same_session(&path, request.session_id.as_deref())?;

    let response = state.session_service.abandon_session(request).await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

pub async fn get_score_distribution(
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let response = state.statistics_service.score_distribution().await?;
    Ok(HttpResponse::Ok().json(Success::new(response)))
}

/// A body `sessionID` must name the session addressed by the path. A missing one is left to
/// request validation.
fn ensure_same_session(path_id: &str, body_id: Option<&str>) -> AppResult<()> {
    match body_id {
        Some(body_id) if body_id != path_id => Err(AppError::ValidationError(format!(
            "sessionID '{}' does not match session '{}' in the path",
            body_id, path_id
        ))),
        _ => Ok(()),
    }
}
