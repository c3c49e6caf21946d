use std::sync::Arc;

use chrono::Utc;

use crate::{
    errors::AppResult,
    models::{
        domain::{round_to, session::format_timestamp, Session, SessionStatus},
        dto::{
            request::{AbandonSessionRequest, CompleteSession, CompleteSessionRequest},
            response::{AbandonSessionResponse, CompleteSessionResponse, StartSessionResponse},
        },
    },
    repositories::{ScoreDistributionRepository, SessionRepository},
};

pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    scores: Arc<dyn ScoreDistributionRepository>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        scores: Arc<dyn ScoreDistributionRepository>,
    ) -> Self {
        Self { sessions, scores }
    }

    pub async fn start_session(&self) -> AppResult<StartSessionResponse> {
        let session = Session::start(Utc::now());

        self.sessions
            .create_session(&session.id, session.started_at)
            .await?;
        log::info!("Started session {}", session.id);

        Ok(StartSessionResponse {
            timestamp: format_timestamp(session.started_at),
            session_id: session.id,
        })
    }

    /// Marks the session completed, then counts its score in the distribution.
    pub async fn complete_session(
        &self,
        request: CompleteSessionRequest,
    ) -> AppResult<CompleteSessionResponse> {
        let CompleteSession {
            session_id,
            final_score,
            total_questions,
        } = CompleteSession::try_from(request)?;
        let ended_at = Utc::now();

        self.sessions
            .complete_session(&session_id, ended_at, final_score, total_questions)
            .await?;
        self.scores.update_score_distribution(final_score).await?;

        log::info!(
            "Completed session {} with {}/{}",
            session_id,
            final_score,
            total_questions
        );

        Ok(CompleteSessionResponse {
            session_id,
            final_score,
            total_questions,
            percentage: round_to(final_score as f64 / total_questions as f64 * 100.0, 2),
            timestamp: format_timestamp(ended_at),
        })
    }

    pub async fn abandon_session(
        &self,
        request: AbandonSessionRequest,
    ) -> AppResult<AbandonSessionResponse> {
        let session_id = request.into_session_id()?;

        self.sessions.abandon_session(&session_id).await?;
        log::info!("Abandoned session {}", session_id);

        Ok(AbandonSessionResponse {
            session_id,
            status: SessionStatus::Abandoned,
        })
    }
}
