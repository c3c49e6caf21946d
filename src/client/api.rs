use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::ClientConfig,
    errors::ErrorResponse,
    models::{
        domain::AnswerIndex,
        dto::{
            request::{AbandonSessionRequest, CompleteSessionRequest, RecordAnswerRequest},
            response::{
                AbandonSessionResponse, CompleteSessionResponse, QuestionsResponse,
                RecordAnswerResponse, ScoreDistributionResponse, StartSessionResponse, Success,
            },
        },
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request timeout - please check your connection")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{code} ({status}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote operations the quiz needs from the server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn get_questions(&self) -> ApiResult<QuestionsResponse>;
    async fn start_session(&self) -> ApiResult<StartSessionResponse>;
    async fn record_answer(
        &self,
        session_id: &str,
        question_id: &str,
        selected: AnswerIndex,
    ) -> ApiResult<RecordAnswerResponse>;
    async fn complete_session(
        &self,
        session_id: &str,
        final_score: u32,
        total_questions: u32,
    ) -> ApiResult<CompleteSessionResponse>;
    async fn abandon_session(&self, session_id: &str) -> ApiResult<AbandonSessionResponse>;
    async fn score_distribution(&self) -> ApiResult<ScoreDistributionResponse>;
}

pub struct HttpQuizApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpQuizApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| ApiError::Network(format!("Invalid API base URL: {}", e)))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and decodes the envelope once, so callers only ever see data or an
    /// [`ApiError`].
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(err) => ApiError::Rejected {
                    status: status.as_u16(),
                    code: err.error,
                    message: err.message,
                },
                Err(_) => ApiError::Rejected {
                    status: status.as_u16(),
                    code: "HTTP_ERROR".to_string(),
                    message: format!("HTTP error! status: {}", status.as_u16()),
                },
            });
        }

        let envelope: Success<T> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Decode("response reported success=false".to_string()));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn get_questions(&self) -> ApiResult<QuestionsResponse> {
        let url = self.endpoint(&["questions"])?;
        self.send(self.http.get(url)).await
    }

    async fn start_session(&self) -> ApiResult<StartSessionResponse> {
        let url = self.endpoint(&["sessions"])?;
        self.send(self.http.post(url).json(&serde_json::json!({}))).await
    }

    async fn record_answer(
        &self,
        session_id: &str,
        question_id: &str,
        selected: AnswerIndex,
    ) -> ApiResult<RecordAnswerResponse> {
        let url = self.endpoint(&["sessions", session_id, "answers"])?;
        let body = RecordAnswerRequest {
            session_id: Some(session_id.to_string()),
            question_id: Some(question_id.to_string()),
            selected_answer_index: Some(selected.get() as i64),
        };
        self.send(self.http.post(url).json(&body)).await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        final_score: u32,
        total_questions: u32,
    ) -> ApiResult<CompleteSessionResponse> {
        let url = self.endpoint(&["sessions", session_id, "complete"])?;
        let body = CompleteSessionRequest {
            session_id: Some(session_id.to_string()),
            final_score: Some(final_score as i64),
            total_questions: Some(total_questions as i64),
        };
        self.send(self.http.post(url).json(&body)).await
    }

    async fn abandon_session(&self, session_id: &str) -> ApiResult<AbandonSessionResponse> {
        let url = self.endpoint(&["sessions", session_id, "abandon"])?;
        let body = AbandonSessionRequest {
            session_id: Some(session_id.to_string()),
        };
        self.send(self.http.post(url).json(&body)).await
    }

    async fn score_distribution(&self) -> ApiResult<ScoreDistributionResponse> {
        let url = self.endpoint(&["score-distribution"])?;
        self.send(self.http.get(url)).await
    }
}
