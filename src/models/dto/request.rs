use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    errors::{AppError, AppResult},
    models::domain::AnswerIndex,
};

// Fields are optional so that a missing field is reported through the same validation envelope
// as an invalid one instead of a serde error.

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[serde(rename = "sessionID")]
    #[validate(required(message = "sessionID is required"), length(min = 1))]
    pub session_id: Option<String>,

    #[serde(rename = "questionID")]
    #[validate(required(message = "questionID is required"), length(min = 1))]
    pub question_id: Option<String>,

    #[serde(rename = "selectedAnswerIndex")]
    #[validate(
        required(message = "selectedAnswerIndex is required"),
        range(min = 0, max = 2, message = "selectedAnswerIndex must be 0, 1, or 2")
    )]
    pub selected_answer_index: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_score_range", skip_on_field_errors = true))]
pub struct CompleteSessionRequest {
    #[serde(rename = "sessionID")]
    #[validate(required(message = "sessionID is required"), length(min = 1))]
    pub session_id: Option<String>,

    #[serde(rename = "finalScore")]
    #[validate(required(message = "finalScore is required"), range(min = 0))]
    pub final_score: Option<i64>,

    #[serde(rename = "totalQuestions")]
    #[validate(required(message = "totalQuestions is required"), range(min = 1))]
    pub total_questions: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AbandonSessionRequest {
    #[serde(rename = "sessionID")]
    #[validate(required(message = "sessionID is required"), length(min = 1))]
    pub session_id: Option<String>,
}

fn validate_score_range(request: &CompleteSessionRequest) -> Result<(), ValidationError> {
    match (request.final_score, request.total_questions) {
        (Some(score), Some(total)) if score > total => {
            let mut err = ValidationError::new("score_range");
            err.message = Some("Invalid score range".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
}

fn to_u32(value: i64, field: &str) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::ValidationError(format!("{} is out of range", field)))
}

/// Validated form of [`RecordAnswerRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAnswer {
    pub session_id: String,
    pub question_id: String,
    pub selected: AnswerIndex,
}

impl TryFrom<RecordAnswerRequest> for RecordAnswer {
    type Error = AppError;

    fn try_from(request: RecordAnswerRequest) -> AppResult<Self> {
        request.validate()?;

        Ok(Self {
            session_id: required(request.session_id, "sessionID")?,
            question_id: required(request.question_id, "questionID")?,
            selected: AnswerIndex::try_from(required(
                request.selected_answer_index,
                "selectedAnswerIndex",
            )?)?,
        })
    }
}

/// Validated form of [`CompleteSessionRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteSession {
    pub session_id: String,
    pub final_score: u32,
    pub total_questions: u32,
}

impl TryFrom<CompleteSessionRequest> for CompleteSession {
    type Error = AppError;

    fn try_from(request: CompleteSessionRequest) -> AppResult<Self> {
        request.validate()?;

        Ok(Self {
            session_id: required(request.session_id, "sessionID")?,
            final_score: to_u32(required(request.final_score, "finalScore")?, "finalScore")?,
            total_questions: to_u32(
                required(request.total_questions, "totalQuestions")?,
                "totalQuestions",
            )?,
        })
    }
}

impl AbandonSessionRequest {
    pub fn into_session_id(self) -> AppResult<String> {
        self.validate()?;
        required(self.session_id, "sessionID")
    }
}
