use serde::{Deserialize, Serialize};

use crate::models::domain::{
    AnswerIndex, AnswerStat, Question, ScoreDistributionEntry, ScoreStatistics, SessionStatus,
};

/// Successful API body: `{"success": true, ...data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
    pub total: usize,
}

impl From<Vec<Question>> for QuestionsResponse {
    fn from(questions: Vec<Question>) -> Self {
        Self {
            total: questions.len(),
            questions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerStatistics {
    pub total_responses: u64,
    pub correct_percentage: f64,
    pub answer_distribution: [u64; AnswerIndex::SLOTS],
}

impl AnswerStatistics {
    pub fn new(stat: &AnswerStat, correct: AnswerIndex) -> Self {
        Self {
            total_responses: stat.total,
            correct_percentage: stat.correct_percentage(correct),
            answer_distribution: stat.counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAnswerResponse {
    pub correct: bool,
    pub correct_answer_index: AnswerIndex,
    pub statistics: AnswerStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub final_score: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonSessionResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistributionResponse {
    pub distribution: Vec<ScoreDistributionEntry>,
    pub statistics: ScoreStatistics,
}

impl From<Vec<ScoreDistributionEntry>> for ScoreDistributionResponse {
    fn from(distribution: Vec<ScoreDistributionEntry>) -> Self {
        Self {
            statistics: ScoreStatistics::summarize(&distribution),
            distribution,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    pub timestamp: String,
    pub environment: String,
}
