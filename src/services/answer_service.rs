use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::dto::{
        request::{RecordAnswer, RecordAnswerRequest},
        response::{AnswerStatistics, RecordAnswerResponse},
    },
    repositories::{AnswerStatsRepository, QuestionRepository},
};

pub struct AnswerService {
    questions: Arc<dyn QuestionRepository>,
    stats: Arc<dyn AnswerStatsRepository>,
}

impl AnswerService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        stats: Arc<dyn AnswerStatsRepository>,
    ) -> Self {
        Self { questions, stats }
    }

    /// Grades a response against the catalog and counts it in the question's distribution.
    pub async fn record_answer(
        &self,
        request: RecordAnswerRequest,
    ) -> AppResult<RecordAnswerResponse> {
        let RecordAnswer {
            session_id,
            question_id,
            selected,
        } = RecordAnswer::try_from(request)?;

        let question = self
            .questions
            .find_by_id(&question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

        let stat = self.stats.record_answer(&question.id, selected).await?;
        log::debug!(
            "Session {} answered {} with slot {}",
            session_id,
            question.id,
            selected.get()
        );

        Ok(RecordAnswerResponse {
            correct: question.is_correct(selected),
            correct_answer_index: question.correct_index,
            statistics: AnswerStatistics::new(&stat, question.correct_index),
        })
    }
}
