use std::sync::Arc;

use crate::{
    errors::AppResult, models::dto::response::QuestionsResponse,
    repositories::QuestionRepository,
};

pub struct QuestionService {
    repository: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    pub fn new(repository: Arc<dyn QuestionRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_questions(&self) -> AppResult<QuestionsResponse> {
        let questions = self.repository.get_questions().await?;
        log::debug!("Loaded {} questions", questions.len());
        Ok(QuestionsResponse::from(questions))
    }
}
