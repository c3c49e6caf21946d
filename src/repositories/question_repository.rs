use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::domain::Question,
    store::{CellRange, TabularStore},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn get_questions(&self) -> AppResult<Vec<Question>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>>;
}

pub struct SheetQuestionRepository {
    store: Arc<dyn TabularStore>,
    table: String,
}

impl SheetQuestionRepository {
    pub fn new(store: Arc<dyn TabularStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }
}

#[async_trait]
impl QuestionRepository for SheetQuestionRepository {
    async fn get_questions(&self) -> AppResult<Vec<Question>> {
        let rows = self
            .store
            .read(&self.table, CellRange::from_row('A', 2, 'F'))
            .await?;

        rows.iter()
            .filter(|row| row.first().is_some_and(|id| !id.trim().is_empty()))
            .map(Question::from_row)
            .collect()
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let questions = self.get_questions().await?;
        Ok(questions.into_iter().find(|q| q.id == id))
    }
}
