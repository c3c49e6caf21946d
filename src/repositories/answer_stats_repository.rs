use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::domain::{AnswerIndex, AnswerStat},
    store::{CellRange, TabularStore},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerStatsRepository: Send + Sync {
    /// Counts one response for `question_id` and returns the counters after the write.
    async fn record_answer(&self, question_id: &str, selected: AnswerIndex)
        -> AppResult<AnswerStat>;
}

pub struct SheetAnswerStatsRepository {
    store: Arc<dyn TabularStore>,
    table: String,
}

impl SheetAnswerStatsRepository {
    pub fn new(store: Arc<dyn TabularStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }
}

#[async_trait]
impl AnswerStatsRepository for SheetAnswerStatsRepository {
    async fn record_answer(
        &self,
        question_id: &str,
        selected: AnswerIndex,
    ) -> AppResult<AnswerStat> {
        let rows = self
            .store
            .read(&self.table, CellRange::columns('A', 'F'))
            .await?;

        let existing = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.first().is_some_and(|id| id == question_id));

        match existing {
            Some((index, row)) => {
                let mut stat = AnswerStat::from_row(row)?;
                stat.record(selected);

                self.store
                    .update(
                        &self.table,
                        CellRange::row('B', 'E', index + 1),
                        vec![stat.counter_cells()],
                    )
                    .await?;

                Ok(stat)
            }
            None => {
                let stat = AnswerStat::first(question_id, selected);
                self.store.append(&self.table, vec![stat.to_row()]).await?;
                Ok(stat)
            }
        }
    }
}
