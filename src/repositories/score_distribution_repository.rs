use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::domain::ScoreDistributionEntry,
    store::{parse_count, CellRange, TabularStore},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreDistributionRepository: Send + Sync {
    async fn update_score_distribution(&self, final_score: u32) -> AppResult<()>;
    /// All buckets, ascending by score.
    async fn get_score_distribution(&self) -> AppResult<Vec<ScoreDistributionEntry>>;
}

pub struct SheetScoreDistributionRepository {
    store: Arc<dyn TabularStore>,
    table: String,
}

impl SheetScoreDistributionRepository {
    pub fn new(store: Arc<dyn TabularStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }
}

#[async_trait]
impl ScoreDistributionRepository for SheetScoreDistributionRepository {
    async fn update_score_distribution(&self, final_score: u32) -> AppResult<()> {
        let rows = self
            .store
            .read(&self.table, CellRange::columns('A', 'B'))
            .await?;

        let existing = rows.iter().enumerate().skip(1).find(|(_, row)| {
            row.first()
                .is_some_and(|cell| cell.trim().parse::<u32>().ok() == Some(final_score))
        });

        match existing {
            Some((index, row)) => {
                let count = parse_count(row.get(1))? + 1;
                self.store
                    .update(
                        &self.table,
                        CellRange::cell('B', index + 1),
                        vec![vec![count.to_string()]],
                    )
                    .await
            }
            None => {
                self.store
                    .append(&self.table, vec![vec![final_score.to_string(), "1".to_string()]])
                    .await
            }
        }
    }

    async fn get_score_distribution(&self) -> AppResult<Vec<ScoreDistributionEntry>> {
        let rows = self
            .store
            .read(&self.table, CellRange::from_row('A', 2, 'B'))
            .await?;

        let mut distribution = rows
            .iter()
            .filter(|row| row.first().is_some_and(|cell| !cell.trim().is_empty()))
            .map(ScoreDistributionEntry::from_row)
            .collect::<AppResult<Vec<_>>>()?;

        distribution.sort_by_key(|entry| entry.score);
        Ok(distribution)
    }
}
