use std::sync::Arc;

use crate::{
    errors::AppResult, models::dto::response::ScoreDistributionResponse,
    repositories::ScoreDistributionRepository,
};

pub struct StatisticsService {
    repository: Arc<dyn ScoreDistributionRepository>,
}

impl StatisticsService {
    pub fn new(repository: Arc<dyn ScoreDistributionRepository>) -> Self {
        Self { repository }
    }

    pub async fn score_distribution(&self) -> AppResult<ScoreDistributionResponse> {
        let distribution = self.repository.get_score_distribution().await?;
        Ok(ScoreDistributionResponse::from(distribution))
    }
}
