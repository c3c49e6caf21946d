use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, AppResult},
    models::domain::round_to,
    store::{parse_count, Row},
};

pub const SCORE_DISTRIBUTION_HEADER: [&str; 2] = ["score", "count"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistributionEntry {
    pub score: u32,
    pub count: u64,
}

impl ScoreDistributionEntry {
    pub fn from_row(row: &Row) -> AppResult<Self> {
        let raw_score = row.first().map(|s| s.trim()).unwrap_or_default();
        let score = raw_score.parse::<u32>().map_err(|_| {
            AppError::MalformedData(format!("'{}' is not a valid score", raw_score))
        })?;

        Ok(Self {
            score,
            count: parse_count(row.get(1))?,
        })
    }
}

/// Aggregate figures shown next to the histogram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStatistics {
    pub total_responses: u64,
    pub average_score: f64,
}

impl ScoreStatistics {
    pub fn summarize(distribution: &[ScoreDistributionEntry]) -> Self {
        let total_responses: u64 = distribution.iter().map(|e| e.count).sum();
        if total_responses == 0 {
            return Self {
                total_responses,
                average_score: 0.0,
            };
        }

        let total_score: u64 = distribution
            .iter()
            .map(|e| e.score as u64 * e.count)
            .sum();

        Self {
            total_responses,
            average_score: round_to(total_score as f64 / total_responses as f64, 2),
        }
    }
}
