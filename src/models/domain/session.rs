use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    store::Row,
};

pub const SESSIONS_HEADER: [&str; 7] = [
    "sessionID",
    "timestampStart",
    "timestampEnd",
    "status",
    "finalScore",
    "totalQuestions",
    "percentage",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Started,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Started => "started",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "started" => Ok(SessionStatus::Started),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(AppError::MalformedData(format!(
                "unknown session status '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub final_score: Option<u32>,
    pub total_questions: Option<u32>,
    pub percentage: Option<String>,
}

impl Session {
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
            ended_at: None,
            status: SessionStatus::Started,
            final_score: None,
            total_questions: None,
            percentage: None,
        }
    }

    /// Maps a sessions row. Blank completion cells read as `None`; trailing cells may be missing.
    pub fn from_row(row: &Row) -> AppResult<Self> {
        let cell = |i: usize| row.get(i).map(|c| c.trim()).unwrap_or_default();
        let id = cell(0).to_string();
        let malformed = |column: &str, value: &str| {
            AppError::MalformedData(format!(
                "session '{}' has an invalid {} '{}'",
                id, column, value
            ))
        };
        let timestamp = |i: usize, column: &str| {
            DateTime::parse_from_rfc3339(cell(i))
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| malformed(column, cell(i)))
        };
        let count = |i: usize, column: &str| match cell(i) {
            "" => Ok(None),
            value => value.parse::<u32>().map(Some).map_err(|_| malformed(column, value)),
        };

        Ok(Self {
            started_at: timestamp(1, "timestampStart")?,
            ended_at: match cell(2) {
                "" => None,
                _ => Some(timestamp(2, "timestampEnd")?),
            },
            status: cell(3).parse()?,
            final_score: count(4, "finalScore")?,
            total_questions: count(5, "totalQuestions")?,
            percentage: Some(cell(6).to_string()).filter(|p| !p.is_empty()),
            id,
        })
    }

    pub fn complete(&mut self, ended_at: DateTime<Utc>, final_score: u32, total_questions: u32) {
        self.ended_at = Some(ended_at);
        self.status = SessionStatus::Completed;
        self.final_score = Some(final_score);
        self.total_questions = Some(total_questions);
        self.percentage = Some(score_percentage(final_score, total_questions));
    }

    pub fn abandon(&mut self) {
        self.status = SessionStatus::Abandoned;
    }

    /// The `C:G` cells: end timestamp, status and score columns.
    pub fn completion_cells(&self) -> Row {
        self.to_row().split_off(2)
    }

    /// The `D` cell.
    pub fn status_cell(&self) -> Row {
        vec![self.status.to_string()]
    }

    /// Full sessions row; unset completion columns render blank.
    pub fn to_row(&self) -> Row {
        let optional = |value: Option<String>| value.unwrap_or_default();

        vec![
            self.id.clone(),
            format_timestamp(self.started_at),
            optional(self.ended_at.map(format_timestamp)),
            self.status.to_string(),
            optional(self.final_score.map(|s| s.to_string())),
            optional(self.total_questions.map(|t| t.to_string())),
            optional(self.percentage.clone()),
        ]
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `final_score / total_questions * 100` with two decimals, as stored in the sessions table.
pub fn score_percentage(final_score: u32, total_questions: u32) -> String {
    if total_questions == 0 {
        return "0.00".to_string();
    }
    format!(
        "{:.2}",
        final_score as f64 / total_questions as f64 * 100.0
    )
}
