use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    config::SheetNames,
    errors::{AppError, AppResult},
    models::domain::{
        answer_stat::ANSWER_STATS_HEADER, question::QUESTIONS_HEADER,
        score_distribution::SCORE_DISTRIBUTION_HEADER, session::SESSIONS_HEADER,
    },
    store::{CellRange, Row, TabularStore},
};

/// Process-local tables with the same addressing rules as the spreadsheet.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the four quiz tables with only their header rows.
    pub fn with_headers(names: &SheetNames) -> Self {
        let header = |cells: &[&str]| vec![cells.iter().map(|c| c.to_string()).collect::<Row>()];

        let mut tables = HashMap::new();
        tables.insert(names.questions.clone(), header(&QUESTIONS_HEADER[..]));
        tables.insert(names.sessions.clone(), header(&SESSIONS_HEADER[..]));
        tables.insert(names.answer_stats.clone(), header(&ANSWER_STATS_HEADER[..]));
        tables.insert(
            names.score_distribution.clone(),
            header(&SCORE_DISTRIBUTION_HEADER[..]),
        );

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Replaces the whole content of a table.
    pub async fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Copy of a table as stored, trailing empty cells included.
    pub async fn snapshot(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn is_blank(row: &Row) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn trim_trailing(mut row: Row) -> Row {
    while row.last().is_some_and(|cell| cell.is_empty()) {
        row.pop();
    }
    row
}

#[async_trait]
impl TabularStore for InMemoryStore {
    async fn read(&self, table: &str, range: CellRange) -> AppResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Err(AppError::StoreUnavailable(format!(
                "Unable to parse range: {}!{}",
                table, range
            )));
        };

        let first = range.start_row().unwrap_or(1).max(1);
        let last = range.end_row().unwrap_or(rows.len()).min(rows.len());
        if first > last {
            return Ok(vec![]);
        }

        let mut values: Vec<Row> = rows[first - 1..last]
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .skip(range.start_col())
                    .take(range.width())
                    .cloned()
                    .collect();
                trim_trailing(cells)
            })
            .collect();

        while values.last().is_some_and(|row| row.is_empty()) {
            values.pop();
        }

        Ok(values)
    }

    async fn append(&self, table: &str, rows: Vec<Row>) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables.entry(table.to_string()).or_default();

        let used = existing
            .iter()
            .rposition(|row| !is_blank(row))
            .map(|i| i + 1)
            .unwrap_or(0);
        existing.truncate(used);
        existing.extend(rows);

        Ok(())
    }

    async fn update(&self, table: &str, range: CellRange, rows: Vec<Row>) -> AppResult<()> {
        let Some(start_row) = range.start_row() else {
            return Err(AppError::InternalError(format!(
                "Update range {} does not address a row",
                range
            )));
        };

        let height = range
            .end_row()
            .map(|end| end + 1 - start_row)
            .unwrap_or(rows.len());
        if rows.len() > height || rows.iter().any(|row| row.len() > range.width()) {
            return Err(AppError::InternalError(format!(
                "Values do not fit in range {}",
                range
            )));
        }

        let mut tables = self.tables.write().await;
        let existing = tables.entry(table.to_string()).or_default();

        for (offset, values) in rows.into_iter().enumerate() {
            let index = start_row - 1 + offset;
            if existing.len() <= index {
                existing.resize(index + 1, Vec::new());
            }

            let target = &mut existing[index];
            let needed = range.start_col() + values.len();
            if target.len() < needed {
                target.resize(needed, String::new());
            }
            for (col, value) in values.into_iter().enumerate() {
                target[range.start_col() + col] = value;
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}
