use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::Session,
    store::{CellRange, TabularStore},
};

/// Session lifecycle storage.
///
/// Terminal transitions locate the row with one read and overwrite it with a second call; another
/// writer touching the same row in between is not detected and the last write wins. Terminal
/// sessions are not guarded either, so completing or abandoning twice simply overwrites again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session_id: &str, started_at: DateTime<Utc>) -> AppResult<()>;
    async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        final_score: u32,
        total_questions: u32,
    ) -> AppResult<()>;
    async fn abandon_session(&self, session_id: &str) -> AppResult<()>;
}

pub struct SheetSessionRepository {
    store: Arc<dyn TabularStore>,
    table: String,
}

impl SheetSessionRepository {
    pub fn new(store: Arc<dyn TabularStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    /// 1-based sheet row holding `session_id`, with the session it stores. Row 1 is the header.
    async fn find(&self, session_id: &str) -> AppResult<(usize, Session)> {
        let rows = self
            .store
            .read(&self.table, CellRange::columns('A', 'G'))
            .await?;

        let (index, row) = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.first().is_some_and(|id| id == session_id))
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        Ok((index + 1, Session::from_row(row)?))
    }
}

#[async_trait]
impl SessionRepository for SheetSessionRepository {
    async fn create_session(&self, session_id: &str, started_at: DateTime<Utc>) -> AppResult<()> {
        let session = Session {
            id: session_id.to_string(),
            ..Session::start(started_at)
        };

        self.store.append(&self.table, vec![session.to_row()]).await
    }

    async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        final_score: u32,
        total_questions: u32,
    ) -> AppResult<()> {
        let (row, mut session) = self.find(session_id).await?;
        session.complete(ended_at, final_score, total_questions);

        self.store
            .update(
                &self.table,
                CellRange::row('C', 'G', row),
                vec![session.completion_cells()],
            )
            .await
    }

    async fn abandon_session(&self, session_id: &str) -> AppResult<()> {
        let (row, mut session) = self.find(session_id).await?;
        session.abandon();

        self.store
            .update(&self.table, CellRange::cell('D', row), vec![session.status_cell()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SheetNames,
        store::{InMemoryStore, MockTabularStore},
    };
    use crate::models::domain::session::SESSIONS_HEADER;
    use chrono::TimeZone;

    fn setup() -> (Arc<InMemoryStore>, SheetSessionRepository) {
        let store = Arc::new(InMemoryStore::with_headers(&SheetNames::default()));
        let repository = SheetSessionRepository::new(store.clone(), "sessions");
        (store, repository)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 4, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_session_appends_started_row() {
        let (store, repository) = setup();

        repository.create_session("s-1", at(10)).await.unwrap();

        let rows = store.snapshot("sessions").await;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            vec!["s-1", "2025-05-04T10:00:00.000Z", "", "started", "", "", ""]
        );
    }

    #[tokio::test]
    async fn test_complete_session_overwrites_completion_columns() {
        let (store, repository) = setup();
        repository.create_session("s-1", at(10)).await.unwrap();
        repository.create_session("s-2", at(10)).await.unwrap();

        repository.complete_session("s-2", at(11), 2, 3).await.unwrap();

        let rows = store.snapshot("sessions").await;
        assert_eq!(
            rows[2],
            vec![
                "s-2",
                "2025-05-04T10:00:00.000Z",
                "2025-05-04T11:00:00.000Z",
                "completed",
                "2",
                "3",
                "66.67"
            ]
        );
        assert_eq!(rows[1][3], "started");
    }

    #[tokio::test]
    async fn test_abandon_session_only_touches_status() {
        let (store, repository) = setup();
        repository.create_session("s-1", at(10)).await.unwrap();

        repository.abandon_session("s-1").await.unwrap();

        let rows = store.snapshot("sessions").await;
        assert_eq!(rows[1][1], "2025-05-04T10:00:00.000Z");
        assert_eq!(rows[1][2], "");
        assert_eq!(rows[1][3], "abandoned");
    }

    #[tokio::test]
    async fn test_unknown_session_is_reported() {
        let (_, repository) = setup();

        assert!(matches!(
            repository.complete_session("nope", at(11), 1, 3).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            repository.abandon_session("nope").await,
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_header_row_is_never_matched() {
        let (store, repository) = setup();
        repository.create_session("s-1", at(10)).await.unwrap();

        assert!(matches!(
            repository.complete_session("sessionID", at(11), 1, 3).await,
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            repository.abandon_session("sessionID").await,
            Err(AppError::SessionNotFound(_))
        ));

        let rows = store.snapshot("sessions").await;
        assert_eq!(rows[0], SESSIONS_HEADER);
        assert_eq!(rows[1][3], "started");
    }

    #[tokio::test]
    async fn test_terminal_session_is_overwritten_again() {
        let (store, repository) = setup();
        repository.create_session("s-1", at(10)).await.unwrap();
        repository.complete_session("s-1", at(11), 3, 3).await.unwrap();

        repository.abandon_session("s-1").await.unwrap();

        let rows = store.snapshot("sessions").await;
        assert_eq!(rows[1][3], "abandoned");
        assert_eq!(rows[1][6], "100.00");
    }

    #[tokio::test]
    async fn test_store_failure_propagates_unchanged() {
        let mut store = MockTabularStore::new();
        store
            .expect_append()
            .returning(|_, _| Err(AppError::StoreUnavailable("quota exceeded".into())));
        let repository = SheetSessionRepository::new(Arc::new(store), "sessions");

        match repository.create_session("s-1", at(10)).await {
            Err(AppError::StoreUnavailable(msg)) => assert_eq!(msg, "quota exceeded"),
            other => panic!("expected store error, got {:?}", other),
        }
    }
}
