use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Barrier;

use astro_quiz::{
    config::SheetNames,
    errors::AppResult,
    models::domain::{AnswerIndex, ScoreDistributionEntry},
    repositories::{
        AnswerStatsRepository, ScoreDistributionRepository, SessionRepository,
        SheetAnswerStatsRepository, SheetScoreDistributionRepository, SheetSessionRepository,
    },
    services::SessionService,
    store::{CellRange, InMemoryStore, Row, TabularStore},
};

/// Holds every read of one table until `parties` readers have arrived, so that concurrent
/// read-then-write callers all observe the same snapshot.
struct BarrierStore {
    inner: Arc<InMemoryStore>,
    table: String,
    barrier: Barrier,
}

impl BarrierStore {
    fn new(inner: Arc<InMemoryStore>, table: &str, parties: usize) -> Self {
        Self {
            inner,
            table: table.to_string(),
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl TabularStore for BarrierStore {
    async fn read(&self, table: &str, range: CellRange) -> AppResult<Vec<Row>> {
        let rows = self.inner.read(table, range).await?;
        if table == self.table {
            self.barrier.wait().await;
        }
        Ok(rows)
    }

    async fn append(&self, table: &str, rows: Vec<Row>) -> AppResult<()> {
        self.inner.append(table, rows).await
    }

    async fn update(&self, table: &str, range: CellRange, rows: Vec<Row>) -> AppResult<()> {
        self.inner.update(table, range, rows).await
    }

    async fn health_check(&self) -> AppResult<()> {
        self.inner.health_check().await
    }
}

fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_headers(&SheetNames::default()))
}

fn slot(i: usize) -> AnswerIndex {
    AnswerIndex::new(i).unwrap()
}

#[tokio::test]
async fn test_record_answer_is_monotonic() {
    let repository = SheetAnswerStatsRepository::new(store(), "answer_stats");
    let n = 25;

    let mut last_total = 0;
    for i in 0..n {
        let stat = repository.record_answer("q-1", slot(i % 3)).await.unwrap();
        assert!(stat.total > last_total);
        last_total = stat.total;
    }

    let stat = repository.record_answer("q-1", slot(0)).await.unwrap();
    assert_eq!(stat.total, n as u64 + 1);
    assert_eq!(stat.counts.iter().sum::<u64>(), stat.total);
    assert_eq!(stat.counts, [10, 8, 8]);
}

#[tokio::test]
async fn test_first_answer_on_fresh_question() {
    let repository = SheetAnswerStatsRepository::new(store(), "answer_stats");

    let stat = repository.record_answer("fresh", slot(0)).await.unwrap();

    assert_eq!(stat.counts, [1, 0, 0]);
    assert_eq!(stat.total, 1);
}

#[tokio::test]
async fn test_concurrent_record_answer_loses_an_update() {
    let inner = store();
    SheetAnswerStatsRepository::new(inner.clone(), "answer_stats")
        .record_answer("q-1", slot(0))
        .await
        .unwrap();

    let racing: Arc<dyn TabularStore> =
        Arc::new(BarrierStore::new(inner.clone(), "answer_stats", 2));
    let repository = SheetAnswerStatsRepository::new(racing, "answer_stats");

    let (first, second) = tokio::join!(
        repository.record_answer("q-1", slot(1)),
        repository.record_answer("q-1", slot(2)),
    );
    assert_eq!(first.unwrap().total, 2);
    assert_eq!(second.unwrap().total, 2);

    // three answers were recorded but the stored total only saw two of them
    let rows = inner.snapshot("answer_stats").await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][4], "2");
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    let inner = store();
    let service = SessionService::new(
        Arc::new(SheetSessionRepository::new(inner.clone(), "sessions")),
        Arc::new(SheetScoreDistributionRepository::new(
            inner.clone(),
            "score_distribution",
        )),
    );

    let mut ids = HashSet::new();
    for _ in 0..200 {
        ids.insert(service.start_session().await.unwrap().session_id);
    }

    assert_eq!(ids.len(), 200);
    assert_eq!(inner.snapshot("sessions").await.len(), 201);
}

#[tokio::test]
async fn test_completing_two_of_three_stores_two_decimals() {
    let inner = store();
    let repository = SheetSessionRepository::new(inner.clone(), "sessions");

    repository
        .create_session("s-1", chrono::Utc::now())
        .await
        .unwrap();
    repository
        .complete_session("s-1", chrono::Utc::now(), 2, 3)
        .await
        .unwrap();

    let rows = inner.snapshot("sessions").await;
    assert_eq!(rows[1][3], "completed");
    assert_eq!(rows[1][6], "66.67");
}

#[tokio::test]
async fn test_score_distribution_is_idempotent_and_sorted() {
    let repository = SheetScoreDistributionRepository::new(store(), "score_distribution");
    for score in [3, 1, 4, 1, 5, 0, 3] {
        repository.update_score_distribution(score).await.unwrap();
    }

    let first = repository.get_score_distribution().await.unwrap();
    let second = repository.get_score_distribution().await.unwrap();

    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].score < w[1].score));
    assert_eq!(
        first,
        vec![
            ScoreDistributionEntry { score: 0, count: 1 },
            ScoreDistributionEntry { score: 1, count: 2 },
            ScoreDistributionEntry { score: 3, count: 2 },
            ScoreDistributionEntry { score: 4, count: 1 },
            ScoreDistributionEntry { score: 5, count: 1 },
        ]
    );
}
