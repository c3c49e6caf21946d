use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::{
        SheetAnswerStatsRepository, SheetQuestionRepository, SheetScoreDistributionRepository,
        SheetSessionRepository,
    },
    services::{AnswerService, QuestionService, SessionService, StatisticsService},
    store::{build_store, TabularStore},
};

#[derive(Clone)]
pub struct AppState {
    pub question_service: Arc<QuestionService>,
    pub session_service: Arc<SessionService>,
    pub answer_service: Arc<AnswerService>,
    pub statistics_service: Arc<StatisticsService>,
    pub store: Arc<dyn TabularStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let store = build_store(&config)?;
        Ok(Self::with_store(config, store))
    }

    /// Wires every repository and service on top of an existing store.
    pub fn with_store(config: Config, store: Arc<dyn TabularStore>) -> Self {
        let sheets = &config.sheets;

        let questions = Arc::new(SheetQuestionRepository::new(
            store.clone(),
            &sheets.questions,
        ));
        let sessions = Arc::new(SheetSessionRepository::new(store.clone(), &sheets.sessions));
        let answer_stats = Arc::new(SheetAnswerStatsRepository::new(
            store.clone(),
            &sheets.answer_stats,
        ));
        let scores = Arc::new(SheetScoreDistributionRepository::new(
            store.clone(),
            &sheets.score_distribution,
        ));

        Self {
            question_service: Arc::new(QuestionService::new(questions.clone())),
            session_service: Arc::new(SessionService::new(sessions, scores.clone())),
            answer_service: Arc::new(AnswerService::new(questions, answer_stats)),
            statistics_service: Arc::new(StatisticsService::new(scores)),
            store,
            config: Arc::new(config),
        }
    }
}
