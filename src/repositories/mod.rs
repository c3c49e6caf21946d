pub mod answer_stats_repository;
pub mod question_repository;
pub mod score_distribution_repository;
pub mod session_repository;

pub use answer_stats_repository::{AnswerStatsRepository, SheetAnswerStatsRepository};
pub use question_repository::{QuestionRepository, SheetQuestionRepository};
pub use score_distribution_repository::{
    ScoreDistributionRepository, SheetScoreDistributionRepository,
};
pub use session_repository::{SessionRepository, SheetSessionRepository};
