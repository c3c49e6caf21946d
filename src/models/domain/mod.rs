pub mod answer_stat;
pub mod question;
pub mod score_distribution;
pub mod session;

pub use answer_stat::AnswerStat;
pub use question::{AnswerIndex, Question};
pub use score_distribution::{ScoreDistributionEntry, ScoreStatistics};
pub use session::{Session, SessionStatus};

/// Rounds half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
