pub mod answer_service;
pub mod question_service;
pub mod session_service;
pub mod statistics_service;

pub use answer_service::AnswerService;
pub use question_service::QuestionService;
pub use session_service::SessionService;
pub use statistics_service::StatisticsService;
