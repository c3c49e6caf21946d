//! Quiz client: the HTTP API client, the quiz state machine and the timer-driven controller that
//! sits between them and a front end.

pub mod api;
pub mod controller;
pub mod quiz;
pub mod timers;

pub use api::{ApiError, HttpQuizApi, QuizApi};
pub use controller::{QuizController, QuizView, Screen, UiEvent};
pub use quiz::{QuizError, QuizSession, QuizState, SessionHandle};
