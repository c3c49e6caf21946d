use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    client::api::{ApiError, QuizApi},
    models::{
        domain::{AnswerIndex, Question},
        dto::response::{AnswerStatistics, CompleteSessionResponse, ScoreDistributionResponse},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Failed to load questions: {0}")]
    Load(#[from] ApiError),

    #[error("The question catalog is empty")]
    EmptyCatalog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Complete,
}

/// Identity of the remote session record behind the current quiz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionHandle {
    Remote(String),
    /// Fabricated when the server could not create a session. Never sent to the server.
    Placeholder(String),
}

impl SessionHandle {
    fn placeholder() -> Self {
        SessionHandle::Placeholder(format!("offline-{}", Utc::now().timestamp_millis()))
    }

    pub fn id(&self) -> &str {
        match self {
            SessionHandle::Remote(id) | SessionHandle::Placeholder(id) => id,
        }
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            SessionHandle::Remote(id) => Some(id),
            SessionHandle::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SessionHandle::Placeholder(_))
    }
}

/// An answer in on-screen order; `slot` is its position in the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayedAnswer {
    pub text: String,
    pub slot: AnswerIndex,
    pub correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    pub answers: Vec<DisplayedAnswer>,
}

impl From<Question> for QuizQuestion {
    fn from(question: Question) -> Self {
        let Question {
            id,
            prompt,
            answers,
            correct_index,
        } = question;

        Self {
            id,
            prompt,
            answers: AnswerIndex::all()
                .into_iter()
                .zip(answers)
                .map(|(slot, text)| DisplayedAnswer {
                    text,
                    slot,
                    correct: slot == correct_index,
                })
                .collect(),
        }
    }
}

impl QuizQuestion {
    pub fn correct_position(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.correct)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
}

/// Names the question a response was requested for. It stops being accepted once the quiz moves
/// past that question or is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseTicket {
    epoch: u64,
    position: usize,
}

/// Remote bookkeeping for one selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordAnswerCall {
    pub session_id: String,
    pub question_id: String,
    pub slot: AnswerIndex,
}

impl RecordAnswerCall {
    /// Best effort: a failure is logged and yields no statistics.
    pub async fn send(&self, api: &dyn QuizApi) -> Option<AnswerStatistics> {
        match api
            .record_answer(&self.session_id, &self.question_id, self.slot)
            .await
        {
            Ok(response) => Some(response.statistics),
            Err(e) => {
                log::warn!("Failed to record answer for {}: {}", self.question_id, e);
                None
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerSelection {
    pub position: usize,
    pub correct: bool,
    pub correct_position: usize,
    pub ticket: ResponseTicket,
    /// `None` for placeholder sessions.
    pub record: Option<RecordAnswerCall>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_position: usize,
    pub statistics: Option<AnswerStatistics>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultTier {
    Perfect,
    Great,
    Good,
    KeepLearning,
}

impl ResultTier {
    pub fn for_percentage(percentage: u32) -> Self {
        if percentage >= 100 {
            ResultTier::Perfect
        } else if percentage >= 70 {
            ResultTier::Great
        } else if percentage >= 50 {
            ResultTier::Good
        } else {
            ResultTier::KeepLearning
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ResultTier::Perfect => "Perfect! You are a true astronomy expert!",
            ResultTier::Great => "Great job! You know astronomy really well!",
            ResultTier::Good => "Good result! Keep studying the stars!",
            ResultTier::KeepLearning => "Not bad! There is still a lot to learn about the universe!",
        }
    }
}

/// Shuffles question order and, independently, the answers of every question.
pub fn permute<R: Rng + ?Sized>(questions: &mut [QuizQuestion], rng: &mut R) {
    questions.shuffle(rng);
    for question in questions.iter_mut() {
        question.answers.shuffle(rng);
    }
}

/// Client-side quiz state: `NotStarted -> InProgress -> Complete`, back to `NotStarted` on reset.
///
/// Remote failures while starting a session, recording answers, completing or abandoning are
/// logged and never stop the quiz. Only loading the catalog can fail a start.
pub struct QuizSession {
    api: Arc<dyn QuizApi>,
    questions: Vec<QuizQuestion>,
    position: usize,
    score: u32,
    answers: Vec<RecordedAnswer>,
    session: Option<SessionHandle>,
    state: QuizState,
    epoch: u64,
    answered: bool,
    background: TaskTracker,
    shutdown: CancellationToken,
}

impl QuizSession {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            api,
            questions: Vec::new(),
            position: 0,
            score: 0,
            answers: Vec::new(),
            session: None,
            state: QuizState::NotStarted,
            epoch: 0,
            answered: false,
            background: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            QuizState::InProgress => self.questions.get(self.position),
            _ => None,
        }
    }

    /// 1-based number of the current question.
    pub fn question_number(&self) -> usize {
        self.position + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    pub fn has_answered(&self) -> bool {
        self.answered
    }

    /// Integer percentage shown to the player.
    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        (self.score as f64 / self.questions.len() as f64 * 100.0).round() as u32
    }

    pub fn result_tier(&self) -> ResultTier {
        ResultTier::for_percentage(self.percentage())
    }

    /// Fetches and shuffles the catalog.
    pub async fn load_questions(&mut self) -> Result<(), QuizError> {
        let response = self.api.get_questions().await?;
        if response.questions.is_empty() {
            return Err(QuizError::EmptyCatalog);
        }

        self.questions = response
            .questions
            .into_iter()
            .map(QuizQuestion::from)
            .collect();
        permute(&mut self.questions, &mut rand::thread_rng());
        Ok(())
    }

    /// Creates the remote session, falling back to a placeholder when the server is unreachable.
    pub async fn start_session(&mut self) {
        let handle = match self.api.start_session().await {
            Ok(response) => {
                log::info!("Session started: {}", response.session_id);
                SessionHandle::Remote(response.session_id)
            }
            Err(e) => {
                let handle = SessionHandle::placeholder();
                log::warn!(
                    "Could not start session ({}), continuing offline as {}",
                    e,
                    handle.id()
                );
                handle
            }
        };
        self.session = Some(handle);
    }

    pub async fn start(&mut self) -> Result<(), QuizError> {
        if self.state == QuizState::InProgress {
            self.reset();
        }

        self.load_questions().await?;
        self.start_session().await;

        self.position = 0;
        self.score = 0;
        self.answers.clear();
        self.answered = false;
        self.epoch += 1;
        self.state = QuizState::InProgress;
        Ok(())
    }

    /// Grades the answer at on-screen `position`. Only the first selection per question counts.
    pub fn select_answer(&mut self, position: usize) -> Option<AnswerSelection> {
        if self.state != QuizState::InProgress || self.answered {
            return None;
        }

        let question = self.questions.get(self.position)?;
        let answer = question.answers.get(position)?;
        let correct_position = question.correct_position()?;

        let recorded = RecordedAnswer {
            question_id: question.id.clone(),
            answer: answer.text.clone(),
            correct: answer.correct,
        };
        let record = self
            .session
            .as_ref()
            .and_then(SessionHandle::remote_id)
            .map(|session_id| RecordAnswerCall {
                session_id: session_id.to_string(),
                question_id: question.id.clone(),
                slot: answer.slot,
            });

        let correct = recorded.correct;
        if correct {
            self.score += 1;
        }
        self.answers.push(recorded);
        self.answered = true;

        Some(AnswerSelection {
            position,
            correct,
            correct_position,
            ticket: ResponseTicket {
                epoch: self.epoch,
                position: self.position,
            },
            record,
        })
    }

    /// [`select_answer`](Self::select_answer) followed by the remote recording.
    pub async fn answer(&mut self, position: usize) -> Option<AnswerOutcome> {
        let selection = self.select_answer(position)?;
        let statistics = match &selection.record {
            Some(call) => call.send(self.api.as_ref()).await,
            None => None,
        };

        Some(AnswerOutcome {
            correct: selection.correct,
            correct_position: selection.correct_position,
            statistics,
        })
    }

    /// Whether a response requested under `ticket` still belongs to the question on screen.
    pub fn accepts(&self, ticket: ResponseTicket) -> bool {
        self.state == QuizState::InProgress
            && ticket.epoch == self.epoch
            && ticket.position == self.position
    }

    /// Moves to the next question. Returns `false` once the quiz is over, after reporting the
    /// final score.
    pub async fn advance(&mut self) -> bool {
        if self.state != QuizState::InProgress {
            return false;
        }

        self.position += 1;
        self.answered = false;
        if self.position < self.questions.len() {
            return true;
        }

        self.state = QuizState::Complete;
        self.complete_remote().await;
        false
    }

    async fn complete_remote(&self) -> Option<CompleteSessionResponse> {
        let session_id = self.session.as_ref()?.remote_id()?;

        match self
            .api
            .complete_session(session_id, self.score, self.questions.len() as u32)
            .await
        {
            Ok(response) => {
                log::info!("Session {} completed", session_id);
                Some(response)
            }
            Err(e) => {
                log::warn!("Failed to complete session {}: {}", session_id, e);
                None
            }
        }
    }

    pub async fn score_distribution(&self) -> Option<ScoreDistributionResponse> {
        match self.api.score_distribution().await {
            Ok(response) => Some(response),
            Err(e) => {
                log::warn!("Failed to load score distribution: {}", e);
                None
            }
        }
    }

    /// Returns to `NotStarted`. A quiz still in progress has its remote session abandoned in the
    /// background.
    pub fn reset(&mut self) {
        if self.state == QuizState::InProgress {
            if let Some(session_id) = self.session.as_ref().and_then(SessionHandle::remote_id) {
                self.abandon_in_background(session_id.to_string());
            }
        }

        self.epoch += 1;
        self.position = 0;
        self.score = 0;
        self.answers.clear();
        self.answered = false;
        self.session = None;
        permute(&mut self.questions, &mut rand::thread_rng());
        self.state = QuizState::NotStarted;
    }

    fn abandon_in_background(&self, session_id: String) {
        let api = self.api.clone();

        self.spawn_background(async move {
            match api.abandon_session(&session_id).await {
                Ok(_) => log::info!("Session {} abandoned", session_id),
                Err(e) => log::warn!("Failed to abandon session {}: {}", session_id, e),
            }
        });
    }

    /// Runs a best-effort remote call that `shutdown` waits for and, past its grace, cancels.
    pub fn spawn_background<F>(&self, call: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();

        self.background.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => log::debug!("Background call cancelled by shutdown"),
                _ = call => {}
            }
        });
    }

    pub fn pending_background(&self) -> usize {
        self.background.len()
    }

    /// Waits up to `grace` for background calls, then cancels whatever is left.
    pub async fn shutdown(&self, grace: Duration) {
        self.background.close();
        if tokio::time::timeout(grace, self.background.wait())
            .await
            .is_err()
        {
            log::warn!(
                "{} background calls still running, cancelling",
                self.background.len()
            );
            self.shutdown.cancel();
            self.background.wait().await;
        }
    }
}
