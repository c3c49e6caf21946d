use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    client::{
        api::QuizApi,
        quiz::{QuizError, QuizQuestion, QuizSession, ResponseTicket, ResultTier},
        timers::{Countdown, TimerFired, TimerKind},
    },
    config::ClientConfig,
    models::dto::response::{AnswerStatistics, ScoreDistributionResponse},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Question,
    Results,
}

/// Player input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Start,
    /// On-screen answer position.
    SelectAnswer(usize),
    Next,
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub selected: usize,
    pub correct_position: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizResults {
    pub score: u32,
    pub total: usize,
    pub percentage: u32,
    pub tier: ResultTier,
}

/// Rendering surface driven by the controller.
pub trait QuizView: Send {
    fn show_welcome(&mut self);
    fn show_loading(&mut self);
    fn show_load_error(&mut self, error: &QuizError);
    fn show_question(&mut self, number: usize, total: usize, score: u32, question: &QuizQuestion);
    fn show_feedback(&mut self, feedback: &Feedback);
    fn show_statistics(&mut self, statistics: &AnswerStatistics);
    fn show_results(&mut self, results: &QuizResults);
    fn show_score_distribution(&mut self, distribution: &ScoreDistributionResponse);
}

/// Work finished outside the controller task.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    Timer(TimerFired),
    Statistics {
        ticket: ResponseTicket,
        statistics: AnswerStatistics,
    },
}

impl From<TimerFired> for ControllerEvent {
    fn from(fired: TimerFired) -> Self {
        ControllerEvent::Timer(fired)
    }
}

/// Owns the quiz and the two countdowns. Every state change happens on the task that calls
/// [`handle`](Self::handle) and [`process`](Self::process); timers and statistics requests only
/// post events back.
pub struct QuizController<V: QuizView> {
    api: Arc<dyn QuizApi>,
    quiz: QuizSession,
    view: V,
    screen: Screen,
    inactivity: Countdown,
    auto_advance: Countdown,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl<V: QuizView> QuizController<V> {
    pub fn new(api: Arc<dyn QuizApi>, view: V, config: &ClientConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            quiz: QuizSession::new(api.clone()),
            api,
            view,
            screen: Screen::Welcome,
            inactivity: Countdown::new(TimerKind::Inactivity, config.inactivity_timeout),
            auto_advance: Countdown::new(TimerKind::AutoAdvance, config.auto_advance_timeout),
            events_tx,
            events_rx,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    pub async fn handle(&mut self, event: UiEvent) {
        match (self.screen, event) {
            (Screen::Welcome, UiEvent::Start) => self.start_quiz().await,
            (Screen::Question, UiEvent::SelectAnswer(position)) => self.select_answer(position),
            (Screen::Question, UiEvent::Next) if self.quiz.has_answered() => {
                self.next_question().await
            }
            (Screen::Results, UiEvent::Restart) => {
                self.quiz.reset();
                self.start_quiz().await;
            }
            (screen, event) => log::debug!("Ignoring {:?} on {:?} screen", event, screen),
        }
    }

    /// Applies one timer expiry or statistics response.
    pub async fn process(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Timer(fired) => match fired.kind {
                TimerKind::Inactivity => {
                    if self.inactivity.acknowledge(fired) {
                        log::info!("Inactivity detected, resetting to the welcome screen");
                        self.reset_to_welcome();
                    }
                }
                TimerKind::AutoAdvance => {
                    if self.auto_advance.acknowledge(fired) {
                        log::info!("Auto-advancing to the next question");
                        self.next_question().await;
                    }
                }
            },
            ControllerEvent::Statistics { ticket, statistics } => {
                if self.screen == Screen::Question && self.quiz.accepts(ticket) {
                    self.view.show_statistics(&statistics);
                } else {
                    log::debug!("Dropping statistics that arrived after the question changed");
                }
            }
        }
    }

    /// Waits for the next internal event and applies it.
    pub async fn step(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.process(event).await;
        }
    }

    /// Applies every internal event that is already queued.
    pub async fn pump_pending(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.process(event).await;
        }
    }

    /// Drives the controller until the input channel closes.
    pub async fn run(mut self, mut input: mpsc::Receiver<UiEvent>) {
        self.view.show_welcome();

        loop {
            tokio::select! {
                event = input.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.process(event).await,
            }
        }

        self.inactivity.cancel();
        self.auto_advance.cancel();
        self.quiz.reset();
        self.quiz.shutdown(SHUTDOWN_GRACE).await;
    }

    async fn start_quiz(&mut self) {
        self.view.show_loading();

        if let Err(e) = self.quiz.start().await {
            log::error!("Could not start quiz: {}", e);
            self.view.show_load_error(&e);
            self.show_screen(Screen::Welcome);
            return;
        }

        self.show_screen(Screen::Question);
        self.display_question();
    }

    fn display_question(&mut self) {
        let Some(question) = self.quiz.current_question() else {
            return;
        };

        self.view.show_question(
            self.quiz.question_number(),
            self.quiz.total(),
            self.quiz.score(),
            question,
        );
        self.inactivity.arm(&self.events_tx);
    }

    fn select_answer(&mut self, position: usize) {
        let Some(selection) = self.quiz.select_answer(position) else {
            return;
        };
        self.inactivity.cancel();

        self.view.show_feedback(&Feedback {
            correct: selection.correct,
            selected: selection.position,
            correct_position: selection.correct_position,
        });

        if let Some(call) = selection.record {
            let api = self.api.clone();
            let events = self.events_tx.clone();
            let ticket = selection.ticket;

            self.quiz.spawn_background(async move {
                if let Some(statistics) = call.send(api.as_ref()).await {
                    let _ = events.send(ControllerEvent::Statistics { ticket, statistics });
                }
            });
        }

        self.auto_advance.arm(&self.events_tx);
    }

    async fn next_question(&mut self) {
        self.auto_advance.cancel();

        if self.quiz.advance().await {
            self.display_question();
        } else {
            self.show_results().await;
        }
    }

    async fn show_results(&mut self) {
        self.show_screen(Screen::Results);
        self.view.show_results(&QuizResults {
            score: self.quiz.score(),
            total: self.quiz.total(),
            percentage: self.quiz.percentage(),
            tier: self.quiz.result_tier(),
        });

        if let Some(distribution) = self.quiz.score_distribution().await {
            if !distribution.distribution.is_empty() {
                self.view.show_score_distribution(&distribution);
            }
        }
    }

    fn reset_to_welcome(&mut self) {
        self.quiz.reset();
        self.show_screen(Screen::Welcome);
    }

    /// Every transition cancels both countdowns.
    fn show_screen(&mut self, screen: Screen) {
        self.inactivity.cancel();
        self.auto_advance.cancel();
        self.screen = screen;

        if screen == Screen::Welcome {
            self.view.show_welcome();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::api::{ApiError, MockQuizApi},
        models::{
            domain::{AnswerStat, ScoreDistributionEntry, SessionStatus},
            dto::response::{
                AbandonSessionResponse, CompleteSessionResponse, QuestionsResponse,
                RecordAnswerResponse, StartSessionResponse,
            },
        },
        test_utils::fixtures,
    };
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Clone, Debug, PartialEq)]
    enum Shown {
        Welcome,
        Loading,
        LoadError,
        Question(usize),
        Feedback(Feedback),
        Statistics(u64),
        Results(QuizResults),
        Distribution(usize),
    }

    #[derive(Clone, Default)]
    struct RecordingView(Arc<Mutex<Vec<Shown>>>);

    impl RecordingView {
        fn push(&self, shown: Shown) {
            self.0.lock().unwrap().push(shown);
        }

        fn shown(&self) -> Vec<Shown> {
            self.0.lock().unwrap().clone()
        }
    }

    impl QuizView for RecordingView {
        fn show_welcome(&mut self) {
            self.push(Shown::Welcome);
        }

        fn show_loading(&mut self) {
            self.push(Shown::Loading);
        }

        fn show_load_error(&mut self, _error: &QuizError) {
            self.push(Shown::LoadError);
        }

        fn show_question(&mut self, number: usize, _total: usize, _score: u32, _q: &QuizQuestion) {
            self.push(Shown::Question(number));
        }

        fn show_feedback(&mut self, feedback: &Feedback) {
            self.push(Shown::Feedback(*feedback));
        }

        fn show_statistics(&mut self, statistics: &AnswerStatistics) {
            self.push(Shown::Statistics(statistics.total_responses));
        }

        fn show_results(&mut self, results: &QuizResults) {
            self.push(Shown::Results(*results));
        }

        fn show_score_distribution(&mut self, distribution: &ScoreDistributionResponse) {
            self.push(Shown::Distribution(distribution.distribution.len()));
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            inactivity_timeout: Duration::from_secs(30),
            auto_advance_timeout: Duration::from_secs(10),
            ..ClientConfig::default()
        }
    }

    fn mock_api() -> MockQuizApi {
        let mut api = MockQuizApi::new();
        api.expect_get_questions()
            .returning(|| Ok(QuestionsResponse::from(fixtures::questions())));
        api.expect_start_session().returning(|| {
            Ok(StartSessionResponse {
                session_id: "s-1".into(),
                timestamp: "2025-05-04T10:00:00.000Z".into(),
            })
        });
        api.expect_record_answer().returning(|_, question_id, slot| {
            let stat = AnswerStat::first(question_id, slot);
            Ok(RecordAnswerResponse {
                correct: false,
                correct_answer_index: slot,
                statistics: AnswerStatistics::new(&stat, slot),
            })
        });
        api
    }

    fn controller(api: MockQuizApi) -> (QuizController<RecordingView>, RecordingView) {
        let view = RecordingView::default();
        let controller = QuizController::new(Arc::new(api), view.clone(), &config());
        (controller, view)
    }

    fn statistics_shown(view: &RecordingView) -> usize {
        view.shown()
            .iter()
            .filter(|s| matches!(s, Shown::Statistics(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_resets_and_abandons_session() {
        let abandoned = Arc::new(Mutex::new(Vec::new()));
        let seen = abandoned.clone();
        let mut api = mock_api();
        api.expect_abandon_session().times(1).returning(move |id| {
            seen.lock().unwrap().push(id.to_string());
            Ok(AbandonSessionResponse {
                session_id: id.to_string(),
                status: SessionStatus::Abandoned,
            })
        });
        let (mut controller, view) = controller(api);

        controller.handle(UiEvent::Start).await;
        assert_eq!(controller.screen(), Screen::Question);
        let shown_at = Instant::now();

        controller.step().await;

        assert!(shown_at.elapsed() >= Duration::from_secs(30));
        assert_eq!(controller.screen(), Screen::Welcome);
        assert_eq!(controller.quiz().state(), crate::client::QuizState::NotStarted);
        assert_eq!(view.shown().last(), Some(&Shown::Welcome));

        controller.quiz().shutdown(Duration::from_secs(1)).await;
        assert_eq!(abandoned.lock().unwrap().as_slice(), &["s-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_shows_statistics_then_auto_advances() {
        let (mut controller, view) = controller(mock_api());

        controller.handle(UiEvent::Start).await;
        controller.handle(UiEvent::SelectAnswer(0)).await;
        let answered_at = Instant::now();

        controller.step().await;
        assert_eq!(statistics_shown(&view), 1);

        controller.step().await;
        assert!(answered_at.elapsed() >= Duration::from_secs(10));
        assert!(answered_at.elapsed() < Duration::from_secs(30));
        assert_eq!(controller.quiz().question_number(), 2);
        assert_eq!(view.shown().last(), Some(&Shown::Question(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_next_cancels_auto_advance_and_drops_late_statistics() {
        let (mut controller, view) = controller(mock_api());

        controller.handle(UiEvent::Start).await;
        controller.handle(UiEvent::SelectAnswer(1)).await;
        controller.handle(UiEvent::Next).await;
        assert_eq!(controller.quiz().question_number(), 2);

        tokio::time::sleep(Duration::from_secs(15)).await;
        controller.pump_pending().await;

        assert_eq!(controller.quiz().question_number(), 2);
        assert_eq!(controller.screen(), Screen::Question);
        assert_eq!(statistics_shown(&view), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_answer_is_tracked_until_shutdown() {
        let (mut controller, view) = controller(mock_api());

        controller.handle(UiEvent::Start).await;
        controller.handle(UiEvent::SelectAnswer(0)).await;
        assert_eq!(controller.quiz().pending_background(), 1);

        controller.quiz().shutdown(Duration::from_secs(1)).await;
        assert_eq!(controller.quiz().pending_background(), 0);

        controller.pump_pending().await;
        assert_eq!(statistics_shown(&view), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_requires_an_answer() {
        let (mut controller, _view) = controller(mock_api());

        controller.handle(UiEvent::Start).await;
        controller.handle(UiEvent::Next).await;

        assert_eq!(controller.quiz().question_number(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_event_is_ignored() {
        let (mut controller, _view) = controller(mock_api());
        controller.handle(UiEvent::Start).await;

        controller
            .events_tx
            .send(ControllerEvent::Timer(TimerFired {
                kind: TimerKind::Inactivity,
                generation: 0,
            }))
            .unwrap();
        controller.pump_pending().await;

        assert_eq!(controller.screen(), Screen::Question);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishing_quiz_shows_results() {
        let mut api = mock_api();
        api.expect_complete_session()
            .times(1)
            .returning(|id, score, total| {
                Ok(CompleteSessionResponse {
                    session_id: id.to_string(),
                    final_score: score,
                    total_questions: total,
                    percentage: 100.0,
                    timestamp: "2025-05-04T10:05:00.000Z".into(),
                })
            });
        api.expect_score_distribution().returning(|| {
            Ok(ScoreDistributionResponse::from(vec![
                ScoreDistributionEntry { score: 1, count: 2 },
                ScoreDistributionEntry { score: 3, count: 1 },
            ]))
        });
        let (mut controller, view) = controller(api);

        controller.handle(UiEvent::Start).await;
        for _ in 0..3 {
            let correct = controller
                .quiz()
                .current_question()
                .and_then(QuizQuestion::correct_position)
                .unwrap();
            controller.handle(UiEvent::SelectAnswer(correct)).await;
            controller.handle(UiEvent::Next).await;
        }

        assert_eq!(controller.screen(), Screen::Results);
        let shown = view.shown();
        assert!(shown.contains(&Shown::Results(QuizResults {
            score: 3,
            total: 3,
            percentage: 100,
            tier: ResultTier::Perfect,
        })));
        assert_eq!(shown.last(), Some(&Shown::Distribution(2)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        controller.pump_pending().await;
        assert_eq!(controller.screen(), Screen::Results);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_stays_on_welcome() {
        let mut api = MockQuizApi::new();
        api.expect_get_questions()
            .returning(|| Err(ApiError::Network("connection refused".into())));
        let (mut controller, view) = controller(api);

        controller.handle(UiEvent::Start).await;

        assert_eq!(controller.screen(), Screen::Welcome);
        assert!(view.shown().contains(&Shown::LoadError));
    }
}
