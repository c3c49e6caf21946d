use std::sync::Arc;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use astro_quiz::{
    client::{
        controller::{Feedback, QuizResults},
        quiz::{QuizError, QuizQuestion},
        HttpQuizApi, QuizController, QuizView, UiEvent,
    },
    config::ClientConfig,
    models::dto::response::{AnswerStatistics, ScoreDistributionResponse},
};

/// Plain stdout rendering of the quiz screens.
struct TerminalView {
    total: usize,
}

impl QuizView for TerminalView {
    fn show_welcome(&mut self) {
        println!();
        println!("=== AstroQuiz ===");
        println!("Type 's' to start, 'q' to quit.");
    }

    fn show_loading(&mut self) {
        println!("Loading...");
    }

    fn show_load_error(&mut self, error: &QuizError) {
        println!("Could not reach the quiz server: {}", error);
    }

    fn show_question(&mut self, number: usize, total: usize, score: u32, question: &QuizQuestion) {
        self.total = total;
        println!();
        println!("Question {}/{}  (score {})", number, total, score);
        println!("{}", question.prompt);
        for (i, answer) in question.answers.iter().enumerate() {
            println!("  {}) {}", i + 1, answer.text);
        }
    }

    fn show_feedback(&mut self, feedback: &Feedback) {
        if feedback.correct {
            println!("Correct!");
        } else {
            println!(
                "Wrong! The right answer was {}.",
                feedback.correct_position + 1
            );
        }
        println!("Type 'n' for the next question.");
    }

    fn show_statistics(&mut self, statistics: &AnswerStatistics) {
        if statistics.total_responses == 0 {
            return;
        }
        let noun = if statistics.total_responses == 1 {
            "response"
        } else {
            "responses"
        };
        println!(
            "{:.1}% of players answered correctly (out of {} {})",
            statistics.correct_percentage, statistics.total_responses, noun
        );
    }

    fn show_results(&mut self, results: &QuizResults) {
        println!();
        println!(
            "You scored {}/{} ({}%)",
            results.score, results.total, results.percentage
        );
        println!("{}", results.tier.message());
        println!("Type 'r' to play again, 'q' to quit.");
    }

    fn show_score_distribution(&mut self, distribution: &ScoreDistributionResponse) {
        println!();
        println!("Score distribution:");
        for entry in &distribution.distribution {
            println!(
                "  {:>3} points | {}",
                entry.score,
                "#".repeat(entry.count.min(60) as usize)
            );
        }
        println!(
            "Average score: {} out of {}  Total responses: {}",
            distribution.statistics.average_score,
            self.total,
            distribution.statistics.total_responses
        );
    }
}

fn parse_command(line: &str) -> Option<UiEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "start" => Some(UiEvent::Start),
        "n" | "next" => Some(UiEvent::Next),
        "r" | "restart" => Some(UiEvent::Restart),
        choice => choice
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| UiEvent::SelectAnswer(n - 1)),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let config = ClientConfig::from_env();
    let api = HttpQuizApi::new(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    log::info!("Using quiz API at {}", config.api_base_url);

    let controller = QuizController::new(Arc::new(api), TerminalView { total: 0 }, &config);
    let (tx, rx) = mpsc::channel(16);
    let ui = tokio::spawn(controller.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        match parse_command(trimmed) {
            Some(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            None => println!("Unknown command '{}'", trimmed),
        }
    }

    drop(tx);
    if let Err(e) = ui.await {
        log::error!("Quiz controller stopped unexpectedly: {}", e);
    }
    Ok(())
}
