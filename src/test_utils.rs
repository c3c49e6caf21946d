use crate::{models::domain::Question, store::Row};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    /// A three question catalog including its header row.
    pub fn question_rows() -> Vec<Row> {
        vec![
            row(&["id", "question", "answer0", "answer1", "answer2", "correctIndex"]),
            row(&["q-1", "Closest star to Earth?", "The Sun", "Sirius", "Vega", "0"]),
            row(&["q-2", "Largest planet?", "Mars", "Earth", "Jupiter", "2"]),
            row(&["q-3", "Galaxy we live in?", "Andromeda", "Milky Way", "Triangulum", "1"]),
        ]
    }

    pub fn questions() -> Vec<Question> {
        question_rows()
            .iter()
            .skip(1)
            .map(|r| Question::from_row(r).expect("fixture rows are well formed"))
            .collect()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixture_catalog() {
        let questions = questions();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].answers[0], "The Sun");
        assert_eq!(questions[1].correct_index.get(), 2);
    }
}
