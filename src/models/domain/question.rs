use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, AppResult},
    store::Row,
};

pub const QUESTIONS_HEADER: [&str; 6] = [
    "questionID",
    "question",
    "answer0",
    "answer1",
    "answer2",
    "correctAnswerIndex",
];

/// Position of an answer in the catalog, always 0, 1 or 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct AnswerIndex(u8);

impl AnswerIndex {
    pub const SLOTS: usize = 3;

    pub fn new(index: usize) -> Option<Self> {
        (index < Self::SLOTS).then_some(Self(index as u8))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> [AnswerIndex; Self::SLOTS] {
        [AnswerIndex(0), AnswerIndex(1), AnswerIndex(2)]
    }
}

impl TryFrom<i64> for AnswerIndex {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(AnswerIndex::new)
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "answer index must be 0, 1, or 2 (got {})",
                    value
                ))
            })
    }
}

impl From<AnswerIndex> for u8 {
    fn from(index: AnswerIndex) -> Self {
        index.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub answers: [String; AnswerIndex::SLOTS],
    pub correct_index: AnswerIndex,
}

impl Question {
    /// Maps a catalog row `id | question | answer0 | answer1 | answer2 | correctIndex`.
    pub fn from_row(row: &Row) -> AppResult<Self> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let id = cell(0);

        let raw_index = cell(5);
        let correct_index = raw_index
            .trim()
            .parse::<i64>()
            .map_err(|_| {
                AppError::MalformedData(format!(
                    "question '{}' has a non-numeric correct index '{}'",
                    id, raw_index
                ))
            })
            .and_then(|value| {
                AnswerIndex::try_from(value).map_err(|_| {
                    AppError::MalformedData(format!(
                        "question '{}' has correct index {} outside 0-2",
                        id, value
                    ))
                })
            })?;

        Ok(Self {
            prompt: cell(1),
            answers: [cell(2), cell(3), cell(4)],
            correct_index,
            id,
        })
    }

    pub fn is_correct(&self, selected: AnswerIndex) -> bool {
        self.correct_index == selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_question_from_row() {
        let question = Question::from_row(&row(&[
            "q-1",
            "Which planet is largest?",
            "Mars",
            "Jupiter",
            "Venus",
            "1",
        ]))
        .unwrap();

        assert_eq!(question.id, "q-1");
        assert_eq!(question.answers[1], "Jupiter");
        assert_eq!(question.correct_index.get(), 1);
        assert!(question.is_correct(AnswerIndex::new(1).unwrap()));
    }

    #[test]
    fn test_non_numeric_correct_index_is_malformed() {
        let result = Question::from_row(&row(&["q-1", "?", "a", "b", "c", "first"]));
        assert!(matches!(result, Err(AppError::MalformedData(_))));
    }

    #[test]
    fn test_missing_correct_index_is_malformed() {
        let result = Question::from_row(&row(&["q-1", "?", "a"]));
        assert!(matches!(result, Err(AppError::MalformedData(_))));
    }

    #[test]
    fn test_out_of_range_correct_index_is_malformed() {
        let result = Question::from_row(&row(&["q-1", "?", "a", "b", "c", "3"]));
        assert!(matches!(result, Err(AppError::MalformedData(_))));
    }

    #[test]
    fn test_question_serializes_with_api_field_names() {
        let question = Question::from_row(&row(&["q-7", "Closest star?", "Sirius", "Sun", "Vega", "1"]))
            .unwrap();
        let json = serde_json::to_value(&question).unwrap();

        assert_eq!(json["question"], "Closest star?");
        assert_eq!(json["correctIndex"], 1);
        assert_eq!(json["answers"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_answer_index_bounds() {
        assert!(AnswerIndex::try_from(-1).is_err());
        assert!(AnswerIndex::try_from(3).is_err());
        assert_eq!(AnswerIndex::try_from(2).unwrap().get(), 2);
        assert!(serde_json::from_str::<AnswerIndex>("5").is_err());
    }
}
