use serde::Serialize;

use crate::{
    errors::AppResult,
    models::domain::{question::AnswerIndex, round_to},
    store::{parse_count, Row},
};

pub const ANSWER_STATS_HEADER: [&str; 5] = [
    "questionID",
    "answer0Count",
    "answer1Count",
    "answer2Count",
    "totalResponses",
];

/// All-time answer counters for one question, one per catalog slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerStat {
    pub question_id: String,
    pub counts: [u64; AnswerIndex::SLOTS],
    pub total: u64,
}

impl AnswerStat {
    /// Stats for a question answered for the first time.
    pub fn first(question_id: &str, selected: AnswerIndex) -> Self {
        let mut stat = Self {
            question_id: question_id.to_string(),
            counts: [0; AnswerIndex::SLOTS],
            total: 0,
        };
        stat.record(selected);
        stat
    }

    pub fn from_row(row: &Row) -> AppResult<Self> {
        Ok(Self {
            question_id: row.first().cloned().unwrap_or_default(),
            counts: [
                parse_count(row.get(1))?,
                parse_count(row.get(2))?,
                parse_count(row.get(3))?,
            ],
            total: parse_count(row.get(4))?,
        })
    }

    pub fn record(&mut self, selected: AnswerIndex) {
        self.counts[selected.get()] += 1;
        self.total += 1;
    }

    pub fn to_row(&self) -> Row {
        let mut row = vec![self.question_id.clone()];
        row.extend(self.counter_cells());
        row
    }

    /// The `B:E` cells of the row.
    pub fn counter_cells(&self) -> Row {
        self.counts
            .iter()
            .chain(std::iter::once(&self.total))
            .map(|c| c.to_string())
            .collect()
    }

    /// Share of responses that picked `correct`, one decimal.
    pub fn correct_percentage(&self, correct: AnswerIndex) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round_to(
            self.counts[correct.get()] as f64 / self.total as f64 * 100.0,
            1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn index(i: usize) -> AnswerIndex {
        AnswerIndex::new(i).unwrap()
    }

    #[test]
    fn test_first_answer_seeds_selected_slot() {
        let stat = AnswerStat::first("q-1", index(0));

        assert_eq!(stat.counts, [1, 0, 0]);
        assert_eq!(stat.total, 1);
        assert_eq!(stat.to_row(), vec!["q-1", "1", "0", "0", "1"]);
    }

    #[test]
    fn test_from_row_treats_blank_cells_as_zero() {
        let row: Row = vec!["q-1".into(), "4".into(), "".into()];
        let stat = AnswerStat::from_row(&row).unwrap();

        assert_eq!(stat.counts, [4, 0, 0]);
        assert_eq!(stat.total, 0);
    }

    #[test]
    fn test_from_row_rejects_garbage_counters() {
        let row: Row = vec!["q-1".into(), "many".into()];
        assert!(matches!(
            AnswerStat::from_row(&row),
            Err(AppError::MalformedData(_))
        ));
    }

    #[test]
    fn test_correct_percentage_rounds_to_one_decimal() {
        let stat = AnswerStat {
            question_id: "q-1".into(),
            counts: [1, 2, 0],
            total: 3,
        };

        assert_eq!(stat.correct_percentage(index(1)), 66.7);
        assert_eq!(stat.correct_percentage(index(2)), 0.0);
    }
}
