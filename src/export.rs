use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::QuestionSet;

pub const EXPORT_HEADER: &str = "QUIZ QUESTIONS";

const OPTION_LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Render all question sets as a plain-text download.
///
/// Options are lettered by position; the `Answer:` line repeats the letter as
/// the generator stored it.
pub fn render_quiz_text(question_sets: &[QuestionSet]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", EXPORT_HEADER);
    let _ = writeln!(out);

    let questions = question_sets.iter().flat_map(QuestionSet::iter);
    for (number, question) in questions.enumerate() {
        let _ = writeln!(out, "Q{}: {}", number + 1, question.text);
        for (letter, option) in OPTION_LETTERS.iter().zip(&question.options) {
            let _ = writeln!(out, "{}) {}", letter, option);
        }
        let _ = writeln!(out, "Answer: {}", question.answer_letter);
        let _ = writeln!(out);
    }

    out
}

/// `quiz_YYYYMMDD_HHMMSS.txt` for the given moment
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("quiz_{}.txt", at.format("%Y%m%d_%H%M%S"))
}
