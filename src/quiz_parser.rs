//! Parser for the plain-text quiz format the generator is prompted to emit:
//!
//! ```text
//! Question: <question text>
//! A) <option 1>
//! B) <option 2>
//! C) <option 3>
//! D) <option 4>
//! Answer: <correct option letter>
//! ```
//!
//! Any line that is not a question, option, or answer line is treated as
//! filler and skipped. Option count and answer letters are not validated
//! here; [`crate::answer_resolver`] deals with malformed keys.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::errors::GenerationError;
use crate::models::{Question, QuestionSet};

static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^question").expect("question marker regex"));
static ANSWER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^answer").expect("answer marker regex"));
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]\)(?P<text>.*)$").expect("option line regex"));

#[derive(Debug, Default)]
struct Draft {
    text: String,
    options: Vec<String>,
    answer: String,
}

impl Draft {
    fn into_question(self) -> Option<Question> {
        if self.text.is_empty() {
            return None;
        }
        Some(Question::new(self.text, self.options, self.answer))
    }
}

/// Everything after the first colon, or the whole line when there is none
fn after_colon(line: &str) -> &str {
    line.split_once(':').map_or(line, |(_, rest)| rest).trim()
}

/// Parse every question block in `text`, in order of appearance
pub fn parse_quiz_text(text: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut current = Draft::default();

    for line in text.lines().map(str::trim) {
        if QUESTION_MARKER.is_match(line) {
            // options collected before any question text stay with this record
            if !current.text.is_empty() {
                questions.extend(std::mem::take(&mut current).into_question());
            }
            current.text = after_colon(line).to_string();
        } else if let Some(captures) = OPTION_LINE.captures(line) {
            current.options.push(captures["text"].trim().to_string());
        } else if ANSWER_MARKER.is_match(line) {
            current.answer = after_colon(line).to_string();
        }
    }
    questions.extend(current.into_question());

    questions
}

/// Parse generated text into at most `count` questions.
///
/// A generation that yields no question at all is an error rather than an
/// empty set, so the caller can substitute a placeholder.
pub fn parse_questions(text: &str, count: usize) -> Result<QuestionSet, GenerationError> {
    let mut questions = parse_quiz_text(text);
    if questions.is_empty() {
        debug!(text_length = text.len(), "No question blocks found in generated text");
        return Err(GenerationError::NoQuestions);
    }

    if questions.len() > count {
        debug!(
            parsed = questions.len(),
            requested = count,
            "Dropping extra generated questions"
        );
        questions.truncate(count);
    }

    Ok(QuestionSet::new(questions))
}
