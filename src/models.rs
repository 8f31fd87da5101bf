use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::attempt::QuizSessionSnapshot;

/// Number of options shown for every multiple-choice question
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Filler used when a generated question has fewer than four options
pub const MISSING_OPTION: &str = "N/A";

/// A single multiple-choice question parsed from generated text.
///
/// `options` keeps whatever the generator produced, in order. `answer_letter`
/// is stored exactly as generated; see [`crate::answer_resolver`] for how it
/// is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub answer_letter: String,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        answer_letter: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options,
            answer_letter: answer_letter.into(),
        }
    }

    /// Synthetic question used in place of a quiz that could not be generated
    pub fn placeholder(reason: &impl fmt::Display) -> Self {
        Self {
            text: format!("Error generating quiz: {}", reason),
            options: ["Option A", "Option B", "Option C", "Option D"]
                .iter()
                .map(|o| o.to_string())
                .collect(),
            answer_letter: "A".to_string(),
        }
    }

    /// Options padded or truncated to exactly four entries for display
    pub fn display_options(&self) -> Vec<String> {
        let mut options: Vec<String> = self
            .options
            .iter()
            .take(OPTIONS_PER_QUESTION)
            .cloned()
            .collect();
        options.resize(OPTIONS_PER_QUESTION, MISSING_OPTION.to_string());
        options
    }

    /// Text of the option the stored answer letter points at, or the sentinel
    pub fn correct_answer(&self) -> &str {
        crate::answer_resolver::resolve_answer(self, &self.answer_letter)
    }
}

/// Questions generated from one summary. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn placeholder(reason: &impl fmt::Display) -> Self {
        Self::new(vec![Question::placeholder(reason)])
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

/// Stable identity of a question within a quiz session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId {
    pub summary_index: usize,
    pub question_index: usize,
}

impl QuestionId {
    pub const fn new(summary_index: usize, question_index: usize) -> Self {
        Self {
            summary_index,
            question_index,
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "summary {} question {}", self.summary_index, self.question_index)
    }
}

/// Which screen of the application is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Main,
    Quiz,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Main => write!(f, "main"),
            Phase::Quiz => write!(f, "quiz"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub content: String,
    pub url: String,
}

/// Query sent to the news source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineQuery {
    pub country: String,
    pub category: String,
    pub page_size: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub article: Article,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub article_count: usize,
    pub summaries: Vec<ArticleSummary>,
    pub notice: Option<String>,
}

/// Grading outcome of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub number: usize,
    pub id: QuestionId,
    pub question: String,
    pub selected: Option<String>,
    pub correct_letter: String,
    pub correct_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

/// Serializable view of a user session handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    pub summaries: Vec<ArticleSummary>,
    pub show_summary_again: bool,
    pub quiz: QuizSessionSnapshot,
    pub created_at: DateTime<Utc>,
}
