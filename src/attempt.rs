//! Quiz attempt state: which option the user picked for each question, and
//! grading of those picks.
//!
//! ```text
//! Unattempted --select_answer--> InProgress --submit--> Submitted
//!      ^                                                    |
//!      +----------------------- reset ----------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::answer_resolver::{self, normalize_letter};
use crate::errors::SessionError;
use crate::models::{Question, QuestionId, QuestionResult, QuestionSet, ScoreReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    #[default]
    Unattempted,
    InProgress,
    Submitted,
}

impl AttemptState {
    pub const fn accepts_answers(&self) -> bool {
        matches!(self, Self::Unattempted | Self::InProgress)
    }
}

/// One recorded selection, as exposed in snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    pub id: QuestionId,
    pub selected: String,
}

/// Question as shown to the user: always exactly four options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub number: usize,
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSessionSnapshot {
    pub state: AttemptState,
    pub generated: bool,
    pub answered: usize,
    pub total: usize,
    pub questions: Vec<QuestionView>,
    pub answers: Vec<RecordedAnswer>,
}

/// All question sets of the current attempt plus the user's selections
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    question_sets: Vec<QuestionSet>,
    answers: BTreeMap<QuestionId, String>,
    state: AttemptState,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_question_sets(question_sets: Vec<QuestionSet>) -> Self {
        Self {
            question_sets,
            ..Self::default()
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn is_generated(&self) -> bool {
        !self.question_sets.is_empty()
    }

    pub fn question_sets(&self) -> &[QuestionSet] {
        &self.question_sets
    }

    /// Install freshly generated question sets, starting a new attempt
    pub fn load(&mut self, question_sets: Vec<QuestionSet>) {
        self.question_sets = question_sets;
        self.reset();
    }

    /// Drop the questions as well as the answers
    pub fn discard(&mut self) {
        self.question_sets.clear();
        self.reset();
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.question_sets
            .get(id.summary_index)
            .and_then(|set| set.get(id.question_index))
    }

    /// Every question with its id, summary-major then question order
    pub fn questions(&self) -> impl Iterator<Item = (QuestionId, &Question)> {
        self.question_sets
            .iter()
            .enumerate()
            .flat_map(|(summary_index, set)| {
                set.iter().enumerate().map(move |(question_index, question)| {
                    (QuestionId::new(summary_index, question_index), question)
                })
            })
    }

    pub fn total_questions(&self) -> usize {
        self.question_sets.iter().map(QuestionSet::len).sum()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn selection(&self, id: QuestionId) -> Option<&str> {
        self.answers.get(&id).map(String::as_str)
    }

    /// Record `option` as the selection for `id`, replacing any earlier one
    pub fn select_answer(&mut self, id: QuestionId, option: &str) -> Result<(), SessionError> {
        if !self.state.accepts_answers() {
            return Err(SessionError::AlreadySubmitted);
        }

        let question = self.question(id).ok_or(SessionError::UnknownQuestion(id))?;
        if !question.display_options().iter().any(|o| o == option) {
            return Err(SessionError::InvalidOption {
                id,
                option: option.to_string(),
            });
        }

        self.answers.insert(id, option.to_string());
        self.state = AttemptState::InProgress;
        Ok(())
    }

    /// Grade every question and move to `Submitted`.
    ///
    /// Repeated calls recompute the same report from the stored answers.
    pub fn submit(&mut self) -> Result<ScoreReport, SessionError> {
        if !self.is_generated() {
            return Err(SessionError::QuizNotGenerated);
        }

        let results: Vec<QuestionResult> = self
            .questions()
            .enumerate()
            .map(|(position, (id, question))| {
                let selected = self.selection(id);
                QuestionResult {
                    number: position + 1,
                    id,
                    question: question.text.clone(),
                    selected: selected.map(str::to_string),
                    correct_letter: normalize_letter(&question.answer_letter),
                    correct_text: question.correct_answer().to_string(),
                    is_correct: answer_resolver::is_correct(question, selected),
                }
            })
            .collect();

        let score = results.iter().filter(|r| r.is_correct).count();
        let total = results.len();

        self.state = AttemptState::Submitted;
        Ok(ScoreReport {
            score,
            total,
            results,
        })
    }

    /// Clear all answers and return to `Unattempted`
    pub fn reset(&mut self) {
        self.answers.clear();
        self.state = AttemptState::Unattempted;
    }

    pub fn snapshot(&self) -> QuizSessionSnapshot {
        QuizSessionSnapshot {
            state: self.state,
            generated: self.is_generated(),
            answered: self.answered_count(),
            total: self.total_questions(),
            questions: self
                .questions()
                .enumerate()
                .map(|(position, (id, question))| QuestionView {
                    number: position + 1,
                    id,
                    text: question.text.clone(),
                    options: question.display_options(),
                    selected: self.selection(id).map(str::to_string),
                })
                .collect(),
            answers: self
                .answers
                .iter()
                .map(|(id, selected)| RecordedAnswer {
                    id: *id,
                    selected: selected.clone(),
                })
                .collect(),
        }
    }
}
