use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::GenerationError;
use crate::llm_providers::TextGenerator;
use crate::models::QuestionSet;
use crate::quiz_parser::parse_questions;
use crate::{log_llm_operation, log_performance};

pub const DEFAULT_QUESTIONS_PER_SUMMARY: usize = 3;

const SYSTEM_MESSAGE: &str = "You are a quiz maker AI. Reply only with quiz questions in the requested plain-text format.";

/// Prompt asking for `count` multiple-choice questions about `summary`
pub fn build_quiz_prompt(summary: &str, count: usize) -> String {
    format!(
        r#"Based on the following news summary:
"{}"

Generate {} multiple-choice questions.
Follow this exact format for each question:

Question: <question text>
A) <option 1>
B) <option 2>
C) <option 3>
D) <option 4>
Answer: <correct option letter>"#,
        summary, count
    )
}

/// Turns summaries into question sets, one generation call per summary
#[derive(Clone)]
pub struct QuizGenerator {
    generator: Arc<dyn TextGenerator>,
    questions_per_summary: usize,
}

impl QuizGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, questions_per_summary: usize) -> Self {
        Self {
            generator,
            questions_per_summary: questions_per_summary.max(1),
        }
    }

    pub fn questions_per_summary(&self) -> usize {
        self.questions_per_summary
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    /// Generate and parse questions for a single summary
    pub async fn generate_quiz(
        &self,
        summary: &str,
        count: usize,
    ) -> Result<QuestionSet, GenerationError> {
        let count = count.max(1);
        let prompt = build_quiz_prompt(summary, count);

        let response_text = self
            .generator
            .generate(Some(SYSTEM_MESSAGE), &prompt)
            .await
            .map_err(GenerationError::Provider)?;

        debug!(
            summary_length = summary.len(),
            response_content = %response_text,
            "Raw LLM response for quiz generation"
        );

        parse_questions(response_text.trim(), count)
    }

    /// Generate question sets for every summary, in order.
    ///
    /// Always returns exactly one set per summary: a summary whose generation
    /// fails gets a set holding a single placeholder question.
    pub async fn generate_batch(&self, summaries: &[String]) -> Vec<QuestionSet> {
        let started = Instant::now();
        log_llm_operation!(
            start,
            "generate_quiz",
            provider = self.generator.provider_name(),
            summary_count = summaries.len()
        );

        let mut sets = Vec::with_capacity(summaries.len());
        let mut failures = 0usize;

        for (index, summary) in summaries.iter().enumerate() {
            match self.generate_quiz(summary, self.questions_per_summary).await {
                Ok(set) => {
                    info!(
                        summary_index = index,
                        question_count = set.len(),
                        "Generated quiz questions for summary"
                    );
                    sets.push(set);
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        summary_index = index,
                        error = %e,
                        "Quiz generation failed for summary, using placeholder question"
                    );
                    sets.push(QuestionSet::placeholder(&e));
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        log_llm_operation!(
            success,
            "generate_quiz",
            provider = self.generator.provider_name(),
            duration_ms = duration_ms,
            failures = failures
        );
        log_performance!("generate_quiz", duration_ms = duration_ms);

        sets
    }
}
