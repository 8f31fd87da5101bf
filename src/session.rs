use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attempt::{QuizSession, QuizSessionSnapshot};
use crate::errors::SessionError;
use crate::export::{export_file_name, render_quiz_text};
use crate::models::{
    ArticleSummary, FetchOutcome, HeadlineQuery, Phase, QuestionId, ScoreReport, SessionSnapshot,
};
use crate::news_fetcher::NewsSource;
use crate::quiz_generator::QuizGenerator;
use crate::summarizer::Summarizer;
use crate::{log_performance, log_service_start, log_service_success, log_service_warn};

pub const NO_ARTICLES_NOTICE: &str = "No articles found or API limit reached.";

/// Plain-text quiz download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizExport {
    pub file_name: String,
    pub content: String,
}

/// Everything one user has on screen: fetched summaries, the quiz attempt and
/// which phase is active.
#[derive(Debug, Clone)]
pub struct UserSession {
    id: Uuid,
    phase: Phase,
    summaries: Vec<ArticleSummary>,
    quiz: QuizSession,
    show_summary_again: bool,
    created_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            phase: Phase::Main,
            summaries: Vec::new(),
            quiz: QuizSession::new(),
            show_summary_again: false,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn summaries(&self) -> &[ArticleSummary] {
        &self.summaries
    }

    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    pub fn show_summary_again(&self) -> bool {
        self.show_summary_again
    }

    fn require_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Replace the summaries and drop any quiz built from the previous ones
    pub fn replace_summaries(&mut self, summaries: Vec<ArticleSummary>) -> Result<(), SessionError> {
        self.require_phase(Phase::Main)?;
        self.summaries = summaries;
        self.quiz.discard();
        self.show_summary_again = false;
        Ok(())
    }

    pub fn select_answer(&mut self, id: QuestionId, option: &str) -> Result<(), SessionError> {
        self.require_phase(Phase::Quiz)?;
        self.quiz.select_answer(id, option)
    }

    pub fn submit(&mut self) -> Result<ScoreReport, SessionError> {
        self.require_phase(Phase::Quiz)?;
        self.quiz.submit()
    }

    /// Leave the quiz: answers are cleared, questions are kept for the next visit
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Quiz)?;
        self.quiz.reset();
        self.phase = Phase::Main;
        self.show_summary_again = true;
        Ok(())
    }

    pub fn export_quiz(&self, at: DateTime<Utc>) -> Result<QuizExport, SessionError> {
        if !self.quiz.is_generated() {
            return Err(SessionError::QuizNotGenerated);
        }
        Ok(QuizExport {
            file_name: export_file_name(at),
            content: render_quiz_text(self.quiz.question_sets()),
        })
    }

    pub fn quiz_snapshot(&self) -> QuizSessionSnapshot {
        self.quiz.snapshot()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            summaries: self.summaries.clone(),
            show_summary_again: self.show_summary_again,
            quiz: self.quiz.snapshot(),
            created_at: self.created_at,
        }
    }
}

impl Default for UserSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the actions that need collaborators (news, summarizer, quiz
/// generation) against a user session.
#[derive(Clone)]
pub struct QuizService {
    news: Arc<dyn NewsSource>,
    summarizer: Arc<dyn Summarizer>,
    quiz_generator: QuizGenerator,
    default_query: HeadlineQuery,
}

impl QuizService {
    pub fn new(
        news: Arc<dyn NewsSource>,
        summarizer: Arc<dyn Summarizer>,
        quiz_generator: QuizGenerator,
        default_query: HeadlineQuery,
    ) -> Self {
        Self {
            news,
            summarizer,
            quiz_generator,
            default_query,
        }
    }

    pub fn default_query(&self) -> &HeadlineQuery {
        &self.default_query
    }

    pub fn questions_per_summary(&self) -> usize {
        self.quiz_generator.questions_per_summary()
    }

    /// Fetch headlines and summarize each article in order.
    ///
    /// Upstream failure yields an empty result with a notice. An article whose
    /// summary cannot be produced keeps its own content as the summary.
    pub async fn fetch_and_summarize(
        &self,
        session: &mut UserSession,
        query: &HeadlineQuery,
    ) -> Result<FetchOutcome, SessionError> {
        session.require_phase(Phase::Main)?;
        log_service_start!("quiz_service", "fetch_and_summarize", session_id = session.id());
        let started = Instant::now();

        let articles = match self.news.top_headlines(query).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    error = %e,
                    "Headline fetch failed"
                );
                Vec::new()
            }
        };

        let mut summaries = Vec::with_capacity(articles.len());
        for (index, article) in articles.into_iter().enumerate() {
            let summary = match self.summarizer.summarize(&article.content).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(
                        article_index = index,
                        title = %article.title,
                        error = %e,
                        "Summarization failed, using article content"
                    );
                    article.content.clone()
                }
            };
            debug!(article_index = index, summary_length = summary.len(), "Article summarized");
            summaries.push(ArticleSummary { article, summary });
        }

        let notice = if summaries.is_empty() {
            log_service_warn!("quiz_service", "fetch_and_summarize", NO_ARTICLES_NOTICE);
            Some(NO_ARTICLES_NOTICE.to_string())
        } else {
            None
        };

        let outcome = FetchOutcome {
            article_count: summaries.len(),
            summaries: summaries.clone(),
            notice,
        };
        session.replace_summaries(summaries)?;

        let duration_ms = started.elapsed().as_millis() as u64;
        log_performance!("fetch_and_summarize", duration_ms = duration_ms, count = outcome.article_count);
        log_service_success!(
            "quiz_service",
            "fetch_and_summarize",
            session_id = session.id(),
            duration_ms = duration_ms
        );

        Ok(outcome)
    }

    /// Switch to the quiz phase, generating questions the first time
    pub async fn enter_quiz(
        &self,
        session: &mut UserSession,
    ) -> Result<QuizSessionSnapshot, SessionError> {
        session.require_phase(Phase::Main)?;
        if session.summaries.is_empty() {
            return Err(SessionError::NoSummaries);
        }

        if session.quiz.is_generated() {
            debug!(session_id = %session.id(), "Reusing previously generated quiz");
        } else {
            log_service_start!("quiz_service", "generate_quiz", session_id = session.id());
            let started = Instant::now();

            let texts: Vec<String> = session.summaries.iter().map(|s| s.summary.clone()).collect();
            let question_sets = self.quiz_generator.generate_batch(&texts).await;
            session.quiz.load(question_sets);

            log_service_success!(
                "quiz_service",
                "generate_quiz",
                session_id = session.id(),
                duration_ms = started.elapsed().as_millis() as u64
            );
        }

        session.phase = Phase::Quiz;
        session.show_summary_again = false;
        info!(
            session_id = %session.id(),
            questions = session.quiz.total_questions(),
            "Entered quiz phase"
        );

        Ok(session.quiz.snapshot())
    }
}
