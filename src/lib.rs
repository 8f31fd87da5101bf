pub mod answer_resolver;
pub mod api;
pub mod attempt;
pub mod config;
pub mod errors;
pub mod export;
pub mod llm_providers;
pub mod logging;
pub mod models;
pub mod news_fetcher;
pub mod quiz_generator;
pub mod quiz_parser;
pub mod session;
pub mod session_store;
pub mod summarizer;

pub use attempt::{AttemptState, QuizSession};
pub use errors::*;
pub use llm_providers::{LLMProvider, LLMProviderFactory, LLMProviderType, TextGenerator};
pub use models::*;
pub use news_fetcher::{NewsApiClient, NewsSource};
pub use quiz_generator::QuizGenerator;
pub use session::{QuizService, UserSession};
pub use session_store::SessionStore;
pub use summarizer::{LlmSummarizer, Summarizer};
