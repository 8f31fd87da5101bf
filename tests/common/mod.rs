#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use news_quiz::{
    Article, HeadlineQuery, NewsSource, QuizGenerator, QuizService, SessionStore, Summarizer,
    TextGenerator,
    api::{AppState, create_router},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const CATS_QUIZ: &str =
    "Question: What is popular?\nA) Cats\nB) Dogs\nC) Birds\nD) Fish\nAnswer: A";

pub const TWO_QUESTION_QUIZ: &str = "Here you go!\n\
    Question 1: Capital of France?\n\
    A) Rome\n\
    B) Paris\n\
    C) Oslo\n\
    D) Lima\n\
    Answer: b\n\
    \n\
    Question 2: Largest ocean?\n\
    A) Pacific\n\
    B) Atlantic\n\
    C) Indian\n\
    Answer: A";

pub fn article(title: &str, content: &str) -> Article {
    Article {
        title: title.to_string(),
        source: "Test Wire".to_string(),
        content: content.to_string(),
        url: format!("https://example.com/{}", title.to_lowercase()),
    }
}

pub fn default_query() -> HeadlineQuery {
    HeadlineQuery {
        country: "us".to_string(),
        category: "general".to_string(),
        page_size: 3,
    }
}

/// News source returning a fixed list, or failing when `articles` is `None`
pub struct StubNews {
    articles: Option<Vec<Article>>,
    pub last_query: std::sync::Mutex<Option<HeadlineQuery>>,
}

impl StubNews {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: Some(articles),
            last_query: std::sync::Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            articles: None,
            last_query: std::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl NewsSource for StubNews {
    async fn top_headlines(&self, query: &HeadlineQuery) -> Result<Vec<Article>> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        self.articles
            .clone()
            .ok_or_else(|| anyhow!("connection refused"))
    }
}

/// Summary is the content prefixed; content containing "unsummarizable" fails
pub struct StubSummarizer;

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        if text.contains("unsummarizable") {
            Err(anyhow!("summarizer quota exceeded"))
        } else {
            Ok(format!("In short: {}", text))
        }
    }
}

/// Picks a reply by the summary embedded in the prompt:
/// "france" gets two questions, "broken" fails, "garbage" is unparseable,
/// anything else gets the cats question.
pub struct StubGenerator {
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _system_message: Option<&str>, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = prompt.to_lowercase();
        if prompt.contains("broken") {
            Err(anyhow!("Gemini API request failed: 503"))
        } else if prompt.contains("garbage") {
            Ok("I'm sorry, I can't write a quiz about that.".to_string())
        } else if prompt.contains("france") {
            Ok(TWO_QUESTION_QUIZ.to_string())
        } else {
            Ok(CATS_QUIZ.to_string())
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-1"
    }
}

pub struct Harness {
    pub service: QuizService,
    pub news: Arc<StubNews>,
    pub generator: Arc<StubGenerator>,
}

pub fn harness(news: StubNews) -> Harness {
    let news = Arc::new(news);
    let generator = Arc::new(StubGenerator::new());
    let service = QuizService::new(
        news.clone(),
        Arc::new(StubSummarizer),
        QuizGenerator::new(generator.clone(), 3),
        default_query(),
    );
    Harness {
        service,
        news,
        generator,
    }
}

pub fn test_server(news: StubNews) -> (TestServer, Harness) {
    let harness = harness(news);
    let state = AppState {
        quiz_service: harness.service.clone(),
        sessions: SessionStore::new(100, 60),
    };
    let server = TestServer::new(create_router(state)).unwrap();
    (server, harness)
}

pub fn standard_articles() -> Vec<Article> {
    vec![
        article("Pets", "Cats are popular pets."),
        article("Travel", "France welcomes record tourists to Paris."),
    ]
}
