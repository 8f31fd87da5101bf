use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::llm_providers::TextGenerator;

/// Turns raw article text into a short abstractive summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by a text generation model
#[derive(Clone)]
pub struct LlmSummarizer {
    generator: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

const SYSTEM_MESSAGE: &str = "You are a news editor who writes concise, factual summaries.";

/// Summary length bounds, in words
const MIN_SUMMARY_WORDS: usize = 30;
const MAX_SUMMARY_WORDS: usize = 100;

impl LlmSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_input_chars: usize) -> Self {
        Self {
            generator,
            max_input_chars,
        }
    }
}

/// Prefix of `text` holding at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn build_summary_prompt(article_text: &str) -> String {
    format!(
        "Summarize the following news article in {} to {} words. \
         Reply with the summary only.\n\nArticle:\n{}",
        MIN_SUMMARY_WORDS, MAX_SUMMARY_WORDS, article_text
    )
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let input = truncate_chars(text.trim(), self.max_input_chars);
        debug!(
            input_chars = input.chars().count(),
            truncated = input.len() < text.trim().len(),
            "Summarizing article text"
        );

        let summary = self
            .generator
            .generate(Some(SYSTEM_MESSAGE), &build_summary_prompt(input))
            .await?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(anyhow!("{} returned an empty summary", self.generator.provider_name()));
        }

        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoGenerator {
        reply: String,
        last_prompt: Mutex<String>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, _system: Option<&str>, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            Ok(self.reply.clone())
        }

        fn provider_name(&self) -> &str {
            "echo"
        }

        fn model_name(&self) -> &str {
            "echo-1"
        }
    }

    fn echo(reply: &str) -> Arc<EchoGenerator> {
        Arc::new(EchoGenerator {
            reply: reply.to_string(),
            last_prompt: Mutex::new(String::new()),
        })
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[tokio::test]
    async fn test_summary_is_trimmed() {
        let generator = echo("  Cats are popular pets.\n");
        let summarizer = LlmSummarizer::new(generator.clone(), 2000);

        let summary = summarizer.summarize("A long story about cats.").await.unwrap();
        assert_eq!(summary, "Cats are popular pets.");
        assert!(generator.last_prompt.lock().unwrap().contains("A long story about cats."));
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let generator = echo("Summary.");
        let summarizer = LlmSummarizer::new(generator.clone(), 10);

        summarizer.summarize("0123456789ABCDEF").await.unwrap();
        let prompt = generator.last_prompt.lock().unwrap().clone();
        assert!(prompt.ends_with("0123456789"));
    }

    #[tokio::test]
    async fn test_empty_summary_is_an_error() {
        let summarizer = LlmSummarizer::new(echo("   "), 2000);
        assert!(summarizer.summarize("Some article").await.is_err());
    }
}
