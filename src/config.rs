use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::llm_providers::LLMProviderType;
use crate::models::HeadlineQuery;
use crate::news_fetcher::{SUPPORTED_CATEGORIES, SUPPORTED_COUNTRIES, validate_query};
use crate::quiz_generator::DEFAULT_QUESTIONS_PER_SUMMARY;

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub news: NewsConfig,
    pub llm: LLMConfig,
    pub quiz: QuizConfig,
    pub sessions: SessionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// News API configuration and the default headline query
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_query: HeadlineQuery,
}

/// Large Language Model service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub provider: LLMProviderType,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    pub questions_per_summary: usize,
    pub summary_max_input_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub max_sessions: usize,
    pub ttl_minutes: i64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

/// Looks up a configuration value by environment variable name
pub trait Lookup: Fn(&str) -> Option<String> {}

impl<F: Fn(&str) -> Option<String>> Lookup for F {}

fn get_or(lookup: &impl Lookup, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn parse_number<T: std::str::FromStr>(lookup: &impl Lookup, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Invalid {} value: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Lookup, key: &str, default: bool) -> bool {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok().filter(|value| !value.is_empty()))
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(source: &impl Lookup) -> Result<Self> {
        log_system_event!(config, "Loading application configuration");

        let config = Config {
            news: NewsConfig::from_lookup(source)?,
            llm: LLMConfig::from_lookup(source)?,
            quiz: QuizConfig::from_lookup(source)?,
            sessions: SessionConfig::from_lookup(source)?,
            server: ServerConfig::from_lookup(source)?,
            logging: LoggingConfig::from_lookup(source),
        };

        log_system_event!(config, "Configuration loaded successfully");
        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    pub fn log_configuration_summary(&self) {
        info!(
            news_api_key_masked = %mask_sensitive_data(&self.news.api_key),
            news_base_url = %self.news.base_url,
            default_country = %self.news.default_query.country,
            default_category = %self.news.default_query.category,
            llm_provider = ?self.llm.provider,
            llm_model = ?self.llm.model,
            llm_max_output_tokens = self.llm.max_output_tokens,
            llm_api_key_masked = %mask_sensitive_data(&self.llm.api_key),
            questions_per_summary = self.quiz.questions_per_summary,
            max_sessions = self.sessions.max_sessions,
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if let Err(e) = validate_query(&self.news.default_query) {
            log_validation!(failure, "configuration", error = e);
            return Err(anyhow!("Invalid default headline query: {}", e));
        }

        if self.quiz.questions_per_summary == 0 {
            return Err(anyhow!("QUIZ_QUESTIONS_PER_SUMMARY must be at least 1"));
        }

        if self.sessions.max_sessions == 0 {
            return Err(anyhow!("MAX_SESSIONS must be at least 1"));
        }

        if !SessionConfig::TTL_RANGE_MINUTES.contains(&self.sessions.ttl_minutes) {
            return Err(anyhow!(
                "SESSION_TTL_MINUTES must be between {} and {}, got {}",
                SessionConfig::TTL_RANGE_MINUTES.start(),
                SessionConfig::TTL_RANGE_MINUTES.end(),
                self.sessions.ttl_minutes
            ));
        }

        if self.llm.max_output_tokens == 0 {
            return Err(anyhow!("LLM_MAX_OUTPUT_TOKENS must be at least 1"));
        }

        if self.news.api_key.is_empty() {
            warn!("NEWS_API_KEY is not set - headline fetching will fail");
        }

        if self.llm.api_key.is_empty() {
            warn!("LLM API key is not set - quiz questions will fall back to placeholders");
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().starts_with(level))
            && !self.logging.level.contains('=')
        {
            warn!("Unrecognized log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl NewsConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://newsapi.org/v2";

    fn from_lookup(source: &impl Lookup) -> Result<Self> {
        let default_query = HeadlineQuery {
            country: get_or(source, "NEWS_COUNTRY", SUPPORTED_COUNTRIES[1]).to_lowercase(),
            category: get_or(source, "NEWS_CATEGORY", SUPPORTED_CATEGORIES[0]).to_lowercase(),
            page_size: parse_number(source, "NEWS_PAGE_SIZE", 3u8)?,
        };

        Ok(NewsConfig {
            api_key: get_or(source, "NEWS_API_KEY", ""),
            base_url: get_or(source, "NEWS_API_BASE_URL", Self::DEFAULT_BASE_URL),
            default_query,
        })
    }
}

impl LLMConfig {
    /// Gemini output budget, thinking tokens included
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

    fn from_lookup(source: &impl Lookup) -> Result<Self> {
        let api_key = source("LLM_API_KEY")
            .or_else(|| source("GOOGLE_API_KEY"))
            .unwrap_or_default();

        let provider = LLMProviderType::parse(&get_or(source, "LLM_PROVIDER", "gemini"));

        Ok(LLMConfig {
            api_key,
            base_url: source("LLM_BASE_URL"),
            provider,
            model: source("LLM_MODEL"),
            timeout_secs: parse_number(source, "LLM_TIMEOUT_SECS", 60u64)?,
            max_output_tokens: parse_number(
                source,
                "LLM_MAX_OUTPUT_TOKENS",
                Self::DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl QuizConfig {
    fn from_lookup(source: &impl Lookup) -> Result<Self> {
        Ok(QuizConfig {
            questions_per_summary: parse_number(
                source,
                "QUIZ_QUESTIONS_PER_SUMMARY",
                DEFAULT_QUESTIONS_PER_SUMMARY,
            )?,
            summary_max_input_chars: parse_number(source, "SUMMARY_MAX_INPUT_CHARS", 2000usize)?,
        })
    }
}

impl SessionConfig {
    /// One minute up to one year
    pub const TTL_RANGE_MINUTES: std::ops::RangeInclusive<i64> = 1..=525_600;

    fn from_lookup(source: &impl Lookup) -> Result<Self> {
        Ok(SessionConfig {
            max_sessions: parse_number(source, "MAX_SESSIONS", 1000usize)?,
            ttl_minutes: parse_number(source, "SESSION_TTL_MINUTES", 120i64)?,
        })
    }
}

impl ServerConfig {
    fn from_lookup(source: &impl Lookup) -> Result<Self> {
        let port_str = get_or(source, "PORT", "3000");
        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        Ok(ServerConfig {
            port,
            host: get_or(source, "HOST", "0.0.0.0"),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    fn from_lookup(source: &impl Lookup) -> Self {
        LoggingConfig {
            level: get_or(source, "RUST_LOG", "info,news_quiz=debug"),
            file_enabled: parse_flag(source, "LOG_FILE_ENABLED", true),
            console_enabled: parse_flag(source, "LOG_CONSOLE_ENABLED", true),
            log_directory: get_or(source, "LOG_DIRECTORY", "logs"),
        }
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data(""), "");
        assert_eq!(mask_sensitive_data("sk-1234567890abcdef"), "sk-1***cdef");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(&source(&[])).unwrap();

        assert_eq!(config.news.base_url, "https://newsapi.org/v2");
        assert_eq!(config.news.default_query.country, "us");
        assert_eq!(config.news.default_query.category, "general");
        assert_eq!(config.news.default_query.page_size, 3);
        assert_eq!(config.llm.provider, LLMProviderType::Gemini);
        assert_eq!(config.llm.timeout(), Duration::from_secs(60));
        assert_eq!(config.llm.max_output_tokens, 8192);
        assert_eq!(config.sessions.ttl_minutes, 120);
        assert_eq!(config.quiz.questions_per_summary, 3);
        assert_eq!(config.sessions.max_sessions, 1000);
        assert_eq!(config.server.address(), "0.0.0.0:3000");
        assert!(config.logging.file_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_google_api_key_fallback() {
        let config = Config::from_lookup(&source(&[("GOOGLE_API_KEY", "AIza-test")])).unwrap();
        assert_eq!(config.llm.api_key, "AIza-test");

        let config = Config::from_lookup(&source(&[
            ("GOOGLE_API_KEY", "AIza-test"),
            ("LLM_API_KEY", "sk-preferred"),
        ]))
        .unwrap();
        assert_eq!(config.llm.api_key, "sk-preferred");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(&source(&[
            ("NEWS_COUNTRY", "GB"),
            ("NEWS_CATEGORY", "science"),
            ("NEWS_PAGE_SIZE", "7"),
            ("LLM_PROVIDER", "openai"),
            ("LLM_MODEL", "gpt-4o"),
            ("QUIZ_QUESTIONS_PER_SUMMARY", "5"),
            ("PORT", "8080"),
            ("LOG_FILE_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.news.default_query.country, "gb");
        assert_eq!(config.news.default_query.category, "science");
        assert_eq!(config.news.default_query.page_size, 7);
        assert_eq!(config.llm.provider, LLMProviderType::OpenAI);
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.quiz.questions_per_summary, 5);
        assert_eq!(config.server.port, 8080);
        assert!(!config.logging.file_enabled);
    }

    #[test]
    fn test_invalid_port_parsing() {
        assert!(Config::from_lookup(&source(&[("PORT", "not-a-number")])).is_err());
        assert!(Config::from_lookup(&source(&[("NEWS_PAGE_SIZE", "lots")])).is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::from_lookup(&source(&[])).unwrap();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.server.port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.news.default_query.country = "fr".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.news.default_query.page_size = 11;
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.llm.max_output_tokens = 0;
        assert!(invalid.validate().is_err());
    }
}
