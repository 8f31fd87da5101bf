use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{Article, HeadlineQuery};

pub const SUPPORTED_COUNTRIES: [&str; 5] = ["in", "us", "gb", "au", "ca"];

pub const SUPPORTED_CATEGORIES: [&str; 7] = [
    "general",
    "technology",
    "business",
    "entertainment",
    "health",
    "science",
    "sports",
];

pub const MIN_PAGE_SIZE: u8 = 1;
pub const MAX_PAGE_SIZE: u8 = 10;

/// Check a headline query against the supported countries, categories and page sizes
pub fn validate_query(query: &HeadlineQuery) -> Result<(), String> {
    if !SUPPORTED_COUNTRIES.contains(&query.country.as_str()) {
        return Err(format!(
            "Unsupported country '{}'. Expected one of: {}",
            query.country,
            SUPPORTED_COUNTRIES.join(", ")
        ));
    }

    if !SUPPORTED_CATEGORIES.contains(&query.category.as_str()) {
        return Err(format!(
            "Unsupported category '{}'. Expected one of: {}",
            query.category,
            SUPPORTED_CATEGORIES.join(", ")
        ));
    }

    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&query.page_size) {
        return Err(format!(
            "Page size must be between {} and {}, got {}",
            MIN_PAGE_SIZE, MAX_PAGE_SIZE, query.page_size
        ));
    }

    Ok(())
}

/// Source of current headlines. An empty list means "no results".
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn top_headlines(&self, query: &HeadlineQuery) -> Result<Vec<Article>>;
}

/// Client for the NewsAPI `top-headlines` endpoint
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, query: &HeadlineQuery) -> Result<Vec<Article>> {
        info!(
            country = %query.country,
            category = %query.category,
            page_size = query.page_size,
            "Fetching top headlines"
        );

        let page_size = query.page_size.to_string();
        let response = self
            .client
            .get(format!("{}/top-headlines", self.base_url))
            .query(&[
                ("country", query.country.as_str()),
                ("category", query.category.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body: NewsApiResponse = response.json().await?;
        Ok(articles_from_response(body))
    }
}

/// Convert a NewsAPI payload into articles.
///
/// A non-"ok" status yields no articles. Articles without content fall back
/// to their description and are skipped if they have neither.
pub(crate) fn articles_from_response(response: NewsApiResponse) -> Vec<Article> {
    if response.status != "ok" {
        warn!(
            status = %response.status,
            code = ?response.code,
            message = ?response.message,
            "Error fetching news"
        );
        return Vec::new();
    }

    let total = response.articles.len();
    let articles: Vec<Article> = response
        .articles
        .into_iter()
        .filter_map(|article| {
            let content = article
                .content
                .filter(|c| !c.trim().is_empty())
                .or(article.description.filter(|d| !d.trim().is_empty()))?;

            Some(Article {
                title: article.title.unwrap_or_else(|| "No title".to_string()),
                source: article
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                content,
                url: article.url.unwrap_or_else(|| "#".to_string()),
            })
        })
        .collect();

    if articles.len() < total {
        warn!(
            skipped = total - articles.len(),
            "Skipped headlines without content or description"
        );
    }

    articles
}
