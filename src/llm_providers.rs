use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Anything that turns a prompt into generated text.
///
/// Implemented by the HTTP-backed [`LLMProvider`]; tests substitute their own.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_message: Option<&str>, prompt: &str) -> Result<String>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Common message structure for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

/// Enum-based LLM provider implementation
#[derive(Debug, Clone)]
pub enum LLMProvider {
    OpenAI(OpenAIProvider),
    Gemini(GeminiProvider),
}

#[async_trait]
impl TextGenerator for LLMProvider {
    async fn generate(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        match self {
            LLMProvider::OpenAI(provider) => provider.make_request(system_message, prompt).await,
            LLMProvider::Gemini(provider) => provider.make_request(system_message, prompt).await,
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(_) => "OpenAI",
            LLMProvider::Gemini(_) => "Gemini",
        }
    }

    fn model_name(&self) -> &str {
        match self {
            LLMProvider::OpenAI(provider) => &provider.model,
            LLMProvider::Gemini(provider) => &provider.model,
        }
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

/// OpenAI provider implementation
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChoice {
    message: LLMMessage,
}

impl OpenAIProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: http_client(timeout),
            api_key,
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        }
    }

    pub async fn make_request(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: sys_msg.to_string(),
            });
        }

        messages.push(LLMMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages,
        };

        info!(
            provider = "OpenAI",
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = prompt.len(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = "OpenAI",
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("OpenAI API request failed: {}", error_text));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        let response_content = extract_openai_text(openai_response)?;

        info!(
            provider = "OpenAI",
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }
}

fn extract_openai_text(response: OpenAIResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))
}

/// Gemini provider implementation
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";

    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            client: http_client(timeout),
            api_key,
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            max_output_tokens,
        }
    }

    fn request_body(&self, system_message: Option<&str>, prompt: &str) -> GeminiRequest {
        let full_prompt = match system_message {
            Some(sys_msg) => format!("{}\n\n{}", sys_msg, prompt),
            None => prompt.to_string(),
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: full_prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.9,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    pub async fn make_request(&self, system_message: Option<&str>, prompt: &str) -> Result<String> {
        let request_body = self.request_body(system_message, prompt);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        info!(
            provider = "Gemini",
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = prompt.len(),
            "Making LLM request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = "Gemini",
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(anyhow::anyhow!("Gemini API request failed: {}", error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let response_content = extract_gemini_text(gemini_response)?;

        info!(
            provider = "Gemini",
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_gemini_text(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

    if candidate.content.parts.is_empty() {
        return Err(anyhow::anyhow!("No parts in Gemini response"));
    }

    Ok(candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join(""))
}

/// Factory for creating LLM providers based on provider type
pub struct LLMProviderFactory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum LLMProviderType {
    OpenAI,
    Gemini,
}

impl LLMProviderType {
    /// Parse a provider name; unknown names fall back to Gemini
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "openai" | "chatgpt" | "gpt" => LLMProviderType::OpenAI,
            "gemini" | "google" => LLMProviderType::Gemini,
            _ => {
                info!("Unknown LLM provider '{}', defaulting to Gemini", name);
                LLMProviderType::Gemini
            }
        }
    }
}

impl LLMProviderFactory {
    /// Create a new LLM provider instance based on provider type
    pub fn create_provider(
        provider_type: LLMProviderType,
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
        max_output_tokens: u32,
    ) -> LLMProvider {
        match provider_type {
            LLMProviderType::OpenAI => {
                LLMProvider::OpenAI(OpenAIProvider::new(api_key, base_url, model, timeout))
            }
            LLMProviderType::Gemini => {
                LLMProvider::Gemini(GeminiProvider::new(
                    api_key,
                    base_url,
                    model,
                    timeout,
                    max_output_tokens,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let timeout = Duration::from_secs(5);
        let gemini = LLMProviderFactory::create_provider(
            LLMProviderType::Gemini,
            "key".to_string(),
            None,
            None,
            timeout,
            8192,
        );
        assert_eq!(gemini.provider_name(), "Gemini");
        assert_eq!(gemini.model_name(), "gemini-2.5-flash");

        let openai = LLMProviderFactory::create_provider(
            LLMProviderType::OpenAI,
            "key".to_string(),
            None,
            Some("gpt-4o".to_string()),
            timeout,
            8192,
        );
        assert_eq!(openai.provider_name(), "OpenAI");
        assert_eq!(openai.model_name(), "gpt-4o");
    }

    #[test]
    fn test_gemini_request_uses_configured_output_budget() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            None,
            None,
            Duration::from_secs(5),
            8192,
        );
        let body = serde_json::to_value(provider.request_body(Some("System"), "Prompt")).unwrap();

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "System\n\nPrompt");
    }

    #[test]
    fn test_provider_type_parsing() {
        let test_cases = vec![
            ("openai", LLMProviderType::OpenAI),
            ("ChatGPT", LLMProviderType::OpenAI),
            ("GPT", LLMProviderType::OpenAI),
            ("gemini", LLMProviderType::Gemini),
            ("Google", LLMProviderType::Gemini),
            ("mystery", LLMProviderType::Gemini),
        ];

        for (input, expected) in test_cases {
            assert_eq!(LLMProviderType::parse(input), expected, "Input '{}'", input);
        }
    }

    #[test]
    fn test_extract_gemini_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Question: Hi?\n" }, { "text": "A) Yes" }] }
            }]
        }))
        .unwrap();
        assert_eq!(extract_gemini_text(response).unwrap(), "Question: Hi?\nA) Yes");
    }

    #[test]
    fn test_extract_gemini_text_without_candidates_fails() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        let err = extract_gemini_text(response).unwrap_err();
        assert!(err.to_string().contains("No candidates"));
    }

    #[test]
    fn test_extract_openai_text() {
        let response: OpenAIResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Question: Hi?" } }]
        }))
        .unwrap();
        assert_eq!(extract_openai_text(response).unwrap(), "Question: Hi?");

        let empty: OpenAIResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(extract_openai_text(empty).is_err());
    }
}
