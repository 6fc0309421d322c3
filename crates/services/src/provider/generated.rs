use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use trivia_core::model::{TriviaItem, TriviaItemDraft};

use super::{QuestionBatchProvider, validate_drafts};
use crate::error::ProviderError;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    /// Reads `POLYPHONIA_AI_API_KEY`, `POLYPHONIA_AI_BASE_URL` and `POLYPHONIA_AI_MODEL`.
    ///
    /// Returns `None` when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("POLYPHONIA_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("POLYPHONIA_AI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("POLYPHONIA_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Asks an OpenAI-compatible chat completions endpoint to write a batch of questions.
#[derive(Clone)]
pub struct GeneratedQuestionProvider {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl GeneratedQuestionProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl QuestionBatchProvider for GeneratedQuestionProvider {
    async fn request_batch(&self, count: usize) -> Result<Vec<TriviaItem>, ProviderError> {
        let config = self.config.as_ref().ok_or(ProviderError::Disabled)?;
        if count == 0 {
            return Err(ProviderError::InvalidCount);
        }

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: batch_prompt(count),
            }],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        parse_batch(&content, count)
    }
}

fn batch_prompt(count: usize) -> String {
    format!(
        "Write {count} multiple-choice trivia questions about music history and music theory \
         (composers, periods, forms, instruments, notation). Mix the difficulties Easy, Medium, \
         Hard and Extreme. Reply with only a JSON array. Each element must have the keys \
         \"id\" (unique string), \"question\", \"options\" (exactly 4 distinct strings), \
         \"answer\" (identical to one of the options), \"context\" (one-sentence fun fact), \
         \"difficulty\" and \"category\"."
    )
}

/// Parse model output into at most `count` validated items.
///
/// Accepts a bare JSON array or one wrapped in a Markdown code fence.
pub(crate) fn parse_batch(content: &str, count: usize) -> Result<Vec<TriviaItem>, ProviderError> {
    let mut drafts: Vec<TriviaItemDraft> = serde_json::from_str(strip_code_fence(content))?;
    drafts.truncate(count);
    let items = validate_drafts(drafts)?;
    if items.is_empty() {
        return Err(ProviderError::EmptyBatch);
    }
    Ok(items)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_lang, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
