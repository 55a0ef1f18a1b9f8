use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::types::{summary_prompt, GenerationRequest, MeetingAnalysis};
use super::ChatProvider;
use crate::core::errors::ApiError;
use crate::core::settings::PROVIDER_OPENAI;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn chat_completion(&self, body: Value) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Generation(format!("Invalid OpenAI response: {}", e)))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(content)
    }
}

fn request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Generation("OpenAI request timed out".to_string())
    } else {
        ApiError::Generation(format!("OpenAI request failed: {}", err))
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_OPENAI
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant. Answer questions based on the provided document context."
                },
                { "role": "user", "content": request.prompt }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        self.chat_completion(body).await
    }

    async fn summarize_meeting(&self, transcript: &str) -> Result<MeetingAnalysis, ApiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert meeting summarizer. Extract key information and structure it properly."
                },
                { "role": "user", "content": summary_prompt(transcript) }
            ],
            "max_tokens": 1500,
            "temperature": 0.3,
            "response_format": { "type": "json_object" },
        });

        let content = self.chat_completion(body).await?;

        serde_json::from_str(&content)
            .map_err(|e| ApiError::Generation(format!("OpenAI summary was not valid JSON: {}", e)))
    }
}
