use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

use super::types::{summary_prompt, GenerationRequest, MeetingAnalysis};
use super::ChatProvider;
use crate::core::errors::ApiError;
use crate::core::settings::PROVIDER_GEMINI;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
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

    async fn generate_content(&self, prompt: &str, max_tokens: u32) -> Result<String, ApiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": 0.3,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": max_tokens,
            }
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "Gemini API error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Generation(format!("Invalid Gemini response: {}", e)))?;

        let content = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(content)
    }
}

fn request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Generation("Gemini request timed out".to_string())
    } else {
        ApiError::Generation(format!("Gemini request failed: {}", err))
    }
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Gemini replies with prose around the JSON more often than not; pull out
/// the first object and fall back to a summary-only analysis otherwise.
fn parse_analysis(text: &str) -> MeetingAnalysis {
    if let Some(m) = json_object_regex().find(text) {
        if let Ok(analysis) = serde_json::from_str::<MeetingAnalysis>(m.as_str()) {
            return analysis;
        }
    }

    let summary = if text.chars().count() > 500 {
        let truncated: String = text.chars().take(500).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    };

    MeetingAnalysis {
        summary,
        ..Default::default()
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_GEMINI
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        self.generate_content(&request.prompt, request.max_tokens)
            .await
    }

    async fn summarize_meeting(&self, transcript: &str) -> Result<MeetingAnalysis, ApiError> {
        let text = self
            .generate_content(&summary_prompt(transcript), 1500)
            .await?;
        Ok(parse_analysis(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_json_object() {
        let reply = "Here is the analysis:\n{\"summary\": \"Short sync.\", \"key_points\": [\"a\"], \"decisions\": []}\nDone.";
        let analysis = parse_analysis(reply);
        assert_eq!(analysis.summary, "Short sync.");
        assert_eq!(analysis.key_points, vec!["a".to_string()]);
    }

    #[test]
    fn falls_back_to_plain_text_summary() {
        let analysis = parse_analysis("The meeting covered roadmap planning.");
        assert_eq!(analysis.summary, "The meeting covered roadmap planning.");
        assert!(analysis.key_points.is_empty());
    }

    #[test]
    fn fallback_truncates_long_text() {
        let analysis = parse_analysis(&"x".repeat(600));
        assert!(analysis.summary.ends_with("..."));
        assert_eq!(analysis.summary.chars().count(), 503);
    }
}
