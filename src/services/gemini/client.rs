//! Gemini HTTP client
//!
//! Sends the user's request to `generateContent` with a prompt that asks for
//! a JSON parameter object, then hands the answer to the adapter.
//!
//! See: https://ai.google.dev/api/generate-content

use std::time::Duration;

use super::{adapter, dto};
use crate::services::domain::{ExtractedParams, ServiceError};

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    model: String,
    http_client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key and model
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ServiceError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            http_client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Extract playlist parameters from free text
    pub async fn extract(
        &self,
        text: &str,
        known_rulesets: &[String],
    ) -> Result<ExtractedParams, ServiceError> {
        let response = self.send_generate_request(&build_prompt(text, known_rulesets)).await?;
        adapter::to_params(response)
    }

    /// Send the HTTP request and parse the response
    async fn send_generate_request(
        &self,
        prompt: &str,
    ) -> Result<dto::GenerateResponse, ServiceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = dto::GenerateRequest {
            contents: vec![dto::Content {
                role: Some("user".to_string()),
                parts: vec![dto::Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: dto::GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ServiceError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiErrorResponse>().await {
                return Err(ServiceError::from_status(status, error.error.message));
            }
            return Err(ServiceError::from_status(
                status,
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }

        response
            .json::<dto::GenerateResponse>()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}

/// Build the extraction prompt
fn build_prompt(text: &str, known_rulesets: &[String]) -> String {
    let rulesets = if known_rulesets.is_empty() {
        "None".to_string()
    } else {
        known_rulesets
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You extract playlist parameters from a user's request for a Spotify playlist generator.

Available rulesets (filters the user can refer to by name):
{rulesets}

Return ONLY a JSON object with these fields:
{{
    "num_songs": integer number of songs requested, or null if not stated,
    "is_daily_drive": true if the user asks for a daily drive playlist, otherwise false,
    "allow_explicit": false if the user asks for clean / non-explicit songs, otherwise true,
    "ruleset_name": name of a ruleset from the list above if the user refers to one, otherwise null,
    "guidelines": the rest of the description of the playlist's mood, genre or theme,
    "music_only": true if the user wants music only (no podcasts), otherwise false
}}

User request:
{text}"#
    )
}
