//! Ollama-backed analyzer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::prompt::{build_prompt, parse_reply};
use crate::analysis::{AnalysisError, Analyzer};
use crate::domain::scan::ScanRequest;
use crate::models::config::ServerConfig;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Thin client for the `/api/generate` endpoint of an Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        default_model: &str,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            client,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, AnalysisError> {
        Self::new(
            &config.ollama_url,
            &config.ollama_default_model,
            Duration::from_secs(config.ollama_timeout_secs),
        )
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Sends a non-streaming generation request and returns the raw reply text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, AnalysisError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        reply
            .response
            .ok_or_else(|| AnalysisError::InvalidResponse("missing `response` field".to_string()))
    }
}

/// Analyzer that turns every request into an LLM prompt.
pub struct LlmAnalyzer {
    client: OllamaClient,
}

impl LlmAnalyzer {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, request: &ScanRequest) -> Result<Value, AnalysisError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or_else(|| self.client.default_model());
        let prompt = build_prompt(&request.input);

        log::debug!(
            "Sending {} prompt ({} chars) to model {model}",
            request.tool(),
            prompt.len()
        );

        let reply = self.client.generate(model, &prompt).await?;
        parse_reply(&reply)
    }
}
