//! Analyzer backends invoked by the tool router.
//!
//! Every [`Tool`] resolves to one [`Analyzer`] through the
//! [`AnalyzerRegistry`]. Tools without a dedicated analyzer fall back to the
//! registry default, which in production is the [`LlmAnalyzer`] backed by an
//! Ollama server.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::scan::ScanRequest;
use crate::domain::tool::Tool;

pub mod ollama;
pub mod prompt;

pub use ollama::{LlmAnalyzer, OllamaClient};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no analyzer available for tool {0}")]
    Unsupported(Tool),

    #[error("failed to reach the analysis backend: {0}")]
    Backend(String),

    #[error("analysis backend answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analysis backend returned an empty response")]
    EmptyResponse,

    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Backend(err.to_string())
    }
}

/// Produces the `data` part of a tool response for a validated request.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, request: &ScanRequest) -> Result<Value, AnalysisError>;
}

#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<Tool, Arc<dyn Analyzer>>,
    fallback: Option<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer used for every tool without a dedicated registration.
    pub fn with_default(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.fallback = Some(analyzer);
        self
    }

    pub fn register(mut self, tool: Tool, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.insert(tool, analyzer);
        self
    }

    pub fn get(&self, tool: Tool) -> Result<Arc<dyn Analyzer>, AnalysisError> {
        self.analyzers
            .get(&tool)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or(AnalysisError::Unsupported(tool))
    }

    pub async fn analyze(&self, request: &ScanRequest) -> Result<Value, AnalysisError> {
        let analyzer = self.get(request.tool())?;
        analyzer.analyze(request).await
    }
}
