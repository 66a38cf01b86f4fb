//! DTOs exposed by the tool router and the scan history endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::domain::tool::Tool;

/// Envelope of a successful tool run.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    pub tool: Tool,
    pub analysis_type: String,
    /// Analyzer output, passed through untouched.
    pub data: Value,
    /// UTC time the analysis finished, as `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

/// Body of every failed API call.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Query parameters accepted by the `/api/v1/scans` service.
#[derive(Debug, Default)]
pub struct ScansQuery {
    /// Optional tool wire name to filter on.
    pub tool: Option<String>,
    pub page: Option<usize>,
}
