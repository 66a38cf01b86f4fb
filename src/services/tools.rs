//! The tool router: request validation, analyzer dispatch and scan history.

use std::str::FromStr;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::AnalyzerRegistry;
use crate::domain::scan::{
    CloudProvider, CodeInput, GrcFramework, MobileInput, MobilePlatform, NetworkInput,
    NewScanRecord, PhishingInput, ScanDepth, ScanRecord, ScanRequest, Secret, ThreatMethodology,
    ToolInput, UploadedFile,
};
use crate::domain::tool::Tool;
use crate::domain::types::TargetUrl;
use crate::dto::api::{ScansQuery, ToolResponse};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{ScanListQuery, ScanReader, ScanWriter};
use crate::services::uploads::{UploadKind, UploadLimits};
use crate::services::{ServiceError, ServiceResult};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reasons a tool request is rejected before any analyzer runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolRequestError {
    #[error("No tool specified")]
    NoTool,

    #[error("Invalid tool: {0}")]
    InvalidTool(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{0}")]
    Upload(String),
}

/// Untyped tool request as decoded from a JSON, form or multipart body.
#[derive(Clone, Debug, Default)]
pub struct RawToolRequest {
    pub fields: Map<String, Value>,
    pub upload: Option<UploadedFile>,
}

impl RawToolRequest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            upload: None,
        }
    }

    pub fn with_upload(mut self, upload: Option<UploadedFile>) -> Self {
        self.upload = upload;
        self
    }

    /// Trimmed text value; blanks count as missing.
    fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(value) => {
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    fn required_text(&self, field: &'static str) -> Result<String, ToolRequestError> {
        self.text(field).ok_or(ToolRequestError::MissingField(field))
    }

    fn url(&self, field: &'static str) -> Result<Option<TargetUrl>, ToolRequestError> {
        self.text(field)
            .map(|value| {
                TargetUrl::new(value).map_err(|err| ToolRequestError::InvalidField {
                    field,
                    reason: err.to_string(),
                })
            })
            .transpose()
    }

    fn required_url(&self, field: &'static str) -> Result<TargetUrl, ToolRequestError> {
        self.url(field)?.ok_or(ToolRequestError::MissingField(field))
    }

    fn choice<T: FromStr>(
        &self,
        field: &'static str,
        allowed: &[&str],
    ) -> Result<Option<T>, ToolRequestError> {
        self.text(field)
            .map(|value| {
                value.parse::<T>().map_err(|_| ToolRequestError::InvalidField {
                    field,
                    reason: format!("expected one of {}", allowed.join(", ")),
                })
            })
            .transpose()
    }

    /// JSON value sent either inline (JSON bodies) or as an encoded string (form bodies).
    fn json(&self, field: &'static str) -> Result<Option<Value>, ToolRequestError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => serde_json::from_str(raw.trim())
                .map(Some)
                .map_err(|_| ToolRequestError::InvalidField {
                    field,
                    reason: "must be valid JSON".to_string(),
                }),
            Some(value) => Ok(Some(value.clone())),
        }
    }
}

fn allowed<T: Copy>(variants: &[T], as_str: fn(T) -> &'static str) -> Vec<&'static str> {
    variants.iter().copied().map(as_str).collect()
}

/// Validates a raw request into the typed input of its tool.
pub fn parse_request(
    raw: RawToolRequest,
    limits: &UploadLimits,
) -> Result<ScanRequest, ToolRequestError> {
    let name = raw.text("tool").ok_or(ToolRequestError::NoTool)?;
    let tool = Tool::from_str(&name).map_err(|_| ToolRequestError::InvalidTool(name))?;

    let input = match tool {
        Tool::Vulnerability => {
            let depths = allowed(&[ScanDepth::Quick, ScanDepth::Full], ScanDepth::as_str);
            ToolInput::Vulnerability {
                url: raw.required_url("url")?,
                depth: raw.choice("scan_type", &depths)?.unwrap_or(ScanDepth::Quick),
            }
        }
        Tool::Waf => ToolInput::Waf {
            url: raw.required_url("url")?,
        },
        Tool::Phishing => match (raw.url("url")?, raw.text("email_content")) {
            (Some(url), _) => ToolInput::Phishing(PhishingInput::Url(url)),
            (None, Some(body)) => ToolInput::Phishing(PhishingInput::Email(body)),
            (None, None) => return Err(ToolRequestError::MissingField("url or email_content")),
        },
        Tool::Password => ToolInput::Password {
            password: Secret::new(raw.required_text("password")?),
        },
        Tool::Network => match (&raw.upload, raw.text("target")) {
            (Some(file), _) => {
                limits.policy(UploadKind::Capture).check(file)?;
                ToolInput::Network(NetworkInput::Capture(file.clone()))
            }
            (None, Some(host)) => ToolInput::Network(NetworkInput::Host(host)),
            (None, None) => return Err(ToolRequestError::MissingField("pcap_file or target")),
        },
        Tool::Iot => ToolInput::Iot {
            target: raw.required_text("target")?,
        },
        Tool::Cloud => {
            let providers = allowed(
                &[CloudProvider::Aws, CloudProvider::Azure, CloudProvider::Gcp],
                CloudProvider::as_str,
            );
            ToolInput::Cloud {
                provider: raw
                    .choice("provider", &providers)?
                    .ok_or(ToolRequestError::MissingField("provider"))?,
                config: raw
                    .json("config")?
                    .ok_or(ToolRequestError::MissingField("config"))?,
            }
        }
        Tool::Mobile => match (&raw.upload, raw.text("package_name")) {
            (Some(file), _) => {
                let platform = match limits.policy(UploadKind::MobileApp).check(file)? {
                    "apk" => MobilePlatform::Android,
                    _ => MobilePlatform::Ios,
                };
                ToolInput::Mobile(MobileInput::Package {
                    platform,
                    file: file.clone(),
                })
            }
            (None, Some(package)) => ToolInput::Mobile(MobileInput::StoreLookup(package)),
            (None, None) => return Err(ToolRequestError::MissingField("app_file or package_name")),
        },
        Tool::CodeAnalyzer => match &raw.upload {
            Some(file) => {
                limits.policy(UploadKind::SourceArchive).check(file)?;
                ToolInput::Code(CodeInput::Archive(file.clone()))
            }
            None => ToolInput::Code(CodeInput::Snippet {
                language: raw.text("language").unwrap_or_else(|| "auto".to_string()),
                code: raw.required_text("code")?,
            }),
        },
        Tool::GrcQuestions => {
            let frameworks = allowed(
                &[
                    GrcFramework::Iso27001,
                    GrcFramework::NistCsf,
                    GrcFramework::Soc2,
                    GrcFramework::Gdpr,
                    GrcFramework::Hipaa,
                    GrcFramework::PciDss,
                ],
                GrcFramework::as_str,
            );
            let answers = match raw.json("answers")? {
                None => Value::Object(Map::new()),
                Some(value @ Value::Object(_)) => value,
                Some(_) => {
                    return Err(ToolRequestError::InvalidField {
                        field: "answers",
                        reason: "must be a JSON object".to_string(),
                    });
                }
            };
            ToolInput::GrcQuestions {
                framework: raw
                    .choice("framework", &frameworks)?
                    .ok_or(ToolRequestError::MissingField("framework"))?,
                answers,
            }
        }
        Tool::ThreatModeling => {
            let methodologies = allowed(
                &[
                    ThreatMethodology::Stride,
                    ThreatMethodology::Pasta,
                    ThreatMethodology::Linddun,
                ],
                ThreatMethodology::as_str,
            );
            ToolInput::ThreatModeling {
                description: raw.required_text("system_description")?,
                methodology: raw
                    .choice("methodology", &methodologies)?
                    .unwrap_or(ThreatMethodology::Stride),
            }
        }
    };

    Ok(ScanRequest::new(input).with_model(raw.text("model")))
}

/// Runs the analyzer for a validated request and records the attempt.
pub async fn run_tool<R>(
    repo: &R,
    registry: &AnalyzerRegistry,
    request: ScanRequest,
) -> ServiceResult<ToolResponse>
where
    R: ScanWriter + ?Sized,
{
    let tool = request.tool();
    let started = Instant::now();
    let result = registry.analyze(&request).await;
    let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
    let finished_at = Utc::now();

    let outcome = match &result {
        Ok(_) => Ok(()),
        Err(err) => Err(err.to_string()),
    };
    let record =
        NewScanRecord::from_request(&request, outcome, duration_ms, finished_at.naive_utc());
    if let Err(err) = repo.record_scan(&record) {
        log::error!("Failed to record {tool} scan: {err}");
    }

    let data = result.map_err(|err| {
        log::error!("{tool} analysis failed after {duration_ms} ms: {err}");
        ServiceError::Analysis(err.to_string())
    })?;

    log::info!(
        "{tool} analysis ({}) finished in {duration_ms} ms",
        request.input.analysis_type()
    );

    Ok(ToolResponse {
        success: true,
        tool,
        analysis_type: request.input.analysis_type().to_string(),
        data,
        timestamp: finished_at.format(TIMESTAMP_FORMAT).to_string(),
    })
}

/// Validates and runs a raw request in one go; input errors become [`ServiceError::Form`].
pub async fn handle_request<R>(
    repo: &R,
    registry: &AnalyzerRegistry,
    limits: &UploadLimits,
    raw: RawToolRequest,
) -> ServiceResult<ToolResponse>
where
    R: ScanWriter + ?Sized,
{
    let request = parse_request(raw, limits).map_err(|err| {
        log::warn!("Rejected tool request: {err}");
        ServiceError::Form(err.to_string())
    })?;

    run_tool(repo, registry, request).await
}

pub fn list_scans<R>(repo: &R, params: ScansQuery) -> ServiceResult<Paginated<ScanRecord>>
where
    R: ScanReader + ?Sized,
{
    let page = params.page.unwrap_or(1).max(1);
    let mut query = ScanListQuery::default().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(name) = params.tool.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let tool = Tool::from_str(name).map_err(|_| {
            ServiceError::Form(ToolRequestError::InvalidTool(name.to_string()).to_string())
        })?;
        query = query.tool(tool);
    }

    let (total, scans) = repo.list_scans(query).map_err(|err| {
        log::error!("Failed to list scans: {err}");
        err
    })?;

    Ok(Paginated::new(scans, page, DEFAULT_ITEMS_PER_PAGE, total))
}
