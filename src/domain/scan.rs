//! Typed scan requests and the persisted scan history.

use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::tool::Tool;
use crate::domain::types::{ScanId, TargetUrl, TypeConstraintError};

/// Generates a closed set of lower-case wire values with `FromStr`/`Display`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(TypeConstraintError::InvalidValue(other.to_string())),
                }
            }
        }
    };
}

wire_enum!(
    /// Depth of a vulnerability scan.
    ScanDepth { Quick => "quick", Full => "full" }
);

wire_enum!(
    /// Cloud platform whose configuration is analyzed.
    CloudProvider { Aws => "aws", Azure => "azure", Gcp => "gcp" }
);

wire_enum!(
    /// Compliance framework used by the GRC assessment.
    GrcFramework {
        Iso27001 => "iso27001",
        NistCsf => "nist_csf",
        Soc2 => "soc2",
        Gdpr => "gdpr",
        Hipaa => "hipaa",
        PciDss => "pci_dss",
    }
);

wire_enum!(
    /// Threat modeling methodology.
    ThreatMethodology { Stride => "stride", Pasta => "pasta", Linddun => "linddun" }
);

wire_enum!(
    /// Platform of an uploaded mobile application package.
    MobilePlatform { Android => "android", Ios => "ios" }
);

/// String whose content never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl Display for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[redacted]")
    }
}

/// File received through a multipart upload, already stored on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub size: usize,
    pub content_type: Option<String>,
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhishingInput {
    Url(TargetUrl),
    Email(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NetworkInput {
    Capture(UploadedFile),
    Host(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MobileInput {
    Package {
        platform: MobilePlatform,
        file: UploadedFile,
    },
    StoreLookup(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CodeInput {
    Snippet { language: String, code: String },
    Archive(UploadedFile),
}

/// Validated, tool-specific input of a scan.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolInput {
    Vulnerability { url: TargetUrl, depth: ScanDepth },
    Waf { url: TargetUrl },
    Phishing(PhishingInput),
    Password { password: Secret },
    Network(NetworkInput),
    Iot { target: String },
    Cloud { provider: CloudProvider, config: Value },
    Mobile(MobileInput),
    Code(CodeInput),
    GrcQuestions { framework: GrcFramework, answers: Value },
    ThreatModeling {
        description: String,
        methodology: ThreatMethodology,
    },
}

impl ToolInput {
    pub fn tool(&self) -> Tool {
        match self {
            ToolInput::Vulnerability { .. } => Tool::Vulnerability,
            ToolInput::Waf { .. } => Tool::Waf,
            ToolInput::Phishing(_) => Tool::Phishing,
            ToolInput::Password { .. } => Tool::Password,
            ToolInput::Network(_) => Tool::Network,
            ToolInput::Iot { .. } => Tool::Iot,
            ToolInput::Cloud { .. } => Tool::Cloud,
            ToolInput::Mobile(_) => Tool::Mobile,
            ToolInput::Code(_) => Tool::CodeAnalyzer,
            ToolInput::GrcQuestions { .. } => Tool::GrcQuestions,
            ToolInput::ThreatModeling { .. } => Tool::ThreatModeling,
        }
    }

    /// The `analysis_type` echoed in the response envelope.
    pub fn analysis_type(&self) -> &'static str {
        match self {
            ToolInput::Vulnerability { depth, .. } => depth.as_str(),
            ToolInput::Waf { .. } => "waf_detection",
            ToolInput::Phishing(PhishingInput::Url(_)) => "url",
            ToolInput::Phishing(PhishingInput::Email(_)) => "email",
            ToolInput::Password { .. } => "strength",
            ToolInput::Network(NetworkInput::Capture(_)) => "pcap",
            ToolInput::Network(NetworkInput::Host(_)) => "host",
            ToolInput::Iot { .. } => "device_scan",
            ToolInput::Cloud { provider, .. } => provider.as_str(),
            ToolInput::Mobile(MobileInput::Package { platform, .. }) => platform.as_str(),
            ToolInput::Mobile(MobileInput::StoreLookup(_)) => "store_lookup",
            ToolInput::Code(CodeInput::Snippet { .. }) => "snippet",
            ToolInput::Code(CodeInput::Archive(_)) => "archive",
            ToolInput::GrcQuestions { framework, .. } => framework.as_str(),
            ToolInput::ThreatModeling { methodology, .. } => methodology.as_str(),
        }
    }

    /// Short description of what was scanned, safe to store in the history.
    pub fn subject(&self) -> String {
        const MAX_SUBJECT: usize = 120;

        let subject = match self {
            ToolInput::Vulnerability { url, .. } | ToolInput::Waf { url } => url.to_string(),
            ToolInput::Phishing(PhishingInput::Url(url)) => url.to_string(),
            ToolInput::Phishing(PhishingInput::Email(body)) => {
                format!("email ({} chars)", body.chars().count())
            }
            ToolInput::Password { password } => password.to_string(),
            ToolInput::Network(NetworkInput::Capture(file))
            | ToolInput::Mobile(MobileInput::Package { file, .. })
            | ToolInput::Code(CodeInput::Archive(file)) => file.file_name.clone(),
            ToolInput::Network(NetworkInput::Host(host)) => host.clone(),
            ToolInput::Iot { target } => target.clone(),
            ToolInput::Cloud { provider, .. } => format!("{provider} configuration"),
            ToolInput::Mobile(MobileInput::StoreLookup(package)) => package.clone(),
            ToolInput::Code(CodeInput::Snippet { language, code }) => {
                format!("{language} snippet ({} lines)", code.lines().count())
            }
            ToolInput::GrcQuestions { framework, .. } => format!("{framework} assessment"),
            ToolInput::ThreatModeling { methodology, .. } => format!("{methodology} model"),
        };

        subject.chars().take(MAX_SUBJECT).collect()
    }
}

/// A fully validated request handed to an analyzer.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanRequest {
    pub input: ToolInput,
    /// Optional LLM model override supplied by the caller.
    pub model: Option<String>,
}

impl ScanRequest {
    pub fn new(input: ToolInput) -> Self {
        Self { input, model: None }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn tool(&self) -> Tool {
        self.input.tool()
    }
}

/// Stored history entry of one tool invocation.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ScanRecord {
    pub id: ScanId,
    pub tool: Tool,
    pub analysis_type: String,
    pub subject: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewScanRecord {
    pub tool: Tool,
    pub analysis_type: String,
    pub subject: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub created_at: NaiveDateTime,
}

impl NewScanRecord {
    pub fn from_request(
        request: &ScanRequest,
        outcome: Result<(), String>,
        duration_ms: i64,
        created_at: NaiveDateTime,
    ) -> Self {
        let (success, error) = match outcome {
            Ok(()) => (true, None),
            Err(message) => (false, Some(message)),
        };

        Self {
            tool: request.tool(),
            analysis_type: request.input.analysis_type().to_string(),
            subject: request.input.subject(),
            success,
            error,
            duration_ms,
            created_at,
        }
    }
}
