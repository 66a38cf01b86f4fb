//! Catalogue of the security tools reachable through the tool router.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::TypeConstraintError;

/// Security tool selected by the `tool` discriminator of an API request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Vulnerability,
    Waf,
    Phishing,
    Password,
    Network,
    Iot,
    Cloud,
    Mobile,
    CodeAnalyzer,
    GrcQuestions,
    ThreatModeling,
}

impl Tool {
    pub const ALL: [Tool; 11] = [
        Tool::Vulnerability,
        Tool::Waf,
        Tool::Phishing,
        Tool::Password,
        Tool::Network,
        Tool::Iot,
        Tool::Cloud,
        Tool::Mobile,
        Tool::CodeAnalyzer,
        Tool::GrcQuestions,
        Tool::ThreatModeling,
    ];

    /// Wire name used in requests, responses and the scan history.
    pub const fn as_str(self) -> &'static str {
        match self {
            Tool::Vulnerability => "vulnerability",
            Tool::Waf => "waf",
            Tool::Phishing => "phishing",
            Tool::Password => "password",
            Tool::Network => "network",
            Tool::Iot => "iot",
            Tool::Cloud => "cloud",
            Tool::Mobile => "mobile",
            Tool::CodeAnalyzer => "code_analyzer",
            Tool::GrcQuestions => "grc_questions",
            Tool::ThreatModeling => "threat_modeling",
        }
    }

    /// Human readable name shown in reports.
    pub const fn label(self) -> &'static str {
        match self {
            Tool::Vulnerability => "Vulnerability Scanner",
            Tool::Waf => "WAF Analyzer",
            Tool::Phishing => "Phishing Detector",
            Tool::Password => "Password Analyzer",
            Tool::Network => "Network Analyzer",
            Tool::Iot => "IoT Scanner",
            Tool::Cloud => "Cloud Security Analyzer",
            Tool::Mobile => "Mobile App Scanner",
            Tool::CodeAnalyzer => "Code Analyzer",
            Tool::GrcQuestions => "GRC Assessment",
            Tool::ThreatModeling => "Threat Modeling",
        }
    }
}

impl Display for Tool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| TypeConstraintError::InvalidValue(s.to_string()))
    }
}
