//! Opens and clicks recorded against campaign recipients.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CampaignId, RecipientId, TrackingEventId, TypeConstraintError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingKind {
    Open,
    Click,
}

impl TrackingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackingKind::Open => "open",
            TrackingKind::Click => "click",
        }
    }
}

impl Display for TrackingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingKind {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TrackingKind::Open),
            "click" => Ok(TrackingKind::Click),
            other => Err(TypeConstraintError::InvalidValue(other.to_string())),
        }
    }
}

/// Why an event was attributed to an automated client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationReason {
    MissingUserAgent,
    ScannerUserAgent,
    SecurityVendorIp,
    TooFast,
}

impl AutomationReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            AutomationReason::MissingUserAgent => "missing_user_agent",
            AutomationReason::ScannerUserAgent => "scanner_user_agent",
            AutomationReason::SecurityVendorIp => "security_vendor_ip",
            AutomationReason::TooFast => "too_fast",
        }
    }
}

impl Display for AutomationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationReason {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing_user_agent" => Ok(AutomationReason::MissingUserAgent),
            "scanner_user_agent" => Ok(AutomationReason::ScannerUserAgent),
            "security_vendor_ip" => Ok(AutomationReason::SecurityVendorIp),
            "too_fast" => Ok(AutomationReason::TooFast),
            other => Err(TypeConstraintError::InvalidValue(other.to_string())),
        }
    }
}

/// Verdict of the automated-scan heuristic for one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Human,
    Automated(AutomationReason),
}

impl Classification {
    pub fn is_automated(self) -> bool {
        matches!(self, Classification::Automated(_))
    }

    pub fn reason(self) -> Option<AutomationReason> {
        match self {
            Classification::Human => None,
            Classification::Automated(reason) => Some(reason),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrackingEvent {
    pub id: TrackingEventId,
    pub recipient_id: RecipientId,
    pub campaign_id: CampaignId,
    pub kind: TrackingKind,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub automated: bool,
    pub reason: Option<AutomationReason>,
    pub created_at: NaiveDateTime,
}

impl TrackingEvent {
    pub fn classification(&self) -> Classification {
        match (self.automated, self.reason) {
            (true, Some(reason)) => Classification::Automated(reason),
            (true, None) => Classification::Automated(AutomationReason::ScannerUserAgent),
            (false, _) => Classification::Human,
        }
    }
}

/// A stored event plus the first-seen timestamps it set on its recipient.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedEvent {
    pub event: TrackingEvent,
    /// This event wrote the recipient's `clicked_at`.
    pub first_click: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTrackingEvent {
    pub recipient_id: RecipientId,
    pub campaign_id: CampaignId,
    pub kind: TrackingKind,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub classification: Classification,
    pub created_at: NaiveDateTime,
}

/// New classification of a stored event produced by a recount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reclassification {
    pub event_id: TrackingEventId,
    pub classification: Classification,
}
