//! Phishing simulation campaigns and their recipients.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CampaignId, CampaignName, EmailAddress, EmailSubject, RecipientId, RecipientName, TargetUrl,
    TrackingToken, TypeConstraintError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
}

impl CampaignStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl Display for CampaignStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(TypeConstraintError::InvalidValue(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: CampaignName,
    pub subject: EmailSubject,
    /// Where human clicks are redirected; the awareness page is shown when empty.
    pub landing_url: Option<TargetUrl>,
    pub owner_email: EmailAddress,
    pub status: CampaignStatus,
    pub created_at: NaiveDateTime,
    pub launched_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCampaign {
    pub name: CampaignName,
    pub subject: EmailSubject,
    pub landing_url: Option<TargetUrl>,
    pub owner_email: EmailAddress,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Recipient {
    pub id: RecipientId,
    pub campaign_id: CampaignId,
    pub email: EmailAddress,
    pub name: Option<RecipientName>,
    #[serde(skip)]
    pub token: TrackingToken,
    pub sent_at: Option<NaiveDateTime>,
    pub opened_at: Option<NaiveDateTime>,
    pub clicked_at: Option<NaiveDateTime>,
    pub open_count: i32,
    pub click_count: i32,
    pub bot_click_count: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewRecipient {
    pub campaign_id: CampaignId,
    pub email: EmailAddress,
    pub name: Option<RecipientName>,
    pub token: TrackingToken,
}

impl NewRecipient {
    /// Builds a recipient with a freshly generated tracking token.
    pub fn new(campaign_id: CampaignId, email: EmailAddress, name: Option<RecipientName>) -> Self {
        Self {
            campaign_id,
            email,
            name,
            token: TrackingToken::generate(),
        }
    }
}

/// Counter increments and first-seen timestamps applied to a recipient.
///
/// Timestamps only fill empty columns, so applying the same delta twice never
/// moves `opened_at` or `clicked_at` forward.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityDelta {
    pub opens: i32,
    pub clicks: i32,
    pub bot_clicks: i32,
    pub opened_at: Option<NaiveDateTime>,
    pub clicked_at: Option<NaiveDateTime>,
}

impl ActivityDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Absolute recipient activity, rebuilt from stored events during a recount.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipientActivity {
    pub open_count: i32,
    pub click_count: i32,
    pub bot_click_count: i32,
    pub opened_at: Option<NaiveDateTime>,
    pub clicked_at: Option<NaiveDateTime>,
}

/// Aggregated engagement numbers of a campaign.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct CampaignStats {
    pub recipients: usize,
    pub sent: usize,
    pub opened: usize,
    pub clicked: usize,
    pub total_opens: i64,
    pub total_clicks: i64,
    pub bot_clicks: i64,
    pub open_rate: f64,
    pub click_rate: f64,
}

/// Percentage of `part` over `whole` rounded to one decimal, zero when nothing was sent.
fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

impl CampaignStats {
    pub fn from_recipients(recipients: &[Recipient]) -> Self {
        let sent = recipients.iter().filter(|r| r.sent_at.is_some()).count();
        let opened = recipients.iter().filter(|r| r.opened_at.is_some()).count();
        let clicked = recipients.iter().filter(|r| r.clicked_at.is_some()).count();

        Self {
            recipients: recipients.len(),
            sent,
            opened,
            clicked,
            total_opens: recipients.iter().map(|r| i64::from(r.open_count)).sum(),
            total_clicks: recipients.iter().map(|r| i64::from(r.click_count)).sum(),
            bot_clicks: recipients.iter().map(|r| i64::from(r.bot_click_count)).sum(),
            open_rate: rate(opened, sent),
            click_rate: rate(clicked, sent),
        }
    }
}
