//! DTOs returned by the campaign endpoints.

use serde::Serialize;

use crate::domain::campaign::{Campaign, CampaignStats, Recipient};
use crate::domain::types::TrackingToken;

/// Tracking URLs embedded in the simulated email of one recipient.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TrackingLinks {
    pub open_pixel: String,
    pub click: String,
}

impl TrackingLinks {
    pub fn new(public_url: &str, token: TrackingToken) -> Self {
        let base = public_url.trim_end_matches('/');
        Self {
            open_pixel: format!("{base}/t/o/{token}"),
            click: format!("{base}/t/c/{token}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipientView {
    #[serde(flatten)]
    pub recipient: Recipient,
    pub links: TrackingLinks,
}

#[derive(Debug, Serialize)]
pub struct CampaignSummary {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub stats: CampaignStats,
}

#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub stats: CampaignStats,
    pub recipients: Vec<RecipientView>,
}

/// Outcome of adding recipients to a draft campaign.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecipientsAdded {
    pub added: usize,
    /// Duplicates, either inside the batch or already in the campaign.
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct LaunchSummary {
    pub campaign: Campaign,
    pub sent: usize,
}

/// Result of re-running the automated-scan heuristic over stored events.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct RecountSummary {
    pub recipients: usize,
    pub events: usize,
    pub reclassified: usize,
}

/// Query parameters accepted by the campaign listing.
#[derive(Debug, Default)]
pub struct CampaignsQuery {
    pub owner: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_use_public_url_without_double_slash() {
        let token: TrackingToken = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().expect("token");
        let links = TrackingLinks::new("https://petawall.example/", token);
        assert_eq!(
            links.open_pixel,
            "https://petawall.example/t/o/67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
        assert_eq!(
            links.click,
            "https://petawall.example/t/c/67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }
}
