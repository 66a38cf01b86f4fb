use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::campaign::{
    ActivityDelta, Campaign, CampaignStatus, NewCampaign, NewRecipient, Recipient,
    RecipientActivity,
};
use crate::domain::notification::{NewNotification, Notification};
use crate::domain::scan::{NewScanRecord, ScanRecord};
use crate::domain::tool::Tool;
use crate::domain::tracking::{NewTrackingEvent, Reclassification, RecordedEvent, TrackingEvent};
use crate::domain::types::{CampaignId, EmailAddress, NotificationId, RecipientId, TrackingToken};
use crate::repository::errors::RepositoryResult;

pub mod campaign;
pub mod errors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod notification;
pub mod scan;
pub mod tracking;

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Rows to skip; saturates so an absurd page number yields an empty page.
    pub fn offset(&self) -> i64 {
        let skipped_pages = i64::try_from(self.page.max(1) - 1).unwrap_or(i64::MAX);
        skipped_pages.saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignListQuery {
    pub owner_email: Option<EmailAddress>,
    pub status: Option<CampaignStatus>,
    pub pagination: Option<Pagination>,
}

impl CampaignListQuery {
    pub fn owner(mut self, email: EmailAddress) -> Self {
        self.owner_email = Some(email);
        self
    }

    pub fn status(mut self, status: CampaignStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanListQuery {
    pub tool: Option<Tool>,
    pub pagination: Option<Pagination>,
}

impl ScanListQuery {
    pub fn tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait CampaignReader {
    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>>;
    fn list_campaigns(&self, query: CampaignListQuery) -> RepositoryResult<(usize, Vec<Campaign>)>;
    fn list_campaign_ids(&self) -> RepositoryResult<Vec<CampaignId>>;
}

pub trait CampaignWriter {
    fn create_campaign(
        &self,
        campaign: &NewCampaign,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<Campaign>;
    /// Marks the campaign active and every unsent recipient as sent, atomically.
    fn launch_campaign(&self, id: CampaignId, sent_at: NaiveDateTime) -> RepositoryResult<usize>;
    fn set_campaign_status(&self, id: CampaignId, status: CampaignStatus) -> RepositoryResult<()>;
}

pub trait RecipientReader {
    fn get_recipient_by_token(&self, token: TrackingToken) -> RepositoryResult<Option<Recipient>>;
    fn list_recipients(&self, campaign_id: CampaignId) -> RepositoryResult<Vec<Recipient>>;
}

pub trait RecipientWriter {
    /// Inserts recipients, skipping emails already present in the campaign.
    fn add_recipients(&self, recipients: &[NewRecipient]) -> RepositoryResult<usize>;
}

pub trait TrackingReader {
    fn list_tracking_events(&self, recipient_id: RecipientId)
    -> RepositoryResult<Vec<TrackingEvent>>;
}

pub trait TrackingWriter {
    /// Stores the event and applies the delta to its recipient in one transaction.
    fn record_tracking_event(
        &self,
        event: &NewTrackingEvent,
        delta: &ActivityDelta,
    ) -> RepositoryResult<RecordedEvent>;
    /// Rewrites event classifications and the recipient counters in one transaction.
    fn replace_recipient_activity(
        &self,
        recipient_id: RecipientId,
        activity: &RecipientActivity,
        reclassified: &[Reclassification],
    ) -> RepositoryResult<()>;
}

pub trait NotificationReader {
    fn list_notifications(
        &self,
        user_email: &EmailAddress,
        unread_only: bool,
    ) -> RepositoryResult<Vec<Notification>>;
}

pub trait NotificationWriter {
    fn create_notification(&self, notification: &NewNotification)
    -> RepositoryResult<Notification>;
    /// Returns `false` when the notification does not exist or belongs to someone else.
    fn mark_notification_read(
        &self,
        id: NotificationId,
        user_email: &EmailAddress,
    ) -> RepositoryResult<bool>;
    fn mark_all_notifications_read(&self, user_email: &EmailAddress) -> RepositoryResult<usize>;
}

pub trait ScanReader {
    fn list_scans(&self, query: ScanListQuery) -> RepositoryResult<(usize, Vec<ScanRecord>)>;
}

pub trait ScanWriter {
    fn record_scan(&self, record: &NewScanRecord) -> RepositoryResult<ScanRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_skips_previous_pages() {
        let pagination = Pagination {
            page: 3,
            per_page: 20,
        };
        assert_eq!(pagination.offset(), 40);
        assert_eq!(pagination.limit(), 20);
        assert_eq!(Pagination { page: 0, per_page: 20 }.offset(), 0);
    }

    #[test]
    fn offset_saturates_for_huge_pages() {
        let pagination = Pagination {
            page: usize::MAX / 2,
            per_page: 20,
        };
        assert_eq!(pagination.offset(), i64::MAX);

        let pagination = Pagination {
            page: usize::MAX,
            per_page: usize::MAX,
        };
        assert_eq!(pagination.offset(), i64::MAX);
        assert_eq!(pagination.limit(), i64::MAX);
    }
}
