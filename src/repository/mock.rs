//! Mock repository implementations for isolating services in tests.

use chrono::NaiveDateTime;
use mockall::mock;

use crate::domain::campaign::{
    ActivityDelta, Campaign, CampaignStatus, NewCampaign, NewRecipient, Recipient,
    RecipientActivity,
};
use crate::domain::notification::{NewNotification, Notification};
use crate::domain::scan::{NewScanRecord, ScanRecord};
use crate::domain::tracking::{NewTrackingEvent, Reclassification, RecordedEvent, TrackingEvent};
use crate::domain::types::{CampaignId, EmailAddress, NotificationId, RecipientId, TrackingToken};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    CampaignListQuery, CampaignReader, CampaignWriter, NotificationReader, NotificationWriter,
    RecipientReader, RecipientWriter, ScanListQuery, ScanReader, ScanWriter, TrackingReader,
    TrackingWriter,
};

mock! {
    pub Repository {}

    impl CampaignReader for Repository {
        fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>>;
        fn list_campaigns(
            &self,
            query: CampaignListQuery,
        ) -> RepositoryResult<(usize, Vec<Campaign>)>;
        fn list_campaign_ids(&self) -> RepositoryResult<Vec<CampaignId>>;
    }

    impl CampaignWriter for Repository {
        fn create_campaign(
            &self,
            campaign: &NewCampaign,
            created_at: NaiveDateTime,
        ) -> RepositoryResult<Campaign>;
        fn launch_campaign(
            &self,
            id: CampaignId,
            sent_at: NaiveDateTime,
        ) -> RepositoryResult<usize>;
        fn set_campaign_status(
            &self,
            id: CampaignId,
            status: CampaignStatus,
        ) -> RepositoryResult<()>;
    }

    impl RecipientReader for Repository {
        fn get_recipient_by_token(
            &self,
            token: TrackingToken,
        ) -> RepositoryResult<Option<Recipient>>;
        fn list_recipients(&self, campaign_id: CampaignId) -> RepositoryResult<Vec<Recipient>>;
    }

    impl RecipientWriter for Repository {
        fn add_recipients(&self, recipients: &[NewRecipient]) -> RepositoryResult<usize>;
    }

    impl TrackingReader for Repository {
        fn list_tracking_events(
            &self,
            recipient_id: RecipientId,
        ) -> RepositoryResult<Vec<TrackingEvent>>;
    }

    impl TrackingWriter for Repository {
        fn record_tracking_event(
            &self,
            event: &NewTrackingEvent,
            delta: &ActivityDelta,
        ) -> RepositoryResult<RecordedEvent>;
        fn replace_recipient_activity(
            &self,
            recipient_id: RecipientId,
            activity: &RecipientActivity,
            reclassified: &[Reclassification],
        ) -> RepositoryResult<()>;
    }

    impl NotificationReader for Repository {
        fn list_notifications(
            &self,
            user_email: &EmailAddress,
            unread_only: bool,
        ) -> RepositoryResult<Vec<Notification>>;
    }

    impl NotificationWriter for Repository {
        fn create_notification(
            &self,
            notification: &NewNotification,
        ) -> RepositoryResult<Notification>;
        fn mark_notification_read(
            &self,
            id: NotificationId,
            user_email: &EmailAddress,
        ) -> RepositoryResult<bool>;
        fn mark_all_notifications_read(&self, user_email: &EmailAddress) -> RepositoryResult<usize>;
    }

    impl ScanReader for Repository {
        fn list_scans(&self, query: ScanListQuery) -> RepositoryResult<(usize, Vec<ScanRecord>)>;
    }

    impl ScanWriter for Repository {
        fn record_scan(&self, record: &NewScanRecord) -> RepositoryResult<ScanRecord>;
    }
}
