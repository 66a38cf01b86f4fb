//! Repository implementation for tracking events and recipient counters.

use diesel::prelude::*;

use crate::domain::campaign::{ActivityDelta, RecipientActivity};
use crate::domain::tracking::{NewTrackingEvent, Reclassification, RecordedEvent, TrackingEvent};
use crate::domain::types::RecipientId;
use crate::models::tracking::{
    NewTrackingEvent as DbNewTrackingEvent, TrackingEvent as DbTrackingEvent,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TrackingReader, TrackingWriter};

impl TrackingReader for DieselRepository {
    fn list_tracking_events(
        &self,
        recipient_id: RecipientId,
    ) -> RepositoryResult<Vec<TrackingEvent>> {
        use crate::schema::tracking_events;

        let mut conn = self.conn()?;
        tracking_events::table
            .filter(tracking_events::recipient_id.eq(recipient_id.get()))
            .order((tracking_events::created_at.asc(), tracking_events::id.asc()))
            .load::<DbTrackingEvent>(&mut conn)?
            .into_iter()
            .map(|event| TrackingEvent::try_from(event).map_err(RepositoryError::from))
            .collect()
    }
}

impl TrackingWriter for DieselRepository {
    fn record_tracking_event(
        &self,
        event: &NewTrackingEvent,
        delta: &ActivityDelta,
    ) -> RepositoryResult<RecordedEvent> {
        use crate::schema::{recipients, tracking_events};

        let mut conn = self.conn()?;
        let db_new_event = DbNewTrackingEvent::from(event);
        let recipient_id = event.recipient_id.get();

        let (stored, first_click) = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let stored = diesel::insert_into(tracking_events::table)
                .values(&db_new_event)
                .get_result::<DbTrackingEvent>(conn)?;

            if delta.opens != 0 || delta.clicks != 0 || delta.bot_clicks != 0 {
                diesel::update(recipients::table.find(recipient_id))
                    .set((
                        recipients::open_count.eq(recipients::open_count + delta.opens),
                        recipients::click_count.eq(recipients::click_count + delta.clicks),
                        recipients::bot_click_count
                            .eq(recipients::bot_click_count + delta.bot_clicks),
                    ))
                    .execute(conn)?;
            }

            // First-seen timestamps are only written while still empty.
            if let Some(opened_at) = delta.opened_at {
                diesel::update(
                    recipients::table
                        .find(recipient_id)
                        .filter(recipients::opened_at.is_null()),
                )
                .set(recipients::opened_at.eq(opened_at))
                .execute(conn)?;
            }
            // Exactly one concurrent click can win this update.
            let mut first_click = false;
            if let Some(clicked_at) = delta.clicked_at {
                let updated = diesel::update(
                    recipients::table
                        .find(recipient_id)
                        .filter(recipients::clicked_at.is_null()),
                )
                .set(recipients::clicked_at.eq(clicked_at))
                .execute(conn)?;
                first_click = updated == 1;
            }

            Ok((stored, first_click))
        })?;

        Ok(RecordedEvent {
            event: TrackingEvent::try_from(stored)?,
            first_click,
        })
    }

    fn replace_recipient_activity(
        &self,
        recipient_id: RecipientId,
        activity: &RecipientActivity,
        reclassified: &[Reclassification],
    ) -> RepositoryResult<()> {
        use crate::schema::{recipients, tracking_events};

        let mut conn = self.conn()?;

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            for change in reclassified {
                diesel::update(tracking_events::table.find(change.event_id.get()))
                    .set((
                        tracking_events::automated.eq(change.classification.is_automated()),
                        tracking_events::reason
                            .eq(change.classification.reason().map(|reason| reason.as_str())),
                    ))
                    .execute(conn)?;
            }

            let updated = diesel::update(recipients::table.find(recipient_id.get()))
                .set((
                    recipients::open_count.eq(activity.open_count),
                    recipients::click_count.eq(activity.click_count),
                    recipients::bot_click_count.eq(activity.bot_click_count),
                    recipients::opened_at.eq(activity.opened_at),
                    recipients::clicked_at.eq(activity.clicked_at),
                ))
                .execute(conn)?;

            if updated == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            Ok(())
        })
        .map_err(RepositoryError::from)
    }
}
