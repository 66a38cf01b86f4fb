//! Diesel models for recorded opens and clicks.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::tracking::{
    AutomationReason, NewTrackingEvent as DomainNewTrackingEvent,
    TrackingEvent as DomainTrackingEvent,
};
use crate::domain::types::{CampaignId, RecipientId, TrackingEventId, TypeConstraintError};
use crate::models::campaign::Recipient;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Recipient, foreign_key = recipient_id))]
#[diesel(table_name = crate::schema::tracking_events)]
pub struct TrackingEvent {
    pub id: i32,
    pub recipient_id: i32,
    pub campaign_id: i32,
    pub kind: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub automated: bool,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tracking_events)]
pub struct NewTrackingEvent<'a> {
    pub recipient_id: i32,
    pub campaign_id: i32,
    pub kind: &'static str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub automated: bool,
    pub reason: Option<&'static str>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<TrackingEvent> for DomainTrackingEvent {
    type Error = TypeConstraintError;

    fn try_from(event: TrackingEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TrackingEventId::new(event.id)?,
            recipient_id: RecipientId::new(event.recipient_id)?,
            campaign_id: CampaignId::new(event.campaign_id)?,
            kind: event.kind.parse()?,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            automated: event.automated,
            reason: event
                .reason
                .as_deref()
                .map(str::parse::<AutomationReason>)
                .transpose()?,
            created_at: event.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewTrackingEvent> for NewTrackingEvent<'a> {
    fn from(event: &'a DomainNewTrackingEvent) -> Self {
        Self {
            recipient_id: event.recipient_id.get(),
            campaign_id: event.campaign_id.get(),
            kind: event.kind.as_str(),
            ip_address: event.ip_address.as_deref(),
            user_agent: event.user_agent.as_deref(),
            automated: event.classification.is_automated(),
            reason: event.classification.reason().map(|reason| reason.as_str()),
            created_at: event.created_at,
        }
    }
}
