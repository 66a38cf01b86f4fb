//! Open and click tracking for campaign recipients.

use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::domain::campaign::{ActivityDelta, Campaign, Recipient, RecipientActivity};
use crate::domain::tracking::{
    Classification, NewTrackingEvent, Reclassification, RecordedEvent, TrackingEvent,
    TrackingKind,
};
use crate::domain::types::TrackingToken;
use crate::dto::campaigns::RecountSummary;
use crate::repository::{
    CampaignReader, NotificationWriter, RecipientReader, TrackingReader, TrackingWriter,
};
use crate::services::bot_detection::BotDetector;
use crate::services::campaigns::load_campaign;
use crate::services::notifications;
use crate::services::{ServiceError, ServiceResult};

/// Client details captured from the tracking request.
#[derive(Clone, Copy, Debug, Default)]
pub struct Visitor<'a> {
    pub user_agent: Option<&'a str>,
    pub ip: Option<&'a str>,
}

#[derive(Debug)]
pub struct TrackingOutcome {
    pub campaign: Campaign,
    pub recipient: Recipient,
    /// `None` when the event was ignored because the email was never sent.
    pub classification: Option<Classification>,
}

/// Counter changes caused by one event.
fn activity_delta(
    kind: TrackingKind,
    classification: Classification,
    at: NaiveDateTime,
) -> ActivityDelta {
    match (kind, classification) {
        (TrackingKind::Open, Classification::Human) => ActivityDelta {
            opens: 1,
            opened_at: Some(at),
            ..ActivityDelta::default()
        },
        (TrackingKind::Open, Classification::Automated(_)) => ActivityDelta::default(),
        // A click implies the email was opened even when the pixel was blocked.
        (TrackingKind::Click, Classification::Human) => ActivityDelta {
            clicks: 1,
            opened_at: Some(at),
            clicked_at: Some(at),
            ..ActivityDelta::default()
        },
        (TrackingKind::Click, Classification::Automated(_)) => ActivityDelta {
            bot_clicks: 1,
            ..ActivityDelta::default()
        },
    }
}

fn seconds_since(sent_at: Option<NaiveDateTime>, at: NaiveDateTime) -> Option<i64> {
    sent_at.map(|sent_at| (at - sent_at).num_seconds())
}

fn record_event<R>(
    repo: &R,
    detector: &BotDetector,
    token: &str,
    kind: TrackingKind,
    visitor: Visitor<'_>,
    at: NaiveDateTime,
) -> ServiceResult<TrackingOutcome>
where
    R: CampaignReader + RecipientReader + TrackingWriter + NotificationWriter + ?Sized,
{
    let token = TrackingToken::from_str(token).map_err(|_| ServiceError::NotFound)?;
    let recipient = repo
        .get_recipient_by_token(token)?
        .ok_or(ServiceError::NotFound)?;
    let campaign = load_campaign(repo, recipient.campaign_id.get())?;

    if recipient.sent_at.is_none() {
        log::debug!(
            "Ignoring {kind} for unsent recipient {} of campaign {}",
            recipient.id,
            campaign.id
        );
        return Ok(TrackingOutcome {
            campaign,
            recipient,
            classification: None,
        });
    }

    let classification = detector.classify(
        visitor.user_agent,
        visitor.ip,
        seconds_since(recipient.sent_at, at),
    );

    let event = NewTrackingEvent {
        recipient_id: recipient.id,
        campaign_id: campaign.id,
        kind,
        ip_address: visitor.ip.map(str::to_string),
        user_agent: visitor.user_agent.map(str::to_string),
        classification,
        created_at: at,
    };
    let recorded = repo
        .record_tracking_event(&event, &activity_delta(kind, classification, at))
        .map_err(|err| {
            log::error!("Failed to record {kind} for recipient {}: {err}", recipient.id);
            err
        })?;

    if let Some(reason) = classification.reason() {
        log::info!(
            "Automated {kind} on campaign {} ({reason})",
            campaign.id
        );
    }

    if recorded.first_click {
        let message = format!("{} clicked the link in \"{}\".", recipient.email, campaign.name);
        if let Err(err) = notifications::notify(
            repo,
            &campaign.owner_email,
            "Phishing link clicked",
            &message,
            Some(format!("/api/v1/campaigns/{}", campaign.id)),
        ) {
            log::error!("Failed to notify owner of campaign {}: {err}", campaign.id);
        }
    }

    Ok(TrackingOutcome {
        campaign,
        recipient,
        classification: Some(classification),
    })
}

/// Records a tracking pixel load.
pub fn record_open<R>(
    repo: &R,
    detector: &BotDetector,
    token: &str,
    visitor: Visitor<'_>,
    at: NaiveDateTime,
) -> ServiceResult<TrackingOutcome>
where
    R: CampaignReader + RecipientReader + TrackingWriter + NotificationWriter + ?Sized,
{
    record_event(repo, detector, token, TrackingKind::Open, visitor, at)
}

/// Records a click on the tracked link.
pub fn record_click<R>(
    repo: &R,
    detector: &BotDetector,
    token: &str,
    visitor: Visitor<'_>,
    at: NaiveDateTime,
) -> ServiceResult<TrackingOutcome>
where
    R: CampaignReader + RecipientReader + TrackingWriter + NotificationWriter + ?Sized,
{
    record_event(repo, detector, token, TrackingKind::Click, visitor, at)
}

/// Rebuilds the counters of one recipient from its events under the current detector.
///
/// `events` must be ordered oldest first.
pub fn rebuild_activity(
    detector: &BotDetector,
    recipient: &Recipient,
    events: &[TrackingEvent],
) -> (RecipientActivity, Vec<Reclassification>) {
    let mut activity = RecipientActivity::default();
    let mut reclassified = Vec::new();

    for event in events {
        let classification = detector.classify(
            event.user_agent.as_deref(),
            event.ip_address.as_deref(),
            seconds_since(recipient.sent_at, event.created_at),
        );

        if event.automated != classification.is_automated()
            || event.reason != classification.reason()
        {
            reclassified.push(Reclassification {
                event_id: event.id,
                classification,
            });
        }

        let delta = activity_delta(event.kind, classification, event.created_at);
        activity.open_count += delta.opens;
        activity.click_count += delta.clicks;
        activity.bot_click_count += delta.bot_clicks;
        activity.opened_at = activity.opened_at.or(delta.opened_at);
        activity.clicked_at = activity.clicked_at.or(delta.clicked_at);
    }

    (activity, reclassified)
}

/// Reclassifies every stored event of a campaign and rewrites its recipient counters.
pub fn recount_clicks<R>(
    repo: &R,
    detector: &BotDetector,
    campaign_id: i32,
) -> ServiceResult<RecountSummary>
where
    R: CampaignReader + RecipientReader + TrackingReader + TrackingWriter + ?Sized,
{
    let campaign = load_campaign(repo, campaign_id)?;
    let mut summary = RecountSummary::default();

    for recipient in repo.list_recipients(campaign.id)? {
        let events = repo.list_tracking_events(recipient.id)?;
        let (activity, reclassified) = rebuild_activity(detector, &recipient, &events);

        repo.replace_recipient_activity(recipient.id, &activity, &reclassified)
            .map_err(|err| {
                log::error!("Failed to recount recipient {}: {err}", recipient.id);
                err
            })?;

        summary.recipients += 1;
        summary.events += events.len();
        summary.reclassified += reclassified.len();
    }

    log::info!(
        "Recounted campaign {}: {} recipients, {} events, {} reclassified",
        campaign.id,
        summary.recipients,
        summary.events,
        summary.reclassified
    );

    Ok(summary)
}
