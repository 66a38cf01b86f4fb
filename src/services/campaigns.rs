//! Services managing phishing simulation campaigns.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;

use crate::domain::campaign::{Campaign, CampaignStats, CampaignStatus, NewRecipient};
use crate::domain::types::{CampaignId, EmailAddress, RecipientName};
use crate::dto::campaigns::{
    CampaignDetail, CampaignSummary, CampaignsQuery, LaunchSummary, RecipientView,
    RecipientsAdded, TrackingLinks,
};
use crate::forms::campaigns::{CreateCampaignForm, RecipientInput, UploadRecipientsForm};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    CampaignListQuery, CampaignReader, CampaignWriter, NotificationWriter, RecipientReader,
    RecipientWriter,
};
use crate::services::notifications;
use crate::services::{ServiceError, ServiceResult};

/// Loads a campaign, mapping unknown and malformed ids to [`ServiceError::NotFound`].
pub(crate) fn load_campaign<R>(repo: &R, campaign_id: i32) -> ServiceResult<Campaign>
where
    R: CampaignReader + ?Sized,
{
    let id = CampaignId::new(campaign_id).map_err(|_| ServiceError::NotFound)?;
    repo.get_campaign_by_id(id)?.ok_or(ServiceError::NotFound)
}

pub fn create_campaign<R>(repo: &R, form: CreateCampaignForm) -> ServiceResult<Campaign>
where
    R: CampaignWriter + ?Sized,
{
    let new_campaign = form.into_new_campaign().map_err(|err| {
        log::warn!("Rejected campaign form: {err}");
        ServiceError::Form(format!("Invalid campaign: {err}"))
    })?;

    let campaign = repo
        .create_campaign(&new_campaign, Utc::now().naive_utc())
        .map_err(|err| {
            log::error!("Failed to create campaign: {err}");
            err
        })?;

    log::info!(
        "Campaign {} created by {}",
        campaign.id,
        campaign.owner_email
    );
    Ok(campaign)
}

fn to_new_recipients(
    campaign_id: CampaignId,
    inputs: Vec<RecipientInput>,
) -> ServiceResult<(Vec<NewRecipient>, usize)> {
    let mut seen = HashSet::new();
    let mut recipients = Vec::with_capacity(inputs.len());
    let mut duplicates = 0;

    for (index, input) in inputs.into_iter().enumerate() {
        let email = EmailAddress::new(input.email.as_str()).map_err(|_| {
            ServiceError::Form(format!(
                "Invalid email address for recipient {}: {}",
                index + 1,
                input.email.trim()
            ))
        })?;

        if !seen.insert(email.clone()) {
            duplicates += 1;
            continue;
        }

        // Names that sanitize down to nothing are dropped rather than rejected.
        let name = input.name.and_then(|name| RecipientName::new(name).ok());
        recipients.push(NewRecipient::new(campaign_id, email, name));
    }

    Ok((recipients, duplicates))
}

/// Adds recipients to a draft campaign, ignoring emails it already contains.
pub fn add_recipients<R>(
    repo: &R,
    campaign_id: i32,
    inputs: Vec<RecipientInput>,
) -> ServiceResult<RecipientsAdded>
where
    R: CampaignReader + RecipientWriter + ?Sized,
{
    let campaign = load_campaign(repo, campaign_id)?;
    if campaign.status != CampaignStatus::Draft {
        return Err(ServiceError::Conflict(
            "Recipients can only be added to draft campaigns".to_string(),
        ));
    }

    let (recipients, duplicates) = to_new_recipients(campaign.id, inputs)?;
    if recipients.is_empty() {
        return Ok(RecipientsAdded {
            added: 0,
            skipped: duplicates,
        });
    }

    let added = repo.add_recipients(&recipients).map_err(|err| {
        log::error!("Failed to add recipients to campaign {}: {err}", campaign.id);
        err
    })?;

    Ok(RecipientsAdded {
        added,
        skipped: duplicates + recipients.len().saturating_sub(added),
    })
}

/// Parses the uploaded CSV file and adds its rows as recipients.
pub fn upload_recipients<R>(
    repo: &R,
    campaign_id: i32,
    form: &UploadRecipientsForm,
) -> ServiceResult<RecipientsAdded>
where
    R: CampaignReader + RecipientWriter + ?Sized,
{
    let inputs = form.parse().map_err(|err| {
        log::warn!("Failed to parse recipients CSV: {err}");
        ServiceError::Form(format!("Invalid recipients file: {err}"))
    })?;

    add_recipients(repo, campaign_id, inputs)
}

/// Activates a draft campaign and marks every recipient as sent.
pub fn launch_campaign<R>(repo: &R, campaign_id: i32) -> ServiceResult<LaunchSummary>
where
    R: CampaignReader + CampaignWriter + RecipientReader + NotificationWriter + ?Sized,
{
    let campaign = load_campaign(repo, campaign_id)?;
    if campaign.status != CampaignStatus::Draft {
        return Err(ServiceError::Conflict(
            "Only draft campaigns can be launched".to_string(),
        ));
    }

    if repo.list_recipients(campaign.id)?.is_empty() {
        return Err(ServiceError::Conflict(
            "Campaign has no recipients".to_string(),
        ));
    }

    let sent = repo.launch_campaign(campaign.id, Utc::now().naive_utc())?;
    log::info!("Campaign {} launched to {sent} recipients", campaign.id);

    if let Err(err) = notifications::notify(
        repo,
        &campaign.owner_email,
        "Campaign launched",
        &format!("\"{}\" was sent to {sent} recipients.", campaign.name),
        Some(format!("/api/v1/campaigns/{}", campaign.id)),
    ) {
        log::error!("Failed to notify owner of campaign {}: {err}", campaign.id);
    }

    let campaign = load_campaign(repo, campaign_id)?;
    Ok(LaunchSummary { campaign, sent })
}

pub fn complete_campaign<R>(repo: &R, campaign_id: i32) -> ServiceResult<Campaign>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    let campaign = load_campaign(repo, campaign_id)?;
    if campaign.status != CampaignStatus::Active {
        return Err(ServiceError::Conflict(
            "Only active campaigns can be completed".to_string(),
        ));
    }

    repo.set_campaign_status(campaign.id, CampaignStatus::Completed)?;
    log::info!("Campaign {} completed", campaign.id);

    load_campaign(repo, campaign_id)
}

pub fn campaign_detail<R>(
    repo: &R,
    public_url: &str,
    campaign_id: i32,
) -> ServiceResult<CampaignDetail>
where
    R: CampaignReader + RecipientReader + ?Sized,
{
    let campaign = load_campaign(repo, campaign_id)?;
    let recipients = repo.list_recipients(campaign.id)?;
    let stats = CampaignStats::from_recipients(&recipients);

    let recipients = recipients
        .into_iter()
        .map(|recipient| RecipientView {
            links: TrackingLinks::new(public_url, recipient.token),
            recipient,
        })
        .collect();

    Ok(CampaignDetail {
        campaign,
        stats,
        recipients,
    })
}

pub fn list_campaigns<R>(
    repo: &R,
    params: CampaignsQuery,
) -> ServiceResult<Paginated<CampaignSummary>>
where
    R: CampaignReader + RecipientReader + ?Sized,
{
    let page = params.page.unwrap_or(1).max(1);
    let mut query = CampaignListQuery::default().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(owner) = params.owner.as_deref().filter(|s| !s.trim().is_empty()) {
        let owner = EmailAddress::new(owner)
            .map_err(|_| ServiceError::Form("Invalid owner email".to_string()))?;
        query = query.owner(owner);
    }

    if let Some(status) = params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status = CampaignStatus::from_str(status.trim())
            .map_err(|_| ServiceError::Form(format!("Invalid status: {status}")))?;
        query = query.status(status);
    }

    let (total, campaigns) = repo.list_campaigns(query).map_err(|err| {
        log::error!("Failed to list campaigns: {err}");
        err
    })?;

    let summaries = campaigns
        .into_iter()
        .map(|campaign| {
            let recipients = repo.list_recipients(campaign.id)?;
            Ok(CampaignSummary {
                stats: CampaignStats::from_recipients(&recipients),
                campaign,
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(Paginated::new(summaries, page, DEFAULT_ITEMS_PER_PAGE, total))
}
