//! Diesel models for campaigns and their recipients.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::campaign::{
    Campaign as DomainCampaign, NewCampaign as DomainNewCampaign,
    NewRecipient as DomainNewRecipient, Recipient as DomainRecipient,
};
use crate::domain::types::{
    CampaignId, CampaignName, EmailAddress, EmailSubject, RecipientId, RecipientName, TargetUrl,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::campaigns)]
/// Diesel model for [`crate::domain::campaign::Campaign`].
pub struct Campaign {
    pub id: i32,
    pub name: String,
    pub subject: String,
    pub landing_url: Option<String>,
    pub owner_email: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub launched_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::campaigns)]
pub struct NewCampaign<'a> {
    pub name: &'a str,
    pub subject: &'a str,
    pub landing_url: Option<&'a str>,
    pub owner_email: &'a str,
    pub status: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Campaign, foreign_key = campaign_id))]
#[diesel(table_name = crate::schema::recipients)]
/// Diesel model for [`crate::domain::campaign::Recipient`].
pub struct Recipient {
    pub id: i32,
    pub campaign_id: i32,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
    pub sent_at: Option<NaiveDateTime>,
    pub opened_at: Option<NaiveDateTime>,
    pub clicked_at: Option<NaiveDateTime>,
    pub open_count: i32,
    pub click_count: i32,
    pub bot_click_count: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipients)]
pub struct NewRecipient<'a> {
    pub campaign_id: i32,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub token: String,
}

impl TryFrom<Campaign> for DomainCampaign {
    type Error = TypeConstraintError;

    fn try_from(campaign: Campaign) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::new(campaign.id)?,
            name: CampaignName::new(campaign.name)?,
            subject: EmailSubject::new(campaign.subject)?,
            landing_url: campaign.landing_url.map(TargetUrl::new).transpose()?,
            owner_email: EmailAddress::new(campaign.owner_email)?,
            status: campaign.status.parse()?,
            created_at: campaign.created_at,
            launched_at: campaign.launched_at,
        })
    }
}

impl<'a> NewCampaign<'a> {
    pub fn from_domain(campaign: &'a DomainNewCampaign, created_at: NaiveDateTime) -> Self {
        Self {
            name: campaign.name.as_str(),
            subject: campaign.subject.as_str(),
            landing_url: campaign.landing_url.as_ref().map(TargetUrl::as_str),
            owner_email: campaign.owner_email.as_str(),
            status: "draft",
            created_at,
        }
    }
}

impl TryFrom<Recipient> for DomainRecipient {
    type Error = TypeConstraintError;

    fn try_from(recipient: Recipient) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecipientId::new(recipient.id)?,
            campaign_id: CampaignId::new(recipient.campaign_id)?,
            email: EmailAddress::new(recipient.email)?,
            name: recipient
                .name
                .filter(|name| !name.trim().is_empty())
                .map(RecipientName::new)
                .transpose()?,
            token: recipient.token.parse()?,
            sent_at: recipient.sent_at,
            opened_at: recipient.opened_at,
            clicked_at: recipient.clicked_at,
            open_count: recipient.open_count,
            click_count: recipient.click_count,
            bot_click_count: recipient.bot_click_count,
        })
    }
}

impl<'a> From<&'a DomainNewRecipient> for NewRecipient<'a> {
    fn from(recipient: &'a DomainNewRecipient) -> Self {
        Self {
            campaign_id: recipient.campaign_id.get(),
            email: recipient.email.as_str(),
            name: recipient.name.as_ref().map(RecipientName::as_str),
            token: recipient.token.to_string(),
        }
    }
}
