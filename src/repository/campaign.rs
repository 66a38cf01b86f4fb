//! Repository implementation for campaigns and recipients.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::campaign::{Campaign, CampaignStatus, NewCampaign, NewRecipient, Recipient};
use crate::domain::types::{CampaignId, TrackingToken};
use crate::models::campaign::{
    Campaign as DbCampaign, NewCampaign as DbNewCampaign, NewRecipient as DbNewRecipient,
    Recipient as DbRecipient,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    CampaignListQuery, CampaignReader, CampaignWriter, DieselRepository, RecipientReader,
    RecipientWriter,
};

impl CampaignReader for DieselRepository {
    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;
        let db_campaign = campaigns::table
            .find(id.get())
            .first::<DbCampaign>(&mut conn)
            .optional()?;

        db_campaign
            .map(|campaign| Campaign::try_from(campaign).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_campaigns(&self, query: CampaignListQuery) -> RepositoryResult<(usize, Vec<Campaign>)> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = campaigns::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(owner) = &query.owner_email {
                items = items.filter(campaigns::owner_email.eq(owner.as_str().to_string()));
            }
            if let Some(status) = query.status {
                items = items.filter(campaigns::status.eq(status.as_str()));
            }
            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered()
            .order(campaigns::created_at.desc())
            .then_order_by(campaigns::id.desc());
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let campaigns = items
            .load::<DbCampaign>(&mut conn)?
            .into_iter()
            .map(|campaign| Campaign::try_from(campaign).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, campaigns))
    }

    fn list_campaign_ids(&self) -> RepositoryResult<Vec<CampaignId>> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;
        campaigns::table
            .select(campaigns::id)
            .order(campaigns::id.asc())
            .load::<i32>(&mut conn)?
            .into_iter()
            .map(|id| CampaignId::new(id).map_err(RepositoryError::from))
            .collect()
    }
}

impl CampaignWriter for DieselRepository {
    fn create_campaign(
        &self,
        campaign: &NewCampaign,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<Campaign> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;
        let db_new_campaign = DbNewCampaign::from_domain(campaign, created_at);

        let db_campaign = diesel::insert_into(campaigns::table)
            .values(&db_new_campaign)
            .get_result::<DbCampaign>(&mut conn)?;

        Ok(Campaign::try_from(db_campaign)?)
    }

    fn launch_campaign(&self, id: CampaignId, sent_at: NaiveDateTime) -> RepositoryResult<usize> {
        use crate::schema::{campaigns, recipients};

        let mut conn = self.conn()?;

        conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let sent = diesel::update(
                recipients::table
                    .filter(recipients::campaign_id.eq(id.get()))
                    .filter(recipients::sent_at.is_null()),
            )
            .set(recipients::sent_at.eq(sent_at))
            .execute(conn)?;

            diesel::update(campaigns::table.find(id.get()))
                .set((
                    campaigns::status.eq(CampaignStatus::Active.as_str()),
                    campaigns::launched_at.eq(sent_at),
                ))
                .execute(conn)?;

            Ok(sent)
        })
        .map_err(RepositoryError::from)
    }

    fn set_campaign_status(&self, id: CampaignId, status: CampaignStatus) -> RepositoryResult<()> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;
        let updated = diesel::update(campaigns::table.find(id.get()))
            .set(campaigns::status.eq(status.as_str()))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl RecipientReader for DieselRepository {
    fn get_recipient_by_token(&self, token: TrackingToken) -> RepositoryResult<Option<Recipient>> {
        use crate::schema::recipients;

        let mut conn = self.conn()?;
        let db_recipient = recipients::table
            .filter(recipients::token.eq(token.to_string()))
            .first::<DbRecipient>(&mut conn)
            .optional()?;

        db_recipient
            .map(|recipient| Recipient::try_from(recipient).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_recipients(&self, campaign_id: CampaignId) -> RepositoryResult<Vec<Recipient>> {
        use crate::schema::recipients;

        let mut conn = self.conn()?;
        recipients::table
            .filter(recipients::campaign_id.eq(campaign_id.get()))
            .order(recipients::id.asc())
            .load::<DbRecipient>(&mut conn)?
            .into_iter()
            .map(|recipient| Recipient::try_from(recipient).map_err(RepositoryError::from))
            .collect()
    }
}

impl RecipientWriter for DieselRepository {
    fn add_recipients(&self, new_recipients: &[NewRecipient]) -> RepositoryResult<usize> {
        use crate::schema::recipients;

        if new_recipients.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let rows = new_recipients
            .iter()
            .map(DbNewRecipient::from)
            .collect::<Vec<_>>();

        let inserted = diesel::insert_or_ignore_into(recipients::table)
            .values(&rows)
            .execute(&mut conn)?;

        Ok(inserted)
    }
}
