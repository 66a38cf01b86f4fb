use std::io::Read;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;
use validator::Validate;

use crate::domain::campaign::NewCampaign;
use crate::domain::types::{CampaignName, EmailAddress, EmailSubject, TargetUrl};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Payload for creating a phishing simulation campaign.
pub struct CreateCampaignForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
    /// Page human clicks are redirected to; blank shows the awareness page.
    #[serde(default)]
    pub landing_url: Option<String>,
    #[validate(email)]
    pub owner_email: String,
}

impl CreateCampaignForm {
    pub fn into_new_campaign(self) -> Result<NewCampaign, FormError> {
        self.validate()?;

        let landing_url = self
            .landing_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| TargetUrl::new(url).map_err(|_| FormError::InvalidUrl))
            .transpose()?;

        Ok(NewCampaign {
            name: CampaignName::new(self.name).map_err(|_| FormError::InvalidName)?,
            subject: EmailSubject::new(self.subject).map_err(|_| FormError::InvalidSubject)?,
            landing_url,
            owner_email: EmailAddress::new(self.owner_email).map_err(|_| FormError::InvalidEmail)?,
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RecipientInput {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddRecipientsForm {
    pub recipients: Vec<RecipientInput>,
}

#[derive(MultipartForm)]
pub struct UploadRecipientsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
}

impl UploadRecipientsForm {
    pub fn parse(&self) -> Result<Vec<RecipientInput>, FormError> {
        let file = self.csv.file.reopen()?;
        parse_recipients_csv(file)
    }
}

/// Reads recipients from CSV with a required `email` and an optional `name` column.
///
/// Header names are matched case-insensitively and blank rows are skipped.
/// Row numbers in errors are the 1-based line the record starts on.
pub fn parse_recipients_csv<R: Read>(reader: R) -> Result<Vec<RecipientInput>, FormError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(wanted))
    };
    let email_column = column("email").ok_or(FormError::MissingColumn("email"))?;
    let name_column = column("name");

    let mut recipients = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let email = record.get(email_column).unwrap_or_default();
        if EmailAddress::new(email).is_err() {
            return Err(FormError::InvalidRow {
                row: record.position().map_or(0, |position| position.line()),
                email: email.to_string(),
            });
        }

        let name = name_column
            .and_then(|column| record.get(column))
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        recipients.push(RecipientInput {
            email: email.to_string(),
            name,
        });
    }

    Ok(recipients)
}
