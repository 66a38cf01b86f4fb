#![allow(dead_code)]

use chrono::{NaiveDateTime, Utc};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use petawall::db::{DbPool, establish_connection_pool};
use petawall::domain::campaign::{Campaign, NewCampaign, NewRecipient, Recipient};
use petawall::domain::types::{CampaignName, EmailAddress, EmailSubject, TargetUrl};
use petawall::repository::{CampaignWriter, DieselRepository, RecipientReader, RecipientWriter};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Migrated SQLite database living in a temporary directory.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create pool");

        let mut conn = pool.get().expect("get connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");

        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn new_campaign(name: &str, owner: &str, landing_url: Option<&str>) -> NewCampaign {
    NewCampaign {
        name: CampaignName::new(name).expect("name"),
        subject: EmailSubject::new("Password expiry notice").expect("subject"),
        landing_url: landing_url.map(|url| TargetUrl::new(url).expect("url")),
        owner_email: EmailAddress::new(owner).expect("owner"),
    }
}

/// Creates a draft campaign with one recipient per email.
pub fn seed_campaign(
    repo: &DieselRepository,
    landing_url: Option<&str>,
    emails: &[&str],
) -> (Campaign, Vec<Recipient>) {
    let campaign = repo
        .create_campaign(
            &new_campaign("Quarterly drill", "owner@example.com", landing_url),
            now(),
        )
        .expect("create campaign");

    let recipients = emails
        .iter()
        .map(|email| {
            NewRecipient::new(campaign.id, EmailAddress::new(*email).expect("email"), None)
        })
        .collect::<Vec<_>>();
    repo.add_recipients(&recipients).expect("add recipients");

    let recipients = repo.list_recipients(campaign.id).expect("list recipients");
    (campaign, recipients)
}

pub fn server_config() -> petawall::models::config::ServerConfig {
    petawall::models::config::ServerConfig {
        address: "127.0.0.1".to_string(),
        port: 0,
        database_url: ":memory:".to_string(),
        templates_dir: "templates/**/*".to_string(),
        public_url: "https://track.example.com".to_string(),
        ollama_url: "http://127.0.0.1:11434".to_string(),
        ollama_default_model: "llama3.1".to_string(),
        ollama_timeout_secs: 5,
        max_app_file_size: 1024 * 1024,
        max_pcap_file_size: 1024 * 1024,
        max_source_file_size: 1024 * 1024,
        min_human_click_delay_secs: 3,
        bot_ip_ranges: vec!["203.0.113.0/24".to_string()],
        trust_forwarded_for: false,
    }
}
