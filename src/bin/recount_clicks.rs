//! Re-runs the automated-scan heuristic over stored tracking events.
//!
//! Usage: `recount_clicks [CAMPAIGN_ID]`. Without an id every campaign is recounted.

use std::env;

use config::Config;
use dotenvy::dotenv;

use petawall::db::establish_connection_pool;
use petawall::models::config::ServerConfig;
use petawall::repository::{CampaignReader, DieselRepository};
use petawall::services::bot_detection::BotDetector;
use petawall::services::tracking::recount_clicks;

fn campaign_ids(repo: &DieselRepository, arg: Option<String>) -> Result<Vec<i32>, String> {
    match arg {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .map(|id| vec![id])
            .map_err(|_| format!("Invalid campaign id: {raw}")),
        None => repo
            .list_campaign_ids()
            .map(|ids| ids.into_iter().map(|id| id.get()).collect())
            .map_err(|err| format!("Failed to list campaigns: {err}")),
    }
}

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        // Add `./config/default.yaml`
        .add_source(config::File::with_name("config/default"))
        // Add environment-specific overrides
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        // Add settings from the environment (with a prefix of APP)
        .add_source(petawall::environment_source())
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let server_config = match settings.try_deserialize::<ServerConfig>() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let repo = DieselRepository::new(pool);
    let detector = BotDetector::from_config(&server_config);

    let ids = match campaign_ids(&repo, env::args().nth(1)) {
        Ok(ids) => ids,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let mut failed = false;
    for id in ids {
        match recount_clicks(&repo, &detector, id) {
            Ok(summary) => log::info!(
                "Campaign {id}: {} recipients, {} events, {} reclassified",
                summary.recipients,
                summary.events,
                summary.reclassified
            ),
            Err(err) => {
                log::error!("Failed to recount campaign {id}: {err}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
