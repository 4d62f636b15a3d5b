pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::{API_KEY_ENV, AppConfig};
use crate::core::investment::LoanParameters;
use crate::core::quota::QuotaTracker;
use anyhow::{Context, Result};
use tracing::{debug, info};

pub enum AppCommand {
    Analyze { address: String, show_raw: bool },
    Invest { params: LoanParameters, show_schedule: bool },
    Quota { reset: bool },
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        "Loaded config with {:?} quota storage, {} calls per month",
        config.quota.storage, config.quota.max_calls
    );
    Ok(config)
}

fn quota_tracker(config: &AppConfig) -> Result<QuotaTracker> {
    let store = store::open_quota_store(config)?;
    Ok(QuotaTracker::new(store, config.quota.max_calls))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("propval starting...");

    match command {
        AppCommand::Invest {
            params,
            show_schedule,
        } => cli::invest::run(&params, show_schedule),
        AppCommand::Quota { reset } => {
            let config = load_config(config_path)?;
            let tracker = quota_tracker(&config)?;
            cli::quota::run(&tracker, reset)
        }
        AppCommand::Analyze { address, show_raw } => {
            let config = load_config(config_path)?;
            let api_key = config.api_key().with_context(|| {
                format!("No API key configured, set providers.rentcast.api_key or {API_KEY_ENV}")
            })?;
            let tracker = quota_tracker(&config)?;
            let provider =
                providers::rentcast::RentcastProvider::new(&config.rentcast().base_url, &api_key)?;
            cli::analyze::run(&address, &tracker, &provider, show_raw).await
        }
    }
}
