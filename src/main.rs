use std::env;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info};
use crate::config::load_config;
use crate::initialization::{config_path_from_env, init};
use crate::worker::run;

mod config;
mod evaluator;
mod initialization;
mod logging;
mod manager_forecast;
mod manager_ntfy;
pub mod models;
mod worker;

fn main() -> Result<()> {
    let config_path = config_path_from_env();

    if env::args().any(|a| a == "--validate") {
        return validate(&config_path);
    }

    let status = handler(&config_path, Utc::now())?;
    info!("{}", status);

    Ok(())
}

/// Runs the job once, as invoked by the trigger, and returns the completion status
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
/// * 'now' - time of the invocation
fn handler(config_path: &str, now: DateTime<Utc>) -> Result<String> {
    // If initialization fails we neither log nor notify, the configuration is what tells us how
    let (config, mgr) = init(config_path)?;

    match run(&config.job, &mgr, now) {
        Ok(outcome) => {
            info!("Run finished: {}", outcome);
            Ok(outcome.status().to_string())
        },
        Err(e) => {
            error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Loads and validates the configuration and prints a summary of the settings
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
fn validate(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;

    println!("========================================");
    println!("Configuration Settings ({})", config_path);
    println!("----------------------------------------");
    println!("{}", config.job);
    println!("========================================");

    Ok(())
}
