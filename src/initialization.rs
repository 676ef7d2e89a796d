use std::env;
use std::time::Duration;
use log::info;
use reqwest::blocking::Client;
use thiserror::Error;
use crate::config::{load_config, Config, ConfigError, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_forecast::Forecast;
use crate::manager_ntfy::Ntfy;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct Mgr {
    pub forecast: Forecast,
    pub ntfy: Ntfy,
}

/// Initializes and returns configuration and a Mgr struct holding the initialized managers
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn init(config_path: &str) -> Result<(Config, Mgr), InitializationError> {
    // Load configuration
    let config = load_config(config_path)?;

    // Setup logging
    setup_logger(config.general.log_path.as_deref(), config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("starting rain alert version: {}", env!("CARGO_PKG_VERSION"));

    // One client is shared by both managers
    let client = http_client()?;
    let mgr = Mgr {
        forecast: Forecast::new(client.clone(), &config.endpoints.forecast),
        ntfy: Ntfy::new(client, &config.endpoints.ntfy),
    };

    Ok((config, mgr))
}

/// Builds the blocking http client with bounded connect and request timeouts, no retries
///
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Returns the configuration file path: a `--config=<path>` argument, else the
/// CONFIG_PATH environment variable, else the default path
///
/// # Arguments
///
/// * 'args' - command line arguments
/// * 'env_path' - value of the CONFIG_PATH environment variable, if set
pub fn config_path(args: &[String], env_path: Option<String>) -> String {
    args.iter()
        .find_map(|a| a.strip_prefix("--config="))
        .map(|p| p.to_string())
        .or(env_path.filter(|p| !p.is_empty()))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Reads the configuration path from the process arguments and environment
///
pub fn config_path_from_env() -> String {
    let args: Vec<String> = env::args().collect();
    config_path(&args, env::var(CONFIG_PATH_ENV).ok())
}

/// Error depicting errors that occur while initializing the job
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] ConfigError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("HttpClientError: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
