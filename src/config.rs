use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use chrono_tz::Tz;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

const MAX_FORECAST_RANGE_HOURS: i64 = 16 * 24;
const MAX_TOPIC_LENGTH: usize = 64;
const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_NTFY_URL: &str = "https://ntfy.sh";

/// Validated settings for the forecast job
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
    pub forecast_range_hours: u16,
    pub notification_hours: NotificationHours,
    pub notification_topic: String,
    pub ignore_no_rain: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub ntfy: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: DEFAULT_FORECAST_URL.to_string(),
            ntfy: DEFAULT_NTFY_URL.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LevelFilter::Info,
            log_to_stdout: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub job: JobConfig,
    pub endpoints: Endpoints,
    pub general: General,
}

/// Hours of the day (0-23) at which the job is allowed to notify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHours(BTreeSet<u32>);

impl NotificationHours {
    pub fn contains(&self, hour: u32) -> bool {
        self.0.contains(&hour)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for NotificationHours {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let hours = self.iter().map(|h| h.to_string()).collect::<Vec<String>>();
        write!(f, "{}", hours.join(","))
    }
}

/// The hours field may be given either as `hours = 7` or `hours = [7, 19]`
#[derive(Deserialize)]
#[serde(untagged)]
enum HoursInput {
    Single(i64),
    List(Vec<i64>),
}

impl TryFrom<HoursInput> for NotificationHours {
    type Error = ConfigError;

    fn try_from(input: HoursInput) -> Result<Self, Self::Error> {
        let hours = match input {
            HoursInput::Single(h) => vec![h],
            HoursInput::List(l) => l,
        };

        if hours.is_empty() {
            return Err(ConfigError::ValidationError("notification_hours must not be empty".into()));
        }

        let mut set = BTreeSet::new();
        for h in hours {
            if !(0..=23).contains(&h) {
                return Err(ConfigError::ValidationError(
                    format!("notification_hours must be between 0 and 23, got {}", h)));
            }
            set.insert(h as u32);
        }

        Ok(NotificationHours(set))
    }
}

#[derive(Deserialize)]
struct RawConfig {
    location: Option<String>,
    latitude: f64,
    longitude: f64,
    timezone: String,
    forecast_range_hours: i64,
    notification_hours: HoursInput,
    notification_topic: String,
    #[serde(default)]
    ignore_no_rain: bool,
    #[serde(default)]
    endpoints: Endpoints,
    #[serde(default)]
    general: General,
}

/// ntfy topics are a single path segment: letters, digits, '-' and '_'
fn valid_topic(topic: &str) -> bool {
    topic.len() <= MAX_TOPIC_LENGTH
        && topic.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Loads the configuration file and returns a validated Config
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| ConfigError::ReadError(config_path.to_string(), e))?;

    parse_config(&toml)
}

/// Parses and validates configuration given as TOML
///
/// # Arguments
///
/// * 'toml' - the configuration document
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(toml)?;

    if raw.timezone.is_empty() {
        return Err(ConfigError::ValidationError("timezone must be set".into()));
    }
    if raw.notification_topic.is_empty() {
        return Err(ConfigError::ValidationError("notification_topic must be set".into()));
    }
    if !valid_topic(&raw.notification_topic) {
        return Err(ConfigError::ValidationError(format!(
            "notification_topic {} must be at most {} characters of A-Z, a-z, 0-9, - and _",
            raw.notification_topic, MAX_TOPIC_LENGTH)));
    }
    if !(0..=MAX_FORECAST_RANGE_HOURS).contains(&raw.forecast_range_hours) {
        return Err(ConfigError::ValidationError(
            format!("forecast_range_hours must be between 0 and {}", MAX_FORECAST_RANGE_HOURS)));
    }

    let timezone = raw.timezone.parse::<Tz>()
        .map_err(|e| ConfigError::ValidationError(format!("invalid timezone {}: {}", raw.timezone, e)))?;

    if !(-90.0..=90.0).contains(&raw.latitude) {
        return Err(ConfigError::ValidationError("latitude must be between -90 and 90".into()));
    }
    if !(-180.0..=180.0).contains(&raw.longitude) {
        return Err(ConfigError::ValidationError("longitude must be between -180 and 180".into()));
    }

    let notification_hours = NotificationHours::try_from(raw.notification_hours)?;

    if raw.endpoints.forecast.is_empty() || raw.endpoints.ntfy.is_empty() {
        return Err(ConfigError::ValidationError("endpoints must not be empty".into()));
    }

    Ok(Config {
        job: JobConfig {
            location: raw.location,
            latitude: raw.latitude,
            longitude: raw.longitude,
            timezone,
            forecast_range_hours: raw.forecast_range_hours as u16,
            notification_hours,
            notification_topic: raw.notification_topic,
            ignore_no_rain: raw.ignore_no_rain,
        },
        endpoints: raw.endpoints,
        general: raw.general,
    })
}

/// Settings summary as printed by the validation mode
impl fmt::Display for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Location           : {}", self.location.as_deref().unwrap_or("-"))?;
        writeln!(f, "Coordinates        : {:.4}, {:.4}", self.latitude, self.longitude)?;
        writeln!(f, "Timezone           : {}", self.timezone)?;
        writeln!(f, "Forecast range     : {} hours", self.forecast_range_hours)?;
        writeln!(f, "Notification hours : {}", self.notification_hours)?;
        writeln!(f, "Notification topic : {}", self.notification_topic)?;
        write!(f, "Ignore no rain     : {}", self.ignore_no_rain)
    }
}

#[cfg(test)]
pub(crate) fn test_job(hours: &[u32], ignore_no_rain: bool) -> JobConfig {
    JobConfig {
        location: Some("New York".to_string()),
        latitude: 40.7128,
        longitude: -74.006,
        timezone: chrono_tz::America::New_York,
        forecast_range_hours: 3,
        notification_hours: NotificationHours(hours.iter().copied().collect()),
        notification_topic: "rain-test".to_string(),
        ignore_no_rain,
    }
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ReadError: {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("ParseError: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("ValidationError: {0}")]
    ValidationError(String),
}
