mod models;

use chrono::NaiveDateTime;
use log::warn;
use reqwest::blocking::{Client, Request};
use thiserror::Error;
use crate::config::JobConfig;
use crate::manager_forecast::models::OpenMeteoResponse;
use crate::models::{HourlyForecast, HourlyValue};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Struct for fetching hourly precipitation forecasts from Open-Meteo
pub struct Forecast {
    client: Client,
    url: String,
}

impl Forecast {
    /// Returns a forecast struct ready for fetching precipitation forecasts
    ///
    /// # Arguments
    ///
    /// * 'client' - http client to issue requests with
    /// * 'url' - Open-Meteo forecast endpoint
    pub fn new(client: Client, url: &str) -> Forecast {
        Forecast {
            client,
            url: url.to_string(),
        }
    }

    /// Retrieves the hourly precipitation forecast for the configured location and window
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    pub fn fetch_forecast(&self, cfg: &JobConfig) -> Result<HourlyForecast, ForecastError> {
        let request = self.build_request(cfg)?;

        let response = self.client.execute(request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::StatusError(status.as_u16()));
        }

        let json = response.text()?;

        let data: OpenMeteoResponse = serde_json::from_str(&json)
            .map_err(|e| ForecastError::ParseError(format!("failed to decode response: {}", e)))?;

        to_hourly_forecast(data)
    }

    /// Builds the forecast request
    ///
    /// Hourly precipitation is asked for rather than daily sums, so a window starting at noon
    /// covers noon to noon and not midnight to midnight.
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    fn build_request(&self, cfg: &JobConfig) -> Result<Request, ForecastError> {
        let latitude = format!("{:.6}", cfg.latitude);
        let longitude = format!("{:.6}", cfg.longitude);
        let forecast_hours = cfg.forecast_range_hours.to_string();

        let query = vec![
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("hourly", "precipitation"),
            ("timezone", cfg.timezone.name()),
            ("precipitation_unit", "inch"),
            ("forecast_hours", forecast_hours.as_str()),
        ];

        Ok(self.client.get(&self.url).query(&query).build()?)
    }
}

/// Transforms the Open-Meteo document to an hourly forecast.
/// Time and precipitation arrays of unequal length are cut to the shorter one.
///
/// # Arguments
///
/// * 'data' - the decoded response document
fn to_hourly_forecast(data: OpenMeteoResponse) -> Result<HourlyForecast, ForecastError> {
    let hourly = data.hourly;
    if hourly.time.len() != hourly.precipitation.len() {
        warn!("forecast has {} timestamps but {} precipitation values",
            hourly.time.len(), hourly.precipitation.len());
    }

    let mut hours: Vec<HourlyValue> = Vec::new();
    for (time, precipitation) in hourly.time.iter().zip(hourly.precipitation) {
        let valid_time = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|e| ForecastError::ParseError(format!("invalid timestamp {}: {}", time, e)))?;

        hours.push(HourlyValue {
            valid_time,
            precipitation: precipitation.unwrap_or(0.0),
        });
    }

    Ok(HourlyForecast { hours })
}

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Open-Meteo API returned status {0}")]
    StatusError(u16),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
}
