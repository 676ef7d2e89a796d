use crate::models::{ForecastDecision, HourlyForecast};

/// Hourly amount (inches) at or above which rain is considered expected
pub const RAIN_THRESHOLD_INCH: f64 = 0.1;

/// Reduces an hourly forecast to a rain decision and the peak hourly precipitation.
/// An empty forecast gives no rain and a peak of 0.0.
///
/// # Arguments
///
/// * 'forecast' - hourly precipitation series
pub fn evaluate(forecast: &HourlyForecast) -> ForecastDecision {
    let peak_precipitation = forecast.hours
        .iter()
        .fold(0.0, |max: f64, h| max.max(h.precipitation));

    ForecastDecision {
        rain_expected: forecast.hours.iter().any(|h| h.precipitation >= RAIN_THRESHOLD_INCH),
        peak_precipitation,
    }
}
