use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDateTime;

/// Precipitation for one forecast hour, in inches
#[derive(Clone, Debug, PartialEq)]
pub struct HourlyValue {
    pub valid_time: NaiveDateTime,
    pub precipitation: f64,
}

/// Hourly precipitation series in local time of the configured timezone
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HourlyForecast {
    pub hours: Vec<HourlyValue>,
}

#[cfg(test)]
impl HourlyForecast {
    /// Builds a forecast from bare precipitation values, one hour apart starting at `start`
    ///
    /// # Arguments
    ///
    /// * 'start' - valid time of the first value
    /// * 'values' - precipitation per hour in inches
    pub fn from_values(start: NaiveDateTime, values: &[f64]) -> HourlyForecast {
        let hours = values
            .iter()
            .enumerate()
            .map(|(i, v)| HourlyValue {
                valid_time: start + chrono::TimeDelta::hours(i as i64),
                precipitation: *v,
            })
            .collect();

        HourlyForecast { hours }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForecastDecision {
    pub rain_expected: bool,
    pub peak_precipitation: f64,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ForecastDecision {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Rain expected: {}, Max precipitation: {:.2} inches", self.rain_expected, self.peak_precipitation)
    }
}

/// ntfy message priority on its 1 (min) to 5 (max) scale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    Default = 3,
    Max = 5,
}

impl Priority {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationMessage {
    pub title: String,
    pub priority: Priority,
    pub body: String,
}
