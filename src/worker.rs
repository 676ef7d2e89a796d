use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, Timelike, Utc};
use log::{debug, error, info, warn};
use thiserror::Error;
use crate::config::JobConfig;
use crate::evaluator::evaluate;
use crate::initialization::Mgr;
use crate::manager_forecast::ForecastError;
use crate::models::ForecastDecision;

/// What became of the notification in an evaluated run
#[derive(Debug, PartialEq)]
pub enum Notification {
    Sent,
    Suppressed,
    Failed(String),
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Notification {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Notification::Sent => write!(f, "sent"),
            Notification::Suppressed => write!(f, "suppressed"),
            Notification::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    OutsideNotificationHours(u32),
    Evaluated {
        decision: ForecastDecision,
        notification: Notification,
    },
}

impl RunOutcome {
    /// Completion status reported to the trigger
    pub fn status(&self) -> &'static str {
        "done"
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RunOutcome::OutsideNotificationHours(hour) => write!(f, "skipped, hour {} is not a notification hour", hour),
            RunOutcome::Evaluated { decision, notification } => write!(f, "{}, notification {}", decision, notification),
        }
    }
}

/// Runs one forecast evaluation: fetches the forecast, decides whether rain is expected and
/// sends the matching notification. Nothing is fetched unless the current hour, in the
/// configured timezone, is one of the notification hours.
///
/// A failed fetch is reported through an error alert and returned as error. A failed
/// notification is logged and reported in the outcome but does not fail the run.
///
/// # Arguments
///
/// * 'cfg' - job configuration
/// * 'mgr' - struct with configured managers
/// * 'now' - the time of the run
pub fn run(cfg: &JobConfig, mgr: &Mgr, now: DateTime<Utc>) -> Result<RunOutcome, WorkerError> {
    let hour = now.with_timezone(&cfg.timezone).hour();
    if !cfg.notification_hours.contains(hour) {
        info!("Current hour {} not in notification hours {}, exiting", hour, cfg.notification_hours);
        return Ok(RunOutcome::OutsideNotificationHours(hour));
    }

    let forecast = match mgr.forecast.fetch_forecast(cfg) {
        Ok(forecast) => forecast,
        Err(e) => {
            error!("Error getting forecast: {}", e);
            if let Err(ne) = mgr.ntfy.send_error_alert(cfg, &e.to_string()) {
                warn!("Error sending error alert: {}", ne);
            }
            return Err(WorkerError::ForecastError(e));
        }
    };

    for h in forecast.hours.iter() {
        debug!("{}: {:.2} inches of precipitation", h.valid_time, h.precipitation);
    }

    let decision = evaluate(&forecast);
    info!("{}", decision);

    let sent = if decision.rain_expected {
        Some(mgr.ntfy.send_rain_alert(cfg, decision.peak_precipitation))
    } else if !cfg.ignore_no_rain {
        Some(mgr.ntfy.send_no_rain_alert(cfg))
    } else {
        None
    };

    let notification = match sent {
        None => {
            info!("No rain expected, no-rain notification is ignored");
            Notification::Suppressed
        },
        Some(Ok(())) => Notification::Sent,
        Some(Err(e)) => {
            warn!("Error sending notification: {}", e);
            Notification::Failed(e.to_string())
        },
    };

    Ok(RunOutcome::Evaluated { decision, notification })
}

/// Error depicting errors that occur while running the job
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error getting forecast: {0}")]
    ForecastError(#[from] ForecastError),
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use super::*;
    use crate::config::test_job;
    use crate::initialization::http_client;
    use crate::manager_forecast::Forecast;
    use crate::manager_ntfy::Ntfy;

    // 07:00 in New York
    fn seven_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 20, 11, 0, 0).unwrap()
    }

    async fn run_against(server: &MockServer, job: JobConfig, now: DateTime<Utc>) -> Result<RunOutcome, WorkerError> {
        let uri = server.uri();

        tokio::task::spawn_blocking(move || {
            let client = http_client().unwrap();
            let mgr = Mgr {
                forecast: Forecast::new(client.clone(), &format!("{}/v1/forecast", uri)),
                ntfy: Ntfy::new(client, &uri),
            };
            run(&job, &mgr, now)
        }).await.unwrap()
    }

    async fn mount_forecast(server: &MockServer, precipitation: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2025-09-20T07:00", "2025-09-20T08:00", "2025-09-20T09:00"],
                    "precipitation": precipitation
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn outside_notification_hours_does_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let outcome = run_against(&server, test_job(&[8, 20], false), seven_am()).await.unwrap();

        assert_eq!(outcome, RunOutcome::OutsideNotificationHours(7));
        assert_eq!(outcome.status(), "done");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rain_sends_rain_alert() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!([0.0, 0.1, 0.3])).await;
        Mock::given(method("POST"))
            .and(path("/rain-test"))
            .and(header("Title", "Rain Alert"))
            .and(header("Priority", "5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run_against(&server, test_job(&[7], true), seven_am()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Evaluated {
            decision: ForecastDecision { rain_expected: true, peak_precipitation: 0.3 },
            notification: Notification::Sent,
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_rain_sends_confirmation() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!([0.0, 0.01, 0.03])).await;
        Mock::given(method("POST"))
            .and(path("/rain-test"))
            .and(header("Title", "No Rain Expected"))
            .and(header("Priority", "3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run_against(&server, test_job(&[7], false), seven_am()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Evaluated {
            decision: ForecastDecision { rain_expected: false, peak_precipitation: 0.03 },
            notification: Notification::Sent,
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ignored_no_rain_sends_nothing() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!([0.0, 0.0, 0.0])).await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let outcome = run_against(&server, test_job(&[7], true), seven_am()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Evaluated {
            decision: ForecastDecision { rain_expected: false, peak_precipitation: 0.0 },
            notification: Notification::Suppressed,
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_fetch_sends_error_alert() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rain-test"))
            .and(header("Title", "Rain Alert Error"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = run_against(&server, test_job(&[7], true), seven_am()).await;

        match result {
            Err(WorkerError::ForecastError(ForecastError::StatusError(code))) => assert_eq!(code, 500),
            other => panic!("expected forecast status error, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_notification_does_not_fail_run() {
        let server = MockServer::start().await;
        mount_forecast(&server, serde_json::json!([0.2, 0.0, 0.0])).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run_against(&server, test_job(&[7], false), seven_am()).await.unwrap();

        match outcome {
            RunOutcome::Evaluated { decision, notification: Notification::Failed(reason) } => {
                assert!(decision.rain_expected);
                assert!(reason.contains("503"));
            },
            other => panic!("expected failed notification, got {:?}", other),
        }
    }
}
