use reqwest::blocking::Client;
use thiserror::Error;
use crate::config::JobConfig;
use crate::models::{NotificationMessage, Priority};

/// Struct for pushing notifications to an ntfy topic
pub struct Ntfy {
    client: Client,
    url: String,
}

impl Ntfy {
    /// Returns a new instance of the Ntfy struct
    ///
    /// # Arguments
    ///
    /// * 'client' - http client to issue requests with
    /// * 'url' - base url of the ntfy service, e.g. https://ntfy.sh
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends a high priority alert stating the peak hourly precipitation
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    /// * 'peak_precipitation' - highest hourly precipitation in the window, in inches
    pub fn send_rain_alert(&self, cfg: &JobConfig, peak_precipitation: f64) -> Result<(), NtfyError> {
        self.send(cfg, &rain_message(cfg, peak_precipitation))
    }

    /// Sends a confirmation that no rain is expected in the window
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    pub fn send_no_rain_alert(&self, cfg: &JobConfig) -> Result<(), NtfyError> {
        self.send(cfg, &no_rain_message(cfg))
    }

    /// Sends an alert carrying the text of an error that stopped the forecast check
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    /// * 'error' - the error text
    pub fn send_error_alert(&self, cfg: &JobConfig, error: &str) -> Result<(), NtfyError> {
        self.send(cfg, &error_message(cfg, error))
    }

    /// Posts a message to the configured topic. There is no retry on failure.
    ///
    /// # Arguments
    ///
    /// * 'cfg' - job configuration
    /// * 'message' - the message to post
    pub fn send(&self, cfg: &JobConfig, message: &NotificationMessage) -> Result<(), NtfyError> {
        let url = format!("{}/{}", self.url, cfg.notification_topic);

        let response = self.client
            .post(url)
            .header("Title", message.title.as_str())
            .header("Priority", message.priority.value().to_string())
            .body(message.body.clone())
            .send()
            .map_err(|e| NtfyError::TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NtfyError::StatusError(status.as_u16()));
        }

        Ok(())
    }
}

fn rain_message(cfg: &JobConfig, peak_precipitation: f64) -> NotificationMessage {
    NotificationMessage {
        title: "Rain Alert".to_string(),
        priority: Priority::Max,
        body: format!("Rain expected{} in the next {} hours, up to {:.2} inches per hour.",
                      place(cfg), cfg.forecast_range_hours, peak_precipitation),
    }
}

fn no_rain_message(cfg: &JobConfig) -> NotificationMessage {
    NotificationMessage {
        title: "No Rain Expected".to_string(),
        priority: Priority::Default,
        body: format!("No rain expected{} in the next {} hours.", place(cfg), cfg.forecast_range_hours),
    }
}

fn error_message(cfg: &JobConfig, error: &str) -> NotificationMessage {
    NotificationMessage {
        title: "Rain Alert Error".to_string(),
        priority: Priority::Default,
        body: format!("Could not check the forecast{}: {}", place(cfg), error),
    }
}

fn place(cfg: &JobConfig) -> String {
    match &cfg.location {
        Some(name) if !name.is_empty() => format!(" in {}", name),
        _ => String::new(),
    }
}

/// Error depicting errors that occur while sending notifications
///
#[derive(Debug, Error)]
pub enum NtfyError {
    #[error("TransportError: {0}")]
    TransportError(String),
    #[error("ntfy returned status {0}")]
    StatusError(u16),
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use super::*;
    use crate::config::test_job;

    #[test]
    fn rain_message_states_peak_and_window() {
        let message = rain_message(&test_job(&[7], false), 0.256);

        assert_eq!(message.title, "Rain Alert");
        assert_eq!(message.priority, Priority::Max);
        assert_eq!(message.body, "Rain expected in New York in the next 3 hours, up to 0.26 inches per hour.");
    }

    #[test]
    fn no_rain_message_has_lower_priority() {
        let message = no_rain_message(&test_job(&[7], false));

        assert_eq!(message.priority, Priority::Default);
        assert_eq!(message.body, "No rain expected in New York in the next 3 hours.");
    }

    #[test]
    fn messages_without_location() {
        let mut job = test_job(&[7], false);
        job.location = None;

        assert_eq!(no_rain_message(&job).body, "No rain expected in the next 3 hours.");
        assert_eq!(error_message(&job, "boom").body, "Could not check the forecast: boom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rain_alert_is_posted_to_topic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rain-test"))
            .and(header("Title", "Rain Alert"))
            .and(header("Priority", "5"))
            .and(body_string("Rain expected in New York in the next 3 hours, up to 0.30 inches per hour."))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            Ntfy::new(Client::new(), &url).send_rain_alert(&test_job(&[7], false), 0.3)
        }).await.unwrap();

        assert!(result.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_alert_carries_error_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rain-test"))
            .and(header("Title", "Rain Alert Error"))
            .and(header("Priority", "3"))
            .and(body_string("Could not check the forecast in New York: Open-Meteo API returned status 500"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/", server.uri());
        let result = tokio::task::spawn_blocking(move || {
            Ntfy::new(Client::new(), &url)
                .send_error_alert(&test_job(&[7], false), "Open-Meteo API returned status 500")
        }).await.unwrap();

        assert!(result.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_message_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let url = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            Ntfy::new(Client::new(), &url).send_no_rain_alert(&test_job(&[7], false))
        }).await.unwrap();

        assert!(matches!(result, Err(NtfyError::StatusError(429))));
    }

    #[test]
    fn unreachable_service() {
        let ntfy = Ntfy::new(Client::new(), "http://127.0.0.1:1");
        let result = ntfy.send_no_rain_alert(&test_job(&[7], false));

        assert!(matches!(result, Err(NtfyError::TransportError(_))));
    }
}
