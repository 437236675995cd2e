use std::time::Duration;

use thiserror::Error;

use crate::dispatch::domain::notifier::Notifier;
use crate::dispatch::event::Event;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// JSON POST transport with a hard request timeout.
///
/// Blocking by design: the engine accepts transport latency as
/// backpressure within the tick.
pub struct HttpNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for HttpNotifier {
    fn notify(&mut self, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .map_err(|e| NotifyError::Request {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: self.url.clone(),
                status,
            }
            .into());
        }
        Ok(())
    }
}
