//! Execution context shared by every case of a run

use chrono::NaiveDate;
use std::time::Duration;

use crate::common::config::Config;
use crate::common::normalize_base_url;
use crate::http::{CallCache, Response, ResponseFormat, Transport};

/// Run-wide settings every case reads
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Base URL used when a row carries no `otp_url`
    pub otp_url: String,
    /// Upper bound on one request
    pub request_timeout: Duration,
    /// Slowest response the response-time check accepts
    pub max_response_time: Duration,
    /// Date used to derive service dates
    pub today: NaiveDate,
    /// Keep full diagnostics in the report
    pub verbose: bool,
}

impl RunSettings {
    /// Settings with default timeouts for `otp_url`
    pub fn new(otp_url: &str, today: NaiveDate) -> Self {
        Self::from_config(
            &Config {
                server: crate::common::config::ServerConfig {
                    otp_url: otp_url.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
            today,
        )
    }

    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self {
            otp_url: normalize_base_url(&config.server.otp_url),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            max_response_time: Duration::from_secs(config.timeouts.max_response_secs),
            today,
            verbose: false,
        }
    }
}

/// Borrowed handles a case needs while running
pub struct ExecContext<'a> {
    pub cache: &'a mut CallCache,
    pub transport: &'a dyn Transport,
    pub settings: &'a RunSettings,
}

impl<'a> ExecContext<'a> {
    pub fn new(
        cache: &'a mut CallCache,
        transport: &'a dyn Transport,
        settings: &'a RunSettings,
    ) -> Self {
        Self {
            cache,
            transport,
            settings,
        }
    }

    /// Issue a request through the run's call cache
    pub async fn fetch(&mut self, url: &str, format: ResponseFormat) -> Response {
        self.cache
            .call(self.transport, url, format, self.settings.request_timeout)
            .await
    }
}
