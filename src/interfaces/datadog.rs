//! Transport to the Datadog v2 metrics-intake endpoint.

use serde::Serialize;
use thiserror::Error;

use crate::data_mgmt::models::{MetricKind, MetricPoint};
use crate::helpers::backoff_retry;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("datadog intake returned HTTP {0}")]
    Status(u16),
    #[error("network error talking to datadog: {0}")]
    Network(String),
}

/// One series in the v2 `MetricPayload` shape
#[derive(Debug, Serialize)]
pub struct Series<'a> {
    metric: &'a str,
    #[serde(rename = "type")]
    intake_type: u8,
    points: Vec<SeriesPoint>,
    tags: &'a [String],
}

#[derive(Debug, Serialize)]
struct SeriesPoint {
    timestamp: i64,
    value: f64,
}

#[derive(Debug, Serialize)]
struct MetricPayload<'a> {
    series: &'a [Series<'a>],
}

impl<'a> Series<'a> {
    pub fn from_point(point: &'a MetricPoint) -> Self {
        // Intake type codes: 1 = count, 3 = gauge
        let intake_type = match point.kind {
            MetricKind::Count => 1,
            MetricKind::Gauge => 3,
        };
        Series {
            metric: &point.name,
            intake_type,
            points: vec![SeriesPoint {
                timestamp: point.timestamp,
                value: point.value,
            }],
            tags: &point.tags,
        }
    }
}

pub struct DatadogClient {
    agent: ureq::Agent,
    api_root: String,
    api_key: String,
    app_key: String,
}

impl DatadogClient {
    pub fn new(agent: ureq::Agent, api_root: &str, api_key: &str, app_key: &str) -> Self {
        Self {
            agent,
            api_root: api_root.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
        }
    }

    /// Submit one batch of series; callers chunk to the intake batch limit
    pub fn submit_series(&self, series: &[Series]) -> Result<(), PublishError> {
        let payload = MetricPayload { series };
        let request = || {
            self.agent
                .post(&format!("{}/api/v2/series", self.api_root))
                .set("DD-API-KEY", &self.api_key)
                .set("DD-APPLICATION-KEY", &self.app_key)
                .send_json(&payload)
                .map_err(classify)
        };

        backoff_retry(request).map_err(flatten)?;
        Ok(())
    }
}

fn classify(err: ureq::Error) -> backoff::Error<PublishError> {
    match err {
        ureq::Error::Status(code, _) if code >= 500 => {
            backoff::Error::transient(PublishError::Status(code))
        }
        ureq::Error::Status(code, _) => backoff::Error::permanent(PublishError::Status(code)),
        ureq::Error::Transport(transport) => {
            backoff::Error::transient(PublishError::Network(transport.to_string()))
        }
    }
}

fn flatten(err: backoff::Error<PublishError>) -> PublishError {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}
