use crate::constants::defaults;
use crate::interfaces::datadog::{DatadogClient, PublishError, Series};

use super::models::MetricPoint;

/// Submit a batch of metric points, chunked to the intake batch limit.
/// Returns the number of points submitted. No durability: on failure the
/// caller logs and drops the batch.
pub fn publish_points(
    client: &DatadogClient,
    points: &[MetricPoint],
) -> Result<usize, PublishError> {
    if points.is_empty() {
        log::debug!("No metric points to publish");
        return Ok(0);
    }
    log::trace!("Publishing points: {:?}", points);

    for chunk in points.chunks(defaults::MAX_SERIES_PER_REQUEST) {
        let series: Vec<Series> = chunk.iter().map(Series::from_point).collect();
        client.submit_series(&series)?;
    }
    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_chunks_large_batches() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("POST", "/api/v2/series")
            .with_status(202)
            .with_body(r#"{"errors": []}"#)
            .expect(2)
            .create();

        let client = DatadogClient::new(ureq::Agent::new(), &server.url(), "dd-api", "dd-app");
        let points: Vec<MetricPoint> = (0..defaults::MAX_SERIES_PER_REQUEST + 1)
            .map(|i| {
                MetricPoint::gauge(
                    "ecobee.runtime.humidity",
                    i as f64,
                    1709294700,
                    vec!["thermostat_name:Hallway".to_string()],
                )
            })
            .collect();

        let published = publish_points(&client, &points).unwrap();
        assert_eq!(published, defaults::MAX_SERIES_PER_REQUEST + 1);
        m.assert();
    }

    #[test]
    fn test_publish_empty_batch_skips_request() {
        let server = mockito::Server::new();
        let client = DatadogClient::new(ureq::Agent::new(), &server.url(), "dd-api", "dd-app");
        assert_eq!(publish_points(&client, &[]).unwrap(), 0);
    }
}
