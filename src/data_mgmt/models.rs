#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Count,
}

/// One named, timestamped, tagged value bound for the monitoring backend.
/// Produced by the mapper, consumed immediately by the publisher.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    /// Unix seconds
    pub timestamp: i64,
    pub kind: MetricKind,
    pub tags: Vec<String>,
}

impl MetricPoint {
    pub fn gauge(name: impl Into<String>, value: f64, timestamp: i64, tags: Vec<String>) -> Self {
        MetricPoint {
            name: name.into(),
            value,
            timestamp,
            kind: MetricKind::Gauge,
            tags,
        }
    }

    pub fn count(name: impl Into<String>, value: f64, timestamp: i64, tags: Vec<String>) -> Self {
        MetricPoint {
            name: name.into(),
            value,
            timestamp,
            kind: MetricKind::Count,
            tags,
        }
    }
}
