mod backoff_retry;
mod time;

pub use backoff_retry::backoff_retry;
pub use time::parse_ecobee_time;
