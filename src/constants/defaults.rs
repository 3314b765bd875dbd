use std::time::Duration;

pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const HTTP_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(30);

pub const POLL_INTERVAL: Duration = Duration::from_secs(300);

pub const ECOBEE_API_ROOT: &str = "https://api.ecobee.com";
pub const ECOBEE_SCOPE: &str = "smartRead";
pub const DATADOG_API_ROOT: &str = "https://api.datadoghq.com";

pub const TOKEN_FILE_NAME: &str = "ecobee_token.json";

/// Series per intake request; the v2 endpoint caps payload size well above this
pub const MAX_SERIES_PER_REQUEST: usize = 500;
