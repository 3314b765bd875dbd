pub mod datadog;
pub mod ecobee;

use std::sync::Arc;

use anyhow::Result;

use crate::constants::defaults;

/// Shared blocking HTTP agent used for both the ecobee and Datadog APIs.
pub fn http_agent() -> Result<ureq::Agent> {
    Ok(ureq::AgentBuilder::new()
        .tls_connector(Arc::new(native_tls::TlsConnector::new()?))
        .timeout(defaults::API_REQUEST_TIMEOUT)
        .build())
}
