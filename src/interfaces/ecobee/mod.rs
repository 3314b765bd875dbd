//! Blocking client for the ecobee cloud API: PIN authorization, token
//! refresh, and the thermostat telemetry endpoint.

use serde::Deserialize;
use thiserror::Error;

use crate::constants::defaults;
use crate::helpers::backoff_retry;

mod models;

pub use models::{
    ExtendedRuntime, PinResponse, RemoteSensor, Runtime, SensorCapability, Thermostat,
    TokenGrant, Weather, WeatherForecast,
};

use models::ThermostatResponse;

#[derive(Error, Debug)]
pub enum EcobeeError {
    #[error("access token expired or invalid")]
    AuthExpired,
    #[error("refresh token no longer valid")]
    InvalidGrant,
    #[error("ecobee API rate limit hit")]
    RateLimited,
    #[error("network error talking to ecobee: {0}")]
    Network(String),
    #[error("unexpected ecobee API response: {0}")]
    Api(String),
    #[error("could not parse ecobee response: {0}")]
    Parse(#[from] std::io::Error),
}

/// Outcome of one poll of the token endpoint during PIN authorization
#[derive(Debug)]
pub enum PinGrant {
    Granted(TokenGrant),
    Pending,
    Denied,
}

/// OAuth-style error body returned by the token endpoint
#[derive(Debug, Deserialize)]
struct OauthError {
    error: String,
}

pub struct EcobeeClient {
    agent: ureq::Agent,
    api_root: String,
    api_key: String,
}

impl EcobeeClient {
    pub fn new(agent: ureq::Agent, api_root: &str, api_key: &str) -> Self {
        Self {
            agent,
            api_root: api_root.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Request a new PIN challenge for the device-authorization flow
    pub fn authorize_pin(&self) -> Result<PinResponse, EcobeeError> {
        let request = || {
            log::debug!("Requesting ecobee authorization PIN");
            self.agent
                .get(&format!("{}/authorize", self.api_root))
                .query("response_type", "ecobeePin")
                .query("client_id", &self.api_key)
                .query("scope", defaults::ECOBEE_SCOPE)
                .call()
                .map_err(classify)
        };

        let resp = backoff_retry(request).map_err(flatten)?;
        Ok(resp.into_json()?)
    }

    /// Poll the token endpoint with a PIN authorization code. "Pending" and
    /// "denied" are expected states of the flow, not errors.
    pub fn request_pin_token(&self, code: &str) -> Result<PinGrant, EcobeeError> {
        let result = self
            .agent
            .post(&format!("{}/token", self.api_root))
            .send_form(&[
                ("grant_type", "ecobeePin"),
                ("code", code),
                ("client_id", &self.api_key),
            ]);

        match result {
            Ok(resp) => Ok(PinGrant::Granted(resp.into_json()?)),
            Err(ureq::Error::Status(_, resp)) => {
                let oauth_err: OauthError = resp.into_json()?;
                match oauth_err.error.as_str() {
                    "authorization_pending" | "slow_down" => Ok(PinGrant::Pending),
                    "access_denied" => Ok(PinGrant::Denied),
                    other => Err(EcobeeError::Api(format!("token endpoint error: {other}"))),
                }
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(EcobeeError::Network(transport.to_string()))
            }
        }
    }

    /// Exchange a refresh token for a fresh token pair
    pub fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, EcobeeError> {
        let result = self
            .agent
            .post(&format!("{}/token", self.api_root))
            .send_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.api_key),
            ]);

        match result {
            Ok(resp) => Ok(resp.into_json()?),
            Err(ureq::Error::Status(code, resp)) => {
                match resp.into_json::<OauthError>() {
                    Ok(oauth_err) if oauth_err.error == "invalid_grant" => {
                        Err(EcobeeError::InvalidGrant)
                    }
                    Ok(oauth_err) => Err(EcobeeError::Api(format!(
                        "token refresh failed: {}",
                        oauth_err.error
                    ))),
                    Err(_) => Err(EcobeeError::Api(format!(
                        "HTTP {code} from token endpoint"
                    ))),
                }
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(EcobeeError::Network(transport.to_string()))
            }
        }
    }

    /// Fetch one thermostat's telemetry: runtime, extended runtime, remote
    /// sensors and weather in a single selection request.
    pub fn fetch_snapshot(
        &self,
        access_token: &str,
        thermostat_id: &str,
    ) -> Result<Thermostat, EcobeeError> {
        let selection = selection_json(thermostat_id);
        let request = || {
            log::debug!("Fetching telemetry for thermostat {thermostat_id}");
            self.agent
                .get(&format!("{}/1/thermostat", self.api_root))
                .query("json", &selection)
                .set("Content-Type", "application/json;charset=UTF-8")
                .set("Authorization", &format!("Bearer {access_token}"))
                .call()
                .map_err(classify)
        };

        let resp = backoff_retry(request).map_err(flatten)?;
        let body: ThermostatResponse = resp.into_json()?;
        body.thermostat_list.into_iter().next().ok_or_else(|| {
            EcobeeError::Api(format!("no thermostat data returned for {thermostat_id}"))
        })
    }
}

/// Selection body for the thermostat endpoint, passed URL-encoded in the
/// `json` query parameter.
pub(crate) fn selection_json(thermostat_id: &str) -> String {
    serde_json::json!({
        "selection": {
            "selectionType": "thermostats",
            "selectionMatch": thermostat_id,
            "includeRuntime": true,
            "includeExtendedRuntime": true,
            "includeSettings": false,
            "includeProgram": false,
            "includeSensors": true,
            "includeWeather": true,
        }
    })
    .to_string()
}

fn classify(err: ureq::Error) -> backoff::Error<EcobeeError> {
    match err {
        ureq::Error::Status(401, _) => backoff::Error::permanent(EcobeeError::AuthExpired),
        ureq::Error::Status(429, _) => backoff::Error::permanent(EcobeeError::RateLimited),
        ureq::Error::Status(code, _) if code >= 500 => {
            backoff::Error::transient(EcobeeError::Network(format!("HTTP {code} from ecobee")))
        }
        ureq::Error::Status(code, _) => {
            backoff::Error::permanent(EcobeeError::Api(format!("HTTP {code} from ecobee")))
        }
        ureq::Error::Transport(transport) => {
            backoff::Error::transient(EcobeeError::Network(transport.to_string()))
        }
    }
}

fn flatten(err: backoff::Error<EcobeeError>) -> EcobeeError {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}
