//! Credential store for the ecobee token pair: file persistence, refresh on
//! expiry, and the PIN device-authorization bootstrap.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interfaces::ecobee::{EcobeeClient, EcobeeError, PinGrant, PinResponse, TokenGrant};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse token JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] EcobeeError),
    #[error("authorization denied on the ecobee portal")]
    Denied,
    #[error("authorization PIN expired before approval")]
    TimedOut,
    #[error("refresh token rejected; delete the token file and re-authorize")]
    ReauthorizationRequired,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds; computed from `expires_in` when the grant is received
    pub expiry: i64,
}

impl TokenPair {
    pub fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Self {
        TokenPair {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expiry: now.timestamp() + grant.expires_in,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expiry
    }
}

/// One PIN authorization attempt, valid until `expires_at`
#[derive(Clone, Debug)]
pub struct PinChallenge {
    pub pin: String,
    pub code: String,
    pub poll_interval: Duration,
    pub expires_at: DateTime<Utc>,
}

impl PinChallenge {
    pub fn from_response(resp: PinResponse, now: DateTime<Utc>) -> Self {
        PinChallenge {
            pin: resp.ecobee_pin,
            code: resp.code,
            poll_interval: Duration::from_secs(resp.interval.max(1)),
            expires_at: now + chrono::Duration::minutes(resp.expires_in),
        }
    }
}

#[derive(Debug)]
pub enum PinState {
    Pending,
    Approved(TokenPair),
    Denied,
    TimedOut,
}

/// Advance the PIN authorization state machine by one poll. The challenge
/// deadline is checked before any request goes out.
pub fn poll_pin(
    client: &EcobeeClient,
    challenge: &PinChallenge,
    now: DateTime<Utc>,
) -> Result<PinState, AuthError> {
    if now >= challenge.expires_at {
        return Ok(PinState::TimedOut);
    }
    match client.request_pin_token(&challenge.code)? {
        PinGrant::Granted(grant) => Ok(PinState::Approved(TokenPair::from_grant(grant, now))),
        PinGrant::Pending => Ok(PinState::Pending),
        PinGrant::Denied => Ok(PinState::Denied),
    }
}

pub struct TokenStore {
    path: PathBuf,
    token: Option<TokenPair>,
}

impl TokenStore {
    /// Open the store, loading a previously persisted token pair if one
    /// exists at `path`.
    pub fn open(path: PathBuf) -> Result<Self, AuthError> {
        let token = match fs::read_to_string(&path) {
            Ok(raw) => {
                log::debug!("Loaded token from {}", path.display());
                Some(serde_json::from_str(&raw)?)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, token })
    }

    pub fn token(&self) -> Option<&TokenPair> {
        self.token.as_ref()
    }

    /// Run the PIN bootstrap if no token pair is stored. Fatal at startup if
    /// the user denies the request or the PIN expires unapproved.
    pub fn ensure_authorized(&mut self, client: &EcobeeClient) -> Result<(), AuthError> {
        if self.token.is_some() {
            return Ok(());
        }
        log::info!("No stored token found; starting PIN authorization");
        self.bootstrap(client)
    }

    /// Display a PIN and poll the token endpoint until the user approves the
    /// application on the ecobee portal, then persist the granted pair.
    pub fn bootstrap(&mut self, client: &EcobeeClient) -> Result<(), AuthError> {
        let challenge = PinChallenge::from_response(client.authorize_pin()?, Utc::now());
        println!(
            "Authorize this app on the ecobee portal (My Apps -> Add Application) using PIN: {}",
            challenge.pin
        );
        self.poll_until_resolved(client, &challenge)
    }

    /// Poll until the challenge resolves. Network blips during a poll are
    /// tolerated like a pending response; the challenge deadline still
    /// bounds the loop.
    fn poll_until_resolved(
        &mut self,
        client: &EcobeeClient,
        challenge: &PinChallenge,
    ) -> Result<(), AuthError> {
        loop {
            thread::sleep(challenge.poll_interval);
            match poll_pin(client, challenge, Utc::now()) {
                Ok(PinState::Pending) => log::debug!("Authorization still pending"),
                Ok(PinState::Approved(pair)) => {
                    self.token = Some(pair);
                    self.persist()?;
                    log::info!("Authorization approved; token stored at {}", self.path.display());
                    return Ok(());
                }
                Ok(PinState::Denied) => return Err(AuthError::Denied),
                Ok(PinState::TimedOut) => return Err(AuthError::TimedOut),
                Err(AuthError::Api(EcobeeError::Network(e))) => {
                    log::warn!("Transient error polling authorization: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Return a non-expired access token, refreshing first if needed
    pub fn get_valid_token(&mut self, client: &EcobeeClient) -> Result<String, AuthError> {
        let token = self
            .token
            .as_ref()
            .ok_or(AuthError::ReauthorizationRequired)?;
        if token.is_expired(Utc::now()) {
            log::info!("Access token expired; refreshing");
            return self.force_refresh(client);
        }
        Ok(token.access_token.clone())
    }

    /// Refresh unconditionally, e.g. after the vendor rejected a token that
    /// had not yet reached its recorded expiry.
    pub fn force_refresh(&mut self, client: &EcobeeClient) -> Result<String, AuthError> {
        let refresh_token = self
            .token
            .as_ref()
            .ok_or(AuthError::ReauthorizationRequired)?
            .refresh_token
            .clone();

        let grant = match client.refresh_token(&refresh_token) {
            Ok(grant) => grant,
            Err(EcobeeError::InvalidGrant) => return Err(AuthError::ReauthorizationRequired),
            Err(e) => return Err(e.into()),
        };

        let pair = TokenPair::from_grant(grant, Utc::now());
        let access_token = pair.access_token.clone();
        self.token = Some(pair);
        self.persist()?;
        log::info!("Token refreshed and persisted");
        Ok(access_token)
    }

    fn persist(&self) -> Result<(), AuthError> {
        let token = self
            .token
            .as_ref()
            .ok_or(AuthError::ReauthorizationRequired)?;
        fs::write(&self.path, serde_json::to_vec(token)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ecobee_client(server: &mockito::Server) -> EcobeeClient {
        EcobeeClient::new(ureq::Agent::new(), &server.url(), "test-api-key")
    }

    fn write_pair(dir: &tempfile::TempDir, pair: &TokenPair) -> PathBuf {
        let path = dir.path().join("ecobee_token.json");
        fs::write(&path, serde_json::to_vec(pair).unwrap()).unwrap();
        path
    }

    fn expired_pair() -> TokenPair {
        TokenPair {
            access_token: "access-old".to_string(),
            refresh_token: "refresh-old".to_string(),
            expiry: 0,
        }
    }

    #[test]
    fn test_open_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("ecobee_token.json")).unwrap();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_expired_token_triggers_single_refresh() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("POST", "/token")
            .with_body(
                r#"{"access_token": "access-new", "refresh_token": "refresh-new", "expires_in": 3600}"#,
            )
            .expect(1)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let path = write_pair(&dir, &expired_pair());
        let mut store = TokenStore::open(path.clone()).unwrap();

        let access = store.get_valid_token(&ecobee_client(&server)).unwrap();
        assert_eq!(access, "access-new");
        m.assert();

        // Refresh overwrote the persisted pair
        let reloaded = TokenStore::open(path).unwrap();
        assert_eq!(reloaded.token().unwrap().refresh_token, "refresh-new");
        assert!(!reloaded.token().unwrap().is_expired(Utc::now()));
    }

    #[test]
    fn test_valid_token_used_without_refresh() {
        let server = mockito::Server::new();
        let dir = tempfile::tempdir().unwrap();
        let pair = TokenPair {
            access_token: "access-live".to_string(),
            refresh_token: "refresh-live".to_string(),
            expiry: Utc::now().timestamp() + 3600,
        };
        let path = write_pair(&dir, &pair);
        let mut store = TokenStore::open(path).unwrap();

        // No /token mock registered: any refresh attempt would return 501
        let access = store.get_valid_token(&ecobee_client(&server)).unwrap();
        assert_eq!(access, "access-live");
    }

    #[test]
    fn test_rejected_refresh_requires_reauthorization() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .expect(1)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let path = write_pair(&dir, &expired_pair());
        let mut store = TokenStore::open(path).unwrap();

        let err = store.get_valid_token(&ecobee_client(&server)).unwrap_err();
        assert!(matches!(err, AuthError::ReauthorizationRequired));
    }

    #[test]
    fn test_pin_poll_times_out_without_request() {
        // No mock server traffic expected: the deadline check comes first
        let server = mockito::Server::new();
        let challenge = PinChallenge {
            pin: "bv29".to_string(),
            code: "auth-code".to_string(),
            poll_interval: Duration::from_secs(5),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        let state = poll_pin(&ecobee_client(&server), &challenge, Utc::now()).unwrap();
        assert!(matches!(state, PinState::TimedOut));
    }

    #[test]
    fn test_bootstrap_polls_through_transient_network_errors() {
        // Nothing listens on this port, so every poll fails at the
        // transport level; the flow must keep polling until the challenge
        // deadline instead of aborting on the first blip
        let client = EcobeeClient::new(ureq::Agent::new(), "http://127.0.0.1:9", "test-api-key");
        let dir = tempfile::tempdir().unwrap();
        let mut store = TokenStore::open(dir.path().join("ecobee_token.json")).unwrap();

        let challenge = PinChallenge {
            pin: "bv29".to_string(),
            code: "auth-code".to_string(),
            poll_interval: Duration::from_millis(10),
            expires_at: Utc::now() + chrono::Duration::milliseconds(150),
        };
        let err = store.poll_until_resolved(&client, &challenge).unwrap_err();
        assert!(matches!(err, AuthError::TimedOut));
        assert!(store.token().is_none());
    }

    #[test]
    fn test_pin_poll_pending_then_approved() {
        let mut server = mockito::Server::new();
        let client = ecobee_client(&server);
        let challenge = PinChallenge {
            pin: "bv29".to_string(),
            code: "auth-code".to_string(),
            poll_interval: Duration::from_secs(5),
            expires_at: Utc::now() + chrono::Duration::minutes(9),
        };

        let pending = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "authorization_pending"}"#)
            .expect(1)
            .create();
        assert!(matches!(
            poll_pin(&client, &challenge, Utc::now()).unwrap(),
            PinState::Pending
        ));
        pending.assert();

        server
            .mock("POST", "/token")
            .with_body(
                r#"{"access_token": "access-1", "refresh_token": "refresh-1", "expires_in": 3600}"#,
            )
            .expect(1)
            .create();
        let now = Utc::now();
        match poll_pin(&client, &challenge, now).unwrap() {
            PinState::Approved(pair) => {
                assert_eq!(pair.access_token, "access-1");
                assert_eq!(pair.expiry, now.timestamp() + 3600);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }
}
