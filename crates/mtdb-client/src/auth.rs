//! Bearer token lifecycle
//!
//! The transport owns one [`TokenCache`]. A request first asks the cache for
//! a token; when none is held or the held one has expired, the caller-supplied
//! refresh future runs while the cache lock is held, so concurrent requests
//! wait for a single authentication round trip instead of racing.

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ClientError, Result};

/// An access token and the instant it stops being accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub expires: DateTime<Utc>,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Body of `POST auth/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires: Expiry,
}

/// Expiry as sent by the server: epoch seconds or a timestamp string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    Epoch(f64),
    Text(String),
}

impl Expiry {
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::Epoch(secs) => {
                let millis = (secs * 1000.0).round() as i64;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| invalid_expiry(&secs.to_string()))
            }
            Self::Text(text) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Ok(dt.with_timezone(&Utc));
                }
                // Naive timestamps are UTC
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| invalid_expiry(text))
            }
        }
    }
}

fn invalid_expiry(value: &str) -> ClientError {
    ClientError::Parse {
        url: "auth/token".to_string(),
        message: format!("unrecognized token expiry '{}'", value),
    }
}

impl TryFrom<TokenResponse> for Token {
    type Error = ClientError;

    fn try_from(response: TokenResponse) -> Result<Self> {
        Ok(Self {
            expires: response.expires.to_datetime()?,
            access_token: response.access_token,
        })
    }
}

/// Single-flight holder of the current token
#[derive(Debug, Default)]
pub struct TokenCache {
    token: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a valid access token, running `refresh` if none is held
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.access_token.clone());
        }

        debug!("Requesting new access token");
        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Drop the held token so the next request authenticates again
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    pub async fn set(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    pub async fn current(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }
}
