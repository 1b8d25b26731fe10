//! Authenticated HTTP transport
//!
//! Builds `host/base_path/version/resource/endpoint` URLs, attaches a bearer
//! token to every request, retries transient failures with exponential
//! backoff and maps error statuses onto [`ClientError`].

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::{Token, TokenCache, TokenResponse};
use crate::config::{ClientConfig, RetryConfig};
use crate::error::{ClientError, Result, ValidationDetail};

/// Query parameters of one request; `None` values are dropped
pub type Params = Vec<(&'static str, Option<String>)>;

/// Transport shared by every resource API of a client
pub struct Transport {
    client: Client,
    api_root: Url,
    auth_url: Url,
    username: String,
    password: String,
    admin_key: Option<String>,
    retry: RetryConfig,
    tokens: TokenCache,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("api_root", &self.api_root.as_str())
            .field("username", &self.username)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let connection = &config.connection;
        if connection.username.is_empty() || connection.password.is_empty() {
            return Err(ClientError::Config(
                "username and password must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeouts.request_ms))
            .connect_timeout(Duration::from_millis(config.timeouts.connect_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        let api_root = Url::parse(&config.api_root())?;
        let auth_url = Url::parse(&config.auth_url())?;

        Ok(Self {
            client,
            api_root,
            auth_url,
            username: config.connection.username.clone(),
            password: config.connection.password.clone(),
            admin_key: config.connection.admin_key.clone(),
            retry: config.retry.clone(),
            tokens: TokenCache::new(),
        })
    }

    /// `host/base_path/version/`
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref()
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Resolve `path` under the API root and append the non-empty parameters
    pub fn url(&self, path: &str, params: &Params) -> Result<Url> {
        let mut url = self.api_root.join(path.trim_start_matches('/'))?;
        let present: Vec<_> = params
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (*k, v.as_str())))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        Ok(url)
    }

    #[instrument(skip(self, params))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T> {
        let url = self.url(path, &params)?;
        let body = self.send(Method::GET, &url, None).await?;
        parse(&url, &body)
    }

    #[instrument(skip(self, params, body))]
    pub async fn post<B, T>(&self, path: &str, params: Params, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &params)?;
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::POST, &url, Some(&body)).await?;
        parse(&url, &response)
    }

    #[instrument(skip(self, params, body))]
    pub async fn patch<B, T>(&self, path: &str, params: Params, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &params)?;
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::PATCH, &url, Some(&body)).await?;
        parse(&url, &response)
    }

    #[instrument(skip(self, params))]
    pub async fn delete(&self, path: &str, params: Params) -> Result<()> {
        let url = self.url(path, &params)?;
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    /// Fetch a token from the auth endpoint, bypassing the cache
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<Token> {
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        // Token requests are safe to resend
        let body = self
            .retry_loop(&self.auth_url, true, || {
                self.client.post(self.auth_url.clone()).form(&form)
            })
            .await?;
        let response: TokenResponse = parse(&self.auth_url, &body)?;
        let token = Token::try_from(response)?;
        debug!(expires = %token.expires, "Authenticated as {}", self.username);
        Ok(token)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let token = self
            .tokens
            .get_or_refresh(|| self.authenticate())
            .await?;

        debug!("{} {}", method, url);
        let result = self
            .retry_loop(url, is_idempotent(&method), || {
                let request = self
                    .client
                    .request(method.clone(), url.clone())
                    .bearer_auth(&token)
                    .header(CONTENT_TYPE, "application/json");
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await;

        if let Err(ClientError::Unauthorized { status: 401, .. }) = &result {
            self.tokens.invalidate().await;
        }
        result
    }

    /// Send the request built by `build` until it succeeds, fails
    /// permanently, or the retry budget is spent
    ///
    /// Non-idempotent requests are only resent after a connection failure,
    /// where nothing reached the server. A transient status or a timeout may
    /// follow a committed write and is returned as is.
    async fn retry_loop<F>(&self, url: &Url, idempotent: bool, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.retry.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if idempotent && self.retry.is_retryable_status(status.as_u16()) {
                        if attempt < max_attempts {
                            self.backoff(url, attempt, &status.to_string()).await;
                            continue;
                        }
                        let body = response.text().await.unwrap_or_default();
                        return Err(ClientError::RetriesExhausted {
                            url: url.to_string(),
                            status: status.as_u16(),
                            attempts: attempt,
                            body,
                        });
                    }

                    let body = response.text().await.map_err(|e| ClientError::Request {
                        url: url.to_string(),
                        source: e,
                    })?;
                    if status.is_success() {
                        return Ok(body);
                    }
                    return Err(classify(url, status, body));
                }
                Err(e) if e.is_connect() || (idempotent && e.is_timeout()) => {
                    if attempt < max_attempts {
                        self.backoff(url, attempt, &e.to_string()).await;
                        continue;
                    }
                    return Err(ClientError::Connection {
                        url: url.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    return Err(ClientError::Request {
                        url: url.to_string(),
                        source: e,
                    })
                }
            }
        }
    }

    async fn backoff(&self, url: &Url, attempt: u32, reason: &str) {
        let delay = self.retry.backoff(attempt);
        warn!(
            attempt,
            max_retries = self.retry.max_retries,
            "Transient failure from {} ({}), retrying in {:?}",
            url,
            reason,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

/// Whether resending `method` after an ambiguous failure is harmless
fn is_idempotent(method: &Method) -> bool {
    !matches!(*method, Method::POST | Method::PATCH)
}

#[derive(serde::Deserialize)]
struct ValidationBody {
    detail: Vec<ValidationDetail>,
}

/// Map a non-success status onto the error taxonomy
fn classify(url: &Url, status: StatusCode, body: String) -> ClientError {
    let url = url.to_string();
    match status {
        StatusCode::UNPROCESSABLE_ENTITY => {
            let details = serde_json::from_str::<ValidationBody>(&body)
                .map(|b| b.detail)
                .unwrap_or_default();
            ClientError::Validation { url, details, body }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized {
            url,
            status: status.as_u16(),
            body,
        },
        StatusCode::INTERNAL_SERVER_ERROR => ClientError::Server { url, body },
        _ => ClientError::Http {
            url,
            status: status.as_u16(),
            body,
        },
    }
}

fn parse<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T> {
    // Empty bodies deserialize as null so `()` and `Option<_>` targets work
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport {
        let config = ClientConfig::builder("http://localhost:8000")
            .credentials("alice", "secret")
            .build();
        Transport::new(&config).unwrap()
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let err = Transport::new(&ClientConfig::builder("http://localhost:8000").build()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let config = ClientConfig::builder("http://localhost:8000")
            .credentials("alice", "")
            .build();
        assert!(matches!(Transport::new(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_url_construction() {
        let transport = transport();
        let url = transport.url("sensor/4/data", &vec![]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/sensor/4/data");

        let params: Params = vec![
            ("filter_by", Some("name[eq]=wave probe 1".to_string())),
            ("sort_by", None),
            ("limit", Some("10".to_string())),
        ];
        let url = transport.url("sensor", &params).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/sensor?filter_by=name%5Beq%5D%3Dwave+probe+1&limit=10"
        );
        assert!(!url.as_str().contains("None"));
    }

    #[test]
    fn test_classify() {
        let url = Url::parse("http://h/api/v1/campaign").unwrap();
        let body = r#"{"detail": [{"loc": ["body", "name"], "msg": "field required"}]}"#;
        match classify(&url, StatusCode::UNPROCESSABLE_ENTITY, body.to_string()) {
            ClientError::Validation { details, .. } => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field(), Some("name"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = classify(&url, StatusCode::FORBIDDEN, "IP not allowed".into());
        assert!(matches!(err, ClientError::Unauthorized { status: 403, .. }));
        assert!(err.to_string().contains("IP not allowed"));

        assert!(matches!(
            classify(&url, StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            ClientError::Server { .. }
        ));
        assert!(classify(&url, StatusCode::NOT_FOUND, "missing".into()).is_not_found());
    }

    #[test]
    fn test_only_reads_and_deletes_are_idempotent() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::DELETE));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PATCH));
    }

    #[test]
    fn test_parse_empty_body() {
        let url = Url::parse("http://h/").unwrap();
        let unit: () = parse(&url, "").unwrap();
        assert_eq!(unit, ());
        let missing: Option<i64> = parse(&url, "  ").unwrap();
        assert_eq!(missing, None);
        assert!(parse::<i64>(&url, "{").is_err());
    }
}
