//! Client entry point

use std::fmt;
use std::sync::{Arc, Weak};

use mtdb_core::{
    Campaign, FloaterConfig, FloaterTest, Sensor, Tag, WaveCalibration, WindCalibration,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ResourceApi, TestApi, TimeseriesApi};
use crate::cache::{CacheStats, DataCache};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{Params, Transport};

pub(crate) struct ClientInner {
    pub(crate) transport: Transport,
    pub(crate) cache: Option<DataCache>,
    pub(crate) config: ClientConfig,
}

/// Model-test data service client
///
/// Cheap to clone; clones share one transport, token and cache. Resource
/// APIs are obtained from the accessor methods:
///
/// ```ignore
/// let client = MtdbClient::from_env()?;
/// let campaign = client.campaigns().get_by_name("North Sea 2023").await?;
/// ```
#[derive(Clone)]
pub struct MtdbClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for MtdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MtdbClient")
            .field("transport", &self.inner.transport)
            .field("cache", &self.inner.cache.as_ref().map(|c| c.path()))
            .finish()
    }
}

impl MtdbClient {
    /// Create a client from explicit configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        let cache = DataCache::from_config(&config.cache)?;
        info!(
            api_root = %transport.api_root(),
            cache = cache.is_some(),
            "Created model-test data client"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                cache,
                config,
            }),
        })
    }

    /// Create a client from `MTDB_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Non-owning handle given to hydrated records
    pub fn handle(&self) -> ClientHandle {
        ClientHandle(Arc::downgrade(&self.inner))
    }

    pub fn campaigns(&self) -> ResourceApi<Campaign> {
        ResourceApi::new(self.clone())
    }

    pub fn sensors(&self) -> ResourceApi<Sensor> {
        ResourceApi::new(self.clone())
    }

    /// All tests, hydrated into their concrete kinds
    pub fn tests(&self) -> TestApi {
        TestApi::new(self.clone())
    }

    pub fn floater_tests(&self) -> ResourceApi<FloaterTest> {
        ResourceApi::new(self.clone())
    }

    pub fn wave_calibrations(&self) -> ResourceApi<WaveCalibration> {
        ResourceApi::new(self.clone())
    }

    pub fn wind_calibrations(&self) -> ResourceApi<WindCalibration> {
        ResourceApi::new(self.clone())
    }

    pub fn timeseries(&self) -> TimeseriesApi {
        TimeseriesApi::new(self.clone())
    }

    pub fn tags(&self) -> ResourceApi<Tag> {
        ResourceApi::new(self.clone())
    }

    pub fn floater_configs(&self) -> ResourceApi<FloaterConfig> {
        ResourceApi::new(self.clone())
    }

    pub fn cache(&self) -> Option<&DataCache> {
        self.inner.cache.as_ref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache().map(DataCache::stats)
    }

    /// Write pending cache changes to the persisted store
    pub fn flush_cache(&self) -> Result<()> {
        match self.cache() {
            Some(cache) => cache.flush(),
            None => Ok(()),
        }
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        if let Some(cache) = self.cache() {
            cache.clear();
        }
    }

    /// GET through the data cache when `use_cache` is set
    pub(crate) async fn get_cached(
        &self,
        path: &str,
        params: Params,
        use_cache: bool,
    ) -> Result<Value> {
        let cache = self.cache().filter(|_| use_cache);
        let Some(cache) = cache else {
            return self.transport().get(path, params).await;
        };

        let key = self.cache_key(path, &params);
        if let Some(value) = cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let value: Value = self.transport().get(path, params).await?;
        cache.insert(key, value.clone());
        Ok(value)
    }

    /// Drop cached responses under `prefix`
    pub(crate) fn invalidate(&self, prefix: &str) {
        if let Some(cache) = self.cache() {
            let scoped = format!("{}{}", self.transport().api_root(), prefix.trim_start_matches('/'));
            cache.invalidate_prefix(&scoped);
        }
    }

    /// Request signature scoped to this client's API root
    ///
    /// Clients of different hosts or API versions may share one store.
    pub fn cache_key(&self, path: &str, params: &Params) -> String {
        format!("{}{}", self.transport().api_root(), DataCache::key(path, params))
    }
}

/// Weak reference from a record back to the client that fetched it
#[derive(Clone, Default)]
pub struct ClientHandle(Weak<ClientInner>);

impl ClientHandle {
    /// A handle that never resolves
    pub fn detached() -> Self {
        Self::default()
    }

    /// Resolve the client, failing if it has been dropped
    pub fn client(&self) -> Result<MtdbClient> {
        self.0
            .upgrade()
            .map(|inner| MtdbClient { inner })
            .ok_or(ClientError::ClientDropped)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.strong_count() > 0 {
            "live"
        } else {
            "dropped"
        };
        f.debug_tuple("ClientHandle").field(&state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::builder("http://localhost:8000")
            .credentials("alice", "secret")
            .in_memory_cache()
            .build()
    }

    #[test]
    fn test_client_creation() {
        let client = MtdbClient::new(config()).unwrap();
        assert_eq!(
            client.transport().api_root().as_str(),
            "http://localhost:8000/api/v1/"
        );
        assert_eq!(client.cache_stats(), Some(CacheStats::default()));
    }

    #[test]
    fn test_invalid_host() {
        let config = ClientConfig::builder("not a url")
            .credentials("alice", "secret")
            .build();
        assert!(MtdbClient::new(config).is_err());
    }

    #[test]
    fn test_cache_key_includes_api_root() {
        let client = MtdbClient::new(config()).unwrap();
        let params: Params = vec![("start_time", Some("0".to_string()))];
        assert_eq!(
            client.cache_key("/timeseries/3/data", &params),
            "http://localhost:8000/api/v1/timeseries/3/data?start_time=0"
        );

        let other = ClientConfig::builder("http://localhost:9000")
            .credentials("alice", "secret")
            .api_version("v2")
            .in_memory_cache()
            .build();
        let other = MtdbClient::new(other).unwrap();
        assert_ne!(
            other.cache_key("timeseries/3/data", &params),
            client.cache_key("timeseries/3/data", &params)
        );
    }

    #[test]
    fn test_missing_credentials() {
        let config = ClientConfig::builder("http://localhost:8000").in_memory_cache().build();
        let err = MtdbClient::new(config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("username and password"));
    }

    #[test]
    fn test_handle_outlives_client() {
        let client = MtdbClient::new(config()).unwrap();
        let handle = client.handle();
        assert!(handle.client().is_ok());

        drop(client);
        assert!(matches!(handle.client(), Err(ClientError::ClientDropped)));
        assert!(matches!(
            ClientHandle::detached().client(),
            Err(ClientError::ClientDropped)
        ));
    }

    #[test]
    fn test_cache_disabled() {
        let config = ClientConfig::builder("http://localhost:8000")
            .credentials("alice", "secret")
            .no_cache()
            .build();
        let client = MtdbClient::new(config).unwrap();
        assert!(client.cache().is_none());
        client.clear_cache();
    }
}
