use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{
    DecodingKey,
    jwk::{Jwk, JwkSet},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::AuthnError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the issuer's public keys come from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthnError>;
}

/// Fetches the key set from the issuer's well-known endpoint.
#[derive(Clone, Debug)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetSource {
    pub fn new(url: impl Into<String>) -> Result<Self, AuthnError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| AuthnError::Configuration(format!("http client: {err}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, AuthnError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| AuthnError::KeySetFetch(err.to_string()))?;
        response
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthnError::KeySetFetch(err.to_string()))
    }
}

/// A fixed key set, for pinned keys and tests.
#[derive(Clone, Debug)]
pub struct StaticKeySetSource {
    keys: JwkSet,
}

impl StaticKeySetSource {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeySetSource for StaticKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, AuthnError> {
        Ok(self.keys.clone())
    }
}

struct CachedKeySet {
    fetched_at: Instant,
    keys: Arc<JwkSet>,
}

/// Read-through cache in front of a [`KeySetSource`].
///
/// A `kid` missing from a fresh cached set forces one refetch, which picks up
/// key rotation without waiting for the TTL.
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    cached: RwLock<Option<CachedKeySet>>,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AuthnError> {
        if let Some(keys) = self.fresh().await {
            if let Some(jwk) = select_key(&keys, kid) {
                return decoding_key_from(jwk);
            }
            debug!(?kid, "kid not in cached key set; refetching");
        }
        let keys = self.refresh().await?;
        let jwk = select_key(&keys, kid).ok_or_else(|| AuthnError::UnknownKey(kid.map(str::to_owned)))?;
        decoding_key_from(jwk)
    }

    async fn fresh(&self) -> Option<Arc<JwkSet>> {
        if self.ttl.is_zero() {
            return None;
        }
        let guard = self.cached.read().await;
        guard
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.keys))
    }

    async fn refresh(&self) -> Result<Arc<JwkSet>, AuthnError> {
        let keys = Arc::new(self.source.fetch().await.inspect_err(|err| {
            warn!(error = %err, "could not fetch published key set");
        })?);
        if !self.ttl.is_zero() {
            *self.cached.write().await = Some(CachedKeySet {
                fetched_at: Instant::now(),
                keys: Arc::clone(&keys),
            });
        }
        Ok(keys)
    }
}

fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => keys.find(kid),
        None if keys.keys.len() == 1 => keys.keys.first(),
        None => None,
    }
}

fn decoding_key_from(jwk: &Jwk) -> Result<DecodingKey, AuthnError> {
    DecodingKey::from_jwk(jwk).map_err(|err| {
        warn!(error = %err, "published key is unusable");
        AuthnError::InvalidToken
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub(crate) const TEST_KID: &str = "planning-test-es256";

    pub(crate) fn test_key_set() -> JwkSet {
        serde_json::from_value(serde_json::json!({
            "keys": [{
                "kty": "EC",
                "crv": "P-256",
                "x": "i3zcXqBvoXEgRFs0X91fyWFJxAbzFWSi6FJdO_HT29I",
                "y": "ByiSPxBnmRDcwnIpVEH4JR_nvtOr-_8bCcmIk9Fm_mY",
                "kid": TEST_KID,
                "alg": "ES256",
                "use": "sig"
            }]
        }))
        .unwrap()
    }

    pub(crate) struct CountingSource {
        pub(crate) keys: JwkSet,
        pub(crate) calls: AtomicUsize,
    }

    #[async_trait]
    impl KeySetSource for CountingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthnError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KeySetSource for FailingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthnError> {
            Err(AuthnError::KeySetFetch("connection refused".into()))
        }
    }

    fn counting() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            keys: test_key_set(),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn fresh_cache_serves_known_kid_without_refetch() {
        let source = counting();
        let cache = KeySetCache::new(source.clone(), Duration::from_secs(60));
        cache.decoding_key(Some(TEST_KID)).await.unwrap();
        cache.decoding_key(Some(TEST_KID)).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_refetches_once_then_fails() {
        let source = counting();
        let cache = KeySetCache::new(source.clone(), Duration::from_secs(60));
        cache.decoding_key(Some(TEST_KID)).await.unwrap();
        let err = cache.decoding_key(Some("rotated-away")).await.err().unwrap();
        assert!(matches!(err, AuthnError::UnknownKey(Some(kid)) if kid == "rotated-away"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_fetches_every_time() {
        let source = counting();
        let cache = KeySetCache::new(source.clone(), Duration::ZERO);
        cache.decoding_key(Some(TEST_KID)).await.unwrap();
        cache.decoding_key(Some(TEST_KID)).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn single_key_set_serves_tokens_without_kid() {
        let cache = KeySetCache::new(counting(), Duration::from_secs(60));
        assert!(cache.decoding_key(None).await.is_ok());
    }

    #[tokio::test]
    async fn fetch_failures_propagate() {
        let cache = KeySetCache::new(Arc::new(FailingSource), Duration::from_secs(60));
        let err = cache.decoding_key(Some(TEST_KID)).await.err().unwrap();
        assert!(matches!(err, AuthnError::KeySetFetch(_)));
    }
}
