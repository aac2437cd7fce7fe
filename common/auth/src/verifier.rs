use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksFetcher;

/// Thread-safe store for decoding keys loaded from JWKS/PEM sources.
#[derive(Clone, Default)]
pub struct InMemoryKeyStore {
    inner: Arc<RwLock<HashMap<String, DecodingKey>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: DecodingKey) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kid.into(), key);
    }

    pub fn insert_rsa_pem(&self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<()> {
        let kid = kid.into();
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
        self.insert_key(kid, key);
        Ok(())
    }

    pub fn get(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        for (kid, key) in entries.into_iter() {
            guard.insert(kid, key);
        }
    }
}

/// Verifies bearer tokens against the identity provider's keys and claims.
#[derive(Clone)]
pub struct TokenValidator {
    config: JwtConfig,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
    last_on_demand_refresh: Arc<Mutex<Option<Instant>>>,
}

impl TokenValidator {
    pub fn new(config: JwtConfig) -> Self {
        Self::with_store(config, InMemoryKeyStore::new())
    }

    pub fn with_store(config: JwtConfig, store: InMemoryKeyStore) -> Self {
        Self {
            config,
            store,
            jwks: None,
            last_on_demand_refresh: Arc::default(),
        }
    }

    pub fn builder(config: JwtConfig) -> TokenValidatorBuilder {
        TokenValidatorBuilder::new(config)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryKeyStore {
        &self.store
    }

    pub fn jwks_fetcher(&self) -> Option<&JwksFetcher> {
        self.jwks.as_ref()
    }

    /// Verify against the keys currently held in the store.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        if header.alg != self.config.algorithm {
            return Err(AuthError::UnexpectedAlgorithm {
                expected: self.config.algorithm,
                found: header.alg,
            });
        }
        let kid = header
            .kid
            .ok_or(AuthError::MalformedHeader("Authorization malformed."))?;
        let key = self
            .store
            .get(&kid)
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;

        let mut validation = Validation::new(self.config.algorithm);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = self.config.leeway_seconds.into();

        let token_data = decode::<Value>(token, &key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(kid, subject = ?claims.subject, "verified JWT successfully");
        Ok(claims)
    }

    /// Verify a token, refetching the key set once when its key id is unknown
    /// (the provider may have rotated keys since the last refresh).
    pub async fn validate(&self, token: &str) -> AuthResult<Claims> {
        match self.verify(token) {
            Err(AuthError::UnknownKeyId(kid)) if self.jwks.is_some() => {
                if !self.claim_on_demand_refresh() {
                    return Err(AuthError::UnknownKeyId(kid));
                }
                match self.refresh_jwks().await {
                    Ok(count) => debug!(count, kid, "refreshed JWKS after unknown kid"),
                    Err(err) => {
                        // The token still has no matching key; report that, not the fetch.
                        warn!(error = %err, kid, "JWKS refresh after unknown kid failed");
                        return Err(AuthError::UnknownKeyId(kid));
                    }
                }
                self.verify(token)
            }
            other => other,
        }
    }

    fn claim_on_demand_refresh(&self) -> bool {
        let mut last = self
            .last_on_demand_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.config.on_demand_refresh_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    pub async fn refresh_jwks(&self) -> AuthResult<usize> {
        let fetcher = match &self.jwks {
            Some(fetcher) => fetcher,
            None => return Ok(0),
        };

        let keys = fetcher.fetch().await?;
        let count = keys.len();
        if count > 0 {
            self.store.replace_all(keys);
        } else {
            warn!(jwks_url = fetcher.url(), "JWKS returned no usable keys; keeping previous set");
        }
        Ok(count)
    }
}

pub struct TokenValidatorBuilder {
    config: JwtConfig,
    store: InMemoryKeyStore,
    jwks: Option<JwksFetcher>,
}

impl TokenValidatorBuilder {
    fn new(config: JwtConfig) -> Self {
        Self {
            config,
            store: InMemoryKeyStore::new(),
            jwks: None,
        }
    }

    pub fn with_rsa_pem(self, kid: impl Into<String>, pem: &[u8]) -> AuthResult<Self> {
        self.store.insert_rsa_pem(kid, pem)?;
        Ok(self)
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks = Some(JwksFetcher::new(url));
        self
    }

    pub async fn build(self) -> AuthResult<TokenValidator> {
        let validator = TokenValidator {
            config: self.config,
            store: self.store,
            jwks: self.jwks,
            last_on_demand_refresh: Arc::default(),
        };

        if validator.jwks.is_some() {
            validator.refresh_jwks().await?;
        }

        Ok(validator)
    }
}
