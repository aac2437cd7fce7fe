use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AuthError, AuthResult};

/// Fetches the identity provider's public key set.
#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> AuthResult<Vec<(String, DecodingKey)>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksResponse = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;

        Ok(decode_keys(body.keys))
    }
}

/// Keeps the usable RS256 signing keys; anything else is skipped with a warning
/// so one odd entry does not take the whole key set down.
fn decode_keys(entries: Vec<JwkEntry>) -> Vec<(String, DecodingKey)> {
    let mut keys = Vec::new();
    for key in entries {
        let Some(kid) = key.kid else {
            warn!("skipping JWKS entry without kid");
            continue;
        };
        let kty = key.kty.as_deref().unwrap_or("RSA");
        if kty != "RSA" {
            warn!(kid, kty, "skipping JWKS entry with unsupported key type");
            continue;
        }
        if let Some(alg) = key.alg.as_deref() {
            if alg != "RS256" {
                warn!(kid, alg, "skipping JWKS entry with unsupported alg");
                continue;
            }
        }
        if let Some(key_use) = key.key_use.as_deref() {
            if key_use != "sig" {
                warn!(kid, key_use, "skipping JWKS entry not meant for signatures");
                continue;
            }
        }
        let (Some(modulus), Some(exponent)) = (key.n, key.e) else {
            warn!(kid, "skipping JWKS entry missing RSA components");
            continue;
        };

        match DecodingKey::from_rsa_components(&modulus, &exponent) {
            Ok(decoding_key) => keys.push((kid, decoding_key)),
            Err(err) => warn!(kid, error = %err, "skipping JWKS entry with unparseable key"),
        }
    }
    keys
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: Option<String>,
    e: Option<String>,
}
