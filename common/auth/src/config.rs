use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Runtime configuration for bearer token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Expected issuer claim (iss).
    pub issuer: String,
    /// Expected audience claim (aud).
    pub audience: String,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
    /// Signing algorithm the identity provider uses; tokens advertising any other are rejected.
    pub algorithm: Algorithm,
    /// Minimum spacing between JWKS refetches triggered by an unknown key id.
    pub on_demand_refresh_interval: Duration,
}

impl JwtConfig {
    /// Construct config with sensible defaults (RS256, 30 second leeway).
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds: 30,
            algorithm: Algorithm::RS256,
            on_demand_refresh_interval: Duration::from_secs(30),
        }
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_on_demand_refresh_interval(mut self, interval: Duration) -> Self {
        self.on_demand_refresh_interval = interval;
        self
    }
}
