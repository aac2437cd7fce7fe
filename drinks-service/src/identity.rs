use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common_auth::{JwtConfig, TokenValidator};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::AuthSettings;

pub const DEV_KEY_ID: &str = "local-dev";
const MIN_REFRESH_SECONDS: u64 = 60;

pub async fn build_token_validator(settings: &AuthSettings) -> anyhow::Result<Arc<TokenValidator>> {
    let mut config = JwtConfig::new(settings.issuer.clone(), settings.audience.clone());
    if let Some(leeway) = settings.leeway_seconds {
        config = config.with_leeway(leeway);
    }

    let mut builder = TokenValidator::builder(config);

    if let Some(url) = &settings.jwks_url {
        info!(jwks_url = %url, "Configuring JWKS fetcher");
        builder = builder.with_jwks_url(url.clone());
    }

    if let Some(pem) = &settings.dev_public_key_pem {
        warn!("Using JWT_DEV_PUBLIC_KEY_PEM for verification; do not enable in production");
        builder = builder
            .with_rsa_pem(DEV_KEY_ID, pem.as_bytes())
            .context("JWT_DEV_PUBLIC_KEY_PEM is not a valid RSA public key")?;
    }

    if settings.jwks_url.is_none() && settings.dev_public_key_pem.is_none() {
        warn!("No JWKS URL or dev key configured; every protected request will be rejected");
    }

    let validator = builder
        .build()
        .await
        .context("failed to initialise token validator")?;
    info!(keys = validator.store().len(), "Token validator initialised");
    Ok(Arc::new(validator))
}

/// Periodically re-fetches the JWKS so rotated keys are picked up without a
/// restart. Returns `None` when no JWKS endpoint is configured.
pub fn spawn_jwks_refresh(
    validator: Arc<TokenValidator>,
    refresh_seconds: u64,
) -> Option<JoinHandle<()>> {
    let url = validator.jwks_fetcher()?.url().to_owned();
    let period = Duration::from_secs(refresh_seconds.max(MIN_REFRESH_SECONDS));

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and the builder has already fetched once.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match validator.refresh_jwks().await {
                Ok(count) => debug!(count, jwks_url = %url, "Refreshed JWKS keys"),
                Err(err) => warn!(error = %err, jwks_url = %url, "Failed to refresh JWKS keys"),
            }
        }
    }))
}
