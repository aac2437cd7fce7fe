use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: Option<String>,
    pub leeway_seconds: Option<u32>,
    pub dev_public_key_pem: Option<String>,
    pub jwks_refresh_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub reset_on_start: bool,
    pub allowed_origins: Vec<String>,
    pub auth: AuthSettings,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    config_from_lookup(|key| env::var(key).ok())
}

/// Builds the config from any key lookup so tests can avoid touching the process env.
pub fn config_from_lookup<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

    let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = match get("PORT") {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid PORT '{value}'"))?,
        None => 8080,
    };

    let database_max_connections = get("DATABASE_MAX_CONNECTIONS")
        .and_then(|value| value.parse().ok())
        .unwrap_or(5);

    let auth0_domain = get("AUTH0_DOMAIN").map(|domain| domain.trim_end_matches('/').to_string());
    let issuer = get("JWT_ISSUER")
        .or_else(|| auth0_domain.as_ref().map(|domain| format!("https://{domain}/")))
        .ok_or_else(|| anyhow!("JWT_ISSUER or AUTH0_DOMAIN must be set"))?;
    let audience = get("JWT_AUDIENCE")
        .or_else(|| get("API_AUDIENCE"))
        .context("JWT_AUDIENCE (or API_AUDIENCE) must be set")?;
    let jwks_url = get("JWT_JWKS_URL").or_else(|| {
        auth0_domain
            .as_ref()
            .map(|domain| format!("https://{domain}/.well-known/jwks.json"))
    });
    let leeway_seconds = get("JWT_LEEWAY_SECONDS").and_then(|value| value.parse().ok());
    let jwks_refresh_seconds = get("JWKS_REFRESH_SECONDS")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(300)
        .max(60);

    let allowed_origins = get("CORS_ALLOWED_ORIGINS")
        .map(|value| parse_list(&value))
        .unwrap_or_else(|| vec!["http://localhost:8100".to_string()]);

    Ok(ServiceConfig {
        host,
        port,
        database_url: get("DATABASE_URL"),
        database_max_connections,
        reset_on_start: get("DRINKS_RESET_ON_START")
            .map(|value| parse_bool(&value))
            .unwrap_or(false),
        allowed_origins,
        auth: AuthSettings {
            issuer,
            audience,
            jwks_url,
            leeway_seconds,
            dev_public_key_pem: get("JWT_DEV_PUBLIC_KEY_PEM"),
            jwks_refresh_seconds,
        },
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
