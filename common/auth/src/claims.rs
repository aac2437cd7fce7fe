use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified JWT claims.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub permissions: BTreeSet<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub raw: serde_json::Value,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<String>,
    // Tokens issued without RBAC carry no permissions claim at all.
    #[serde(default)]
    permissions: Vec<String>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    iss: String,
    #[serde(default)]
    aud: Option<AudienceRepr>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaims(format!("exp out of range: {}", value.exp)))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaims(format!("iat out of range: {iat}")))?,
            ),
            None => None,
        };

        let audience = match value.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            subject: value.sub,
            permissions: value.permissions.into_iter().collect(),
            expires_at,
            issued_at,
            issuer: value.iss,
            audience,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
