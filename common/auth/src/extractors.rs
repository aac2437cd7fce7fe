use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// Verified claims and the raw token, attached to requests that passed the gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn subject(&self) -> Option<&str> {
        self.claims.subject.as_deref()
    }
}

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let header_value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    parse_bearer(header_value)
}

fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("Authorization malformed."))?;

    let mut parts = raw.split_whitespace();
    let scheme = parts
        .next()
        .ok_or(AuthError::MalformedHeader("Authorization malformed."))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader(
            "Authorization header must start with \"Bearer\".",
        ));
    }

    let token = parts
        .next()
        .ok_or(AuthError::MalformedHeader("Token not found."))?;
    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader(
            "Authorization header must be bearer token.",
        ));
    }

    Ok(token.to_owned())
}
