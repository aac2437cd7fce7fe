use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Coarse classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    MissingToken,
    MalformedHeader,
    InvalidSignature,
    ExpiredOrInvalidClaims,
    InsufficientPermissions,
    UnknownError,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingToken,
    #[error("authorization header malformed: {0}")]
    MalformedHeader(&'static str),
    #[error("failed to decode token header: {0}")]
    InvalidHeader(String),
    #[error("token uses algorithm {found:?}, expected {expected:?}")]
    UnexpectedAlgorithm {
        expected: jsonwebtoken::Algorithm,
        found: jsonwebtoken::Algorithm,
    },
    #[error("no decoding key registered for kid '{0}'")]
    UnknownKeyId(String),
    #[error("token signature verification failed")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    #[error("permission '{required}' not granted")]
    InsufficientPermissions { required: String },
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("failed to parse decoding key for kid '{0}': {1}")]
    KeyParse(String, String),
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("token validation failed: {0}")]
    Unknown(String),
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::MissingToken => AuthErrorKind::MissingToken,
            AuthError::MalformedHeader(_)
            | AuthError::InvalidHeader(_)
            | AuthError::UnexpectedAlgorithm { .. } => AuthErrorKind::MalformedHeader,
            AuthError::UnknownKeyId(_) | AuthError::InvalidSignature => {
                AuthErrorKind::InvalidSignature
            }
            AuthError::Expired | AuthError::InvalidClaims(_) => {
                AuthErrorKind::ExpiredOrInvalidClaims
            }
            AuthError::InsufficientPermissions { .. } => AuthErrorKind::InsufficientPermissions,
            AuthError::InvalidJson(_)
            | AuthError::KeyParse(_, _)
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::Unknown(_) => AuthErrorKind::UnknownError,
        }
    }

    /// Machine readable code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "authorization_header_missing",
            AuthError::MalformedHeader(_)
            | AuthError::InvalidHeader(_)
            | AuthError::UnexpectedAlgorithm { .. }
            | AuthError::UnknownKeyId(_) => "invalid_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::InsufficientPermissions { .. } => "unauthorized",
            AuthError::InvalidJson(_)
            | AuthError::KeyParse(_, _)
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::Unknown(_) => "invalid_token",
        }
    }

    /// Human readable description returned to clients.
    pub fn description(&self) -> String {
        match self {
            AuthError::MissingToken => "Authorization header is expected.".to_string(),
            AuthError::MalformedHeader(reason) => (*reason).to_string(),
            AuthError::InvalidHeader(_) => "Unable to parse authentication token.".to_string(),
            AuthError::UnexpectedAlgorithm { .. } => {
                "Token is signed with an unsupported algorithm.".to_string()
            }
            AuthError::UnknownKeyId(_) => "Unable to find the appropriate key.".to_string(),
            AuthError::InvalidSignature => "Token signature is invalid.".to_string(),
            AuthError::Expired => "Token expired.".to_string(),
            AuthError::InvalidClaims(_) => {
                "Incorrect claims. Please, check the audience and issuer.".to_string()
            }
            AuthError::InsufficientPermissions { .. } => "Permission not found.".to_string(),
            AuthError::InvalidJson(_)
            | AuthError::KeyParse(_, _)
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::Unknown(_) => "Unable to parse authentication token.".to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::InvalidClaims(value.to_string()),
            _ => Self::Unknown(value.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        let code = value.code();
        let message = value.description();
        match value.kind() {
            AuthErrorKind::InsufficientPermissions => ApiError::Forbidden { code, message },
            _ => ApiError::Unauthorized { code, message },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
