pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use extractors::{bearer_token, AuthContext};
pub use guards::ensure_permission;
pub use jwks::JwksFetcher;
pub use middleware::{authorize, permission_gate};
pub use verifier::{InMemoryKeyStore, TokenValidator, TokenValidatorBuilder};
