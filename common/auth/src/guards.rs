use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

pub fn ensure_permission(claims: &Claims, required: &str) -> AuthResult<()> {
    if claims.has_permission(required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions {
            required: required.to_string(),
        })
    }
}
