use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{from_fn_with_state, FromFnLayer, Next};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tracing::warn;

use crate::error::AuthResult;
use crate::extractors::{bearer_token, AuthContext};
use crate::guards::ensure_permission;
use crate::verifier::TokenValidator;

type GateState = State<Arc<TokenValidator>>;

/// Validate the request's bearer token and require `permission` in its claims.
pub async fn authorize(
    validator: &TokenValidator,
    headers: &HeaderMap,
    permission: &str,
) -> AuthResult<AuthContext> {
    let token = bearer_token(headers)?;
    let claims = validator.validate(&token).await?;
    ensure_permission(&claims, permission)?;
    Ok(AuthContext { claims, token })
}

/// Layer guarding a handler with `permission`. The wrapped handler can pull the
/// verified [`AuthContext`] out of the request extensions.
pub fn permission_gate(
    validator: Arc<TokenValidator>,
    permission: &'static str,
) -> FromFnLayer<
    impl Fn(GateState, Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static,
    Arc<TokenValidator>,
    (GateState, Request),
> {
    from_fn_with_state(validator, require_permission(permission))
}

fn require_permission(
    permission: &'static str,
) -> impl Fn(GateState, Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
{
    move |State(validator): GateState, mut request: Request, next: Next| {
        Box::pin(async move {
            match authorize(&validator, request.headers(), permission).await {
                Ok(context) => {
                    request.extensions_mut().insert(context);
                    next.run(request).await
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        code = err.code(),
                        permission,
                        path = %request.uri().path(),
                        "request rejected by permission gate"
                    );
                    err.into_response()
                }
            }
        })
    }
}
