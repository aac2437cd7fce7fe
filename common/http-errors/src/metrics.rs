use axum::{extract::Request, middleware::Next, response::Response};
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::ERROR_CODE_HEADER;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    )
    .expect("valid http_errors_total definition");
    REGISTRY.register(Box::new(v.clone())).ok();
    v
});

/// Middleware counting every response with status >= 400, labelled by the
/// `X-Error-Code` header (or `unknown` when a response carries none).
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let response = next.run(request).await;
            let status = response.status();
            if status.as_u16() >= 400 {
                let code = response
                    .headers()
                    .get(ERROR_CODE_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string();
                HTTP_ERRORS_TOTAL
                    .with_label_values(&[service, code.as_str(), status.as_str()])
                    .inc();
            }
            response
        })
    }
}

/// Render the registry in the Prometheus text format.
pub fn gather() -> String {
    Lazy::force(&HTTP_ERRORS_TOTAL);
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
