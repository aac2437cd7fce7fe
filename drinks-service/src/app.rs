use axum::{
    handler::Handler,
    middleware,
    routing::get,
    Router,
};
use common_auth::permission_gate;
use common_http_errors::{http_error_metrics_layer, ApiError};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::drink_handlers::{
    create_drink, delete_drink, list_drink_details, list_drinks, update_drink,
};
use crate::permissions::{DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS};

pub const SERVICE_NAME: &str = "drinks-service";

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> String {
    common_http_errors::gather()
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Builds the full HTTP surface. Each protected route is wrapped in its own
/// permission gate, so authentication happens before any path or body parsing.
pub fn build_router(state: AppState) -> Router {
    let validator = state.validator.clone();
    let gate = move |permission: &'static str| permission_gate(validator.clone(), permission);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/drinks",
            get(list_drinks).post(create_drink.layer(gate(POST_DRINKS))),
        )
        .route(
            "/drinks-detail",
            get(list_drink_details.layer(gate(GET_DRINKS_DETAIL))),
        )
        .route(
            "/drinks/:id",
            axum::routing::patch(update_drink.layer(gate(PATCH_DRINKS)))
                .delete(delete_drink.layer(gate(DELETE_DRINKS))),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
        .layer(TraceLayer::new_for_http())
}
