pub mod app;
pub mod app_state;
pub mod config;
pub mod drink;
pub mod drink_handlers;
pub mod identity;
pub mod permissions;
pub mod store;

pub use app::build_router;
pub use app_state::AppState;
pub use common_http_errors::ApiError;
