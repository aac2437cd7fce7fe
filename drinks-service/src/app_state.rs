use std::sync::Arc;

use common_auth::TokenValidator;

use crate::store::MenuStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: Arc<dyn MenuStore>,
    pub(crate) validator: Arc<TokenValidator>,
}

impl AppState {
    pub fn new(store: Arc<dyn MenuStore>, validator: Arc<TokenValidator>) -> Self {
        Self { store, validator }
    }
}
