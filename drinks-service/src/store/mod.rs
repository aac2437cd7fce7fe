use async_trait::async_trait;
use common_http_errors::ApiError;
use thiserror::Error;

use crate::drink::{Drink, Recipe};

mod memory;
mod postgres;

pub use memory::InMemoryMenuStore;
pub use postgres::PgMenuStore;

/// Titles are limited to 80 characters by the schema.
pub const MAX_TITLE_LEN: usize = 80;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("drink {0} not found")]
    NotFound(i64),
    #[error("write rejected by store: {0}")]
    Constraint(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored drink {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields to change on an existing drink; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DrinkChanges {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

/// Persistence for the drinks menu. Every write is atomic: on failure nothing
/// of it is visible to later reads.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// All drinks ordered by id.
    async fn list_all(&self) -> StoreResult<Vec<Drink>>;

    async fn exists(&self, id: i64) -> StoreResult<bool>;

    async fn insert(&self, title: String, recipe: Recipe) -> StoreResult<Drink>;

    async fn update(&self, id: i64, changes: DrinkChanges) -> StoreResult<Drink>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Drop every drink and seed the sample menu.
    async fn reset(&self) -> StoreResult<()>;
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::not_found(),
            StoreError::Constraint(reason) => {
                tracing::warn!(%reason, "store rejected write");
                ApiError::unprocessable()
            }
            StoreError::Unavailable(reason) => {
                tracing::error!(%reason, "store unavailable during write");
                ApiError::Unprocessable { code: "store_unavailable", message: None }
            }
            StoreError::Corrupt { id, reason } => {
                tracing::error!(drink_id = id, %reason, "corrupt drink record");
                ApiError::Internal { message: None }
            }
        }
    }
}
