// ABOUTME: Item repository contract the editors persist through
// ABOUTME: Storage lives behind this trait; the workspace never touches disk itself

use async_trait::async_trait;
use devvault_types::{CreateItemRequest, Item, ItemId, UpdateItemRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Async access to persisted items
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist a new item. Fails with `Validation` when the title is blank.
    async fn create_item(&self, request: CreateItemRequest) -> RepositoryResult<Item>;

    /// Apply a partial update and return the stored item
    async fn update_item(&self, request: UpdateItemRequest) -> RepositoryResult<Item>;

    async fn get_item(&self, id: ItemId) -> RepositoryResult<Option<Item>>;

    async fn delete_item(&self, id: ItemId) -> RepositoryResult<()>;
}
