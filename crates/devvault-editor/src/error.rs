// ABOUTME: Error types surfaced by item editors
// ABOUTME: Validation, repository, read-only and lifecycle failures of explicit saves

use crate::repository::RepositoryError;

/// Field problems caught before any repository call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,
}

/// Errors returned by editor operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Item is read-only")]
    ReadOnly,

    #[error("Item is not loaded")]
    NotLoaded,

    #[error("Editor was unmounted")]
    Unmounted,

    #[error("Draft is already being created")]
    CreateInProgress,
}
