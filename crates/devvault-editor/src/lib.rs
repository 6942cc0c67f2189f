// ABOUTME: Item editing layer: draft buffers, autosave debouncing and the item editor
// ABOUTME: Persists through the ItemRepository trait and reports through the workspace store

pub mod debouncer;
pub mod draft_buffer;
pub mod editor;
pub mod error;
pub mod memory;
pub mod repository;

pub use debouncer::{DebounceConfig, Debouncer};
pub use draft_buffer::{DraftBuffer, DraftFields};
pub use editor::{Binding, EditorContext, ItemEditor, LoadState, SaveOutcome};
pub use error::{EditorError, ValidationError};
pub use memory::{CallCounts, InMemoryRepository};
pub use repository::{ItemRepository, RepositoryError, RepositoryResult};
