// ABOUTME: Pure data types with no cross-crate dependencies
// ABOUTME: Foundation layer for all other devvault crates

pub mod config;
pub mod doc;
pub mod item;
pub mod keys;
pub mod tab;

// Re-export commonly used types
pub use config::{EditorConfig, WorkspaceConfig};
pub use doc::{DocEntry, DocId};
pub use item::{CreateItemRequest, Item, ItemId, ItemType, Tag, UpdateItemRequest, parse_tags};
pub use keys::KeyChord;
pub use tab::{
    DOCUMENTATION_TAB_TITLE, NEW_TAB_TITLE, PreviewGroup, Tab, TabId, TabKind,
    draft_placeholder_title,
};
