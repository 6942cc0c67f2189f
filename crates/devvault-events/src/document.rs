// ABOUTME: Document domain events for item loading and persistence
// ABOUTME: Outcomes of repository calls issued by editors, success and failure alike

use devvault_types::{ItemId, TabId};

/// What caused a repository write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Debounced autosave after the user stopped typing
    Autosave,
    /// Explicit save button or keybinding
    Manual,
    /// First creation of a draft
    DraftCreate,
    /// Follow-up write carrying edits made while a draft was being created
    DraftSync,
}

/// Document domain events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Item content arrived for a mounted editor
    Loaded { tab_id: TabId, item_id: ItemId },

    /// The item behind a tab no longer exists
    NotFound { tab_id: TabId, item_id: ItemId },

    /// A draft was persisted for the first time
    Created {
        draft_tab_id: TabId,
        item_id: ItemId,
    },

    Saved {
        item_id: ItemId,
        trigger: SaveTrigger,
    },

    SaveFailed {
        tab_id: TabId,
        item_id: Option<ItemId>,
        trigger: SaveTrigger,
        error: String,
    },
}
