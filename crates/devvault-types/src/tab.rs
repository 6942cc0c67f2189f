// ABOUTME: Tab data types for the workspace tab bar
// ABOUTME: Tab identity, kind, and the preview groups tabs compete in

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::doc::DocId;
use crate::item::{ItemId, ItemType};

/// Title of a blank landing tab
pub const NEW_TAB_TITLE: &str = "New tab";

/// Title of the documentation browser tab
pub const DOCUMENTATION_TAB_TITLE: &str = "Documentation";

/// Tab identifier, unique among live tabs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id every tab bound to a persisted item carries
    pub fn for_item(item_id: ItemId) -> Self {
        Self(format!("item-{item_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a tab is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabKind {
    /// A persisted item
    Item { item_id: ItemId, item_type: ItemType },
    /// Content of a given type that has not been created yet
    Draft { item_type: ItemType },
    /// Blank landing tab
    New,
    /// Documentation set browser
    Documentation,
    /// A single documentation page
    DocEntry { doc_id: DocId, doc_path: String },
}

/// Tabs of the same group share a single preview slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewGroup {
    Items,
    DocEntries,
}

impl TabKind {
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            TabKind::Item { item_id, .. } => Some(*item_id),
            _ => None,
        }
    }

    pub fn item_type(&self) -> Option<ItemType> {
        match self {
            TabKind::Item { item_type, .. } | TabKind::Draft { item_type } => Some(*item_type),
            _ => None,
        }
    }

    pub fn doc_entry(&self) -> Option<(DocId, &str)> {
        match self {
            TabKind::DocEntry { doc_id, doc_path } => Some((*doc_id, doc_path.as_str())),
            _ => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, TabKind::Draft { .. })
    }

    /// The preview slot this kind may occupy, if any
    pub fn preview_group(&self) -> Option<PreviewGroup> {
        match self {
            TabKind::Item { .. } => Some(PreviewGroup::Items),
            TabKind::DocEntry { .. } => Some(PreviewGroup::DocEntries),
            TabKind::Draft { .. } | TabKind::New | TabKind::Documentation => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TabKind::Item { .. } => "item",
            TabKind::Draft { .. } => "draft",
            TabKind::New => "new",
            TabKind::Documentation => "documentation",
            TabKind::DocEntry { .. } => "docEntry",
        }
    }
}

/// A tab in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// Unique tab identifier
    pub id: TabId,

    /// What the tab shows
    pub kind: TabKind,

    /// Tab title
    pub title: String,

    /// Pinned tabs are never replaced by preview navigation
    pub is_pinned: bool,

    /// Whether the tab has unsaved changes (manual save mode only)
    pub is_dirty: bool,
}

impl Tab {
    /// Create an unpinned (preview) tab
    pub fn preview(id: TabId, kind: TabKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            is_pinned: false,
            is_dirty: false,
        }
    }

    /// Create a pinned tab
    pub fn pinned(id: TabId, kind: TabKind, title: impl Into<String>) -> Self {
        Self {
            is_pinned: true,
            ..Self::preview(id, kind, title)
        }
    }

    pub fn is_preview(&self) -> bool {
        !self.is_pinned
    }
}

/// Placeholder title shown on a draft tab until the user types one
pub fn draft_placeholder_title(item_type: ItemType) -> String {
    format!("New {}", item_type.label().to_lowercase())
}
