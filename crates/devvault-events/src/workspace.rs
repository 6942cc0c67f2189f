// ABOUTME: Workspace domain events for the tab bar
// ABOUTME: Immutable facts about tabs being opened, replaced, promoted and closed

use devvault_types::{ItemId, TabId, TabKind};

/// Workspace domain events - everything that changes the set or state of open tabs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A tab was appended to the tab bar
    TabOpened {
        tab_id: TabId,
        kind: TabKind,
        title: String,
    },

    /// A preview tab was reused in place for new content
    TabReplaced {
        previous: TabId,
        tab_id: TabId,
        kind: TabKind,
    },

    /// The active tab changed
    TabActivated {
        previous: Option<TabId>,
        tab_id: TabId,
    },

    TabPinned {
        tab_id: TabId,
    },

    TabClosed {
        tab_id: TabId,
        next_active: Option<TabId>,
    },

    /// A draft tab became the tab of a freshly created item
    TabPromoted {
        draft_tab_id: TabId,
        tab_id: TabId,
        item_id: ItemId,
    },

    TabTitleChanged {
        tab_id: TabId,
        title: String,
    },

    TabDirtyChanged {
        tab_id: TabId,
        is_dirty: bool,
    },

    /// Closing a dirty tab is waiting for the user's decision
    CloseConfirmationRequested {
        tab_id: TabId,
    },

    CloseCancelled {
        tab_id: TabId,
    },
}

impl Event {
    /// The tab the event is about
    pub fn tab_id(&self) -> &TabId {
        match self {
            Event::TabOpened { tab_id, .. }
            | Event::TabReplaced { tab_id, .. }
            | Event::TabActivated { tab_id, .. }
            | Event::TabPinned { tab_id }
            | Event::TabClosed { tab_id, .. }
            | Event::TabPromoted { tab_id, .. }
            | Event::TabTitleChanged { tab_id, .. }
            | Event::TabDirtyChanged { tab_id, .. }
            | Event::CloseConfirmationRequested { tab_id }
            | Event::CloseCancelled { tab_id } => tab_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promoted_event_points_at_new_tab() {
        let event = Event::TabPromoted {
            draft_tab_id: TabId::new("draft-1"),
            tab_id: TabId::for_item(ItemId(9)),
            item_id: ItemId(9),
        };
        assert_eq!(event.tab_id().as_str(), "item-9");
    }
}
