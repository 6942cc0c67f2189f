// ABOUTME: Event bus and handler traits for decoupled communication
// ABOUTME: Provides publish-subscribe pattern for cross-crate events

use parking_lot::Mutex;

use crate::AppEvent;
use crate::document::Event as DocumentEvent;
use crate::workspace::Event as WorkspaceEvent;

/// Event bus trait for dispatching domain events
pub trait EventBus: Send + Sync {
    /// Dispatch a workspace event
    fn dispatch_workspace(&self, event: WorkspaceEvent);

    /// Dispatch a document event
    fn dispatch_document(&self, event: DocumentEvent);
}

/// Event handler trait for receiving domain events
pub trait EventHandler {
    /// Handle a workspace event
    fn handle_workspace(&mut self, _event: &WorkspaceEvent) {}

    /// Handle a document event
    fn handle_document(&mut self, _event: &DocumentEvent) {}
}

/// Bus that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn dispatch_workspace(&self, _event: WorkspaceEvent) {}

    fn dispatch_document(&self, _event: DocumentEvent) {}
}

/// Bus that keeps every event in order, for hosts that poll and for tests
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<AppEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().clone()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<AppEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn workspace_events(&self) -> Vec<WorkspaceEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                AppEvent::Workspace(e) => Some(e.clone()),
                AppEvent::Document(_) => None,
            })
            .collect()
    }

    pub fn document_events(&self) -> Vec<DocumentEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                AppEvent::Document(e) => Some(e.clone()),
                AppEvent::Workspace(_) => None,
            })
            .collect()
    }
}

impl EventBus for RecordingEventBus {
    fn dispatch_workspace(&self, event: WorkspaceEvent) {
        self.events.lock().push(AppEvent::Workspace(event));
    }

    fn dispatch_document(&self, event: DocumentEvent) {
        self.events.lock().push(AppEvent::Document(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SaveTrigger;
    use devvault_types::{ItemId, TabId};

    #[test]
    fn test_recording_bus_keeps_order_per_context() {
        let bus = RecordingEventBus::new();
        bus.dispatch_workspace(WorkspaceEvent::TabPinned {
            tab_id: TabId::new("item-1"),
        });
        bus.dispatch_document(DocumentEvent::Saved {
            item_id: ItemId(1),
            trigger: SaveTrigger::Manual,
        });
        bus.dispatch_workspace(WorkspaceEvent::CloseCancelled {
            tab_id: TabId::new("item-1"),
        });

        assert_eq!(bus.events().len(), 3);
        assert_eq!(bus.workspace_events().len(), 2);
        assert_eq!(bus.document_events().len(), 1);

        let taken = bus.take();
        assert_eq!(taken.len(), 3);
        assert!(bus.events().is_empty());
    }
}
