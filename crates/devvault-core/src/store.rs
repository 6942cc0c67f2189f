// ABOUTME: Shared, injectable handle to the tab registry and close gate
// ABOUTME: Every mutation publishes workspace events after the lock is released

use std::sync::Arc;

use devvault_events::workspace::Event;
use devvault_events::{EventBus, NullEventBus};
use devvault_logging::debug;
use devvault_types::{DocId, ItemId, ItemType, Tab, TabId};
use parking_lot::RwLock;

use crate::close_gate::CloseConfirmationGate;
use crate::tab_registry::{OpenOutcome, Promotion, TabRegistry};

/// Result of asking to close a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseRequestOutcome {
    /// The tab had no unsaved changes and is gone
    Closed { tab: Tab, next_active: Option<TabId> },
    /// The tab is dirty; the host must confirm or cancel
    AwaitingConfirmation,
    /// Another tab is already waiting for confirmation
    Blocked { pending: TabId },
    NotFound,
}

/// Point-in-time copy of the workspace for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<TabId>,
    pub pending_close: Option<TabId>,
}

#[derive(Debug, Default)]
struct WorkspaceState {
    registry: TabRegistry,
    close_gate: CloseConfirmationGate,
}

impl WorkspaceState {
    fn push_activation(&self, before: Option<TabId>, events: &mut Vec<Event>) {
        let after = self.registry.active_tab_id();
        if let Some(tab_id) = after {
            if before.as_ref() != Some(tab_id) {
                events.push(Event::TabActivated {
                    previous: before,
                    tab_id: tab_id.clone(),
                });
            }
        }
    }

    fn push_open(&self, outcome: &OpenOutcome, events: &mut Vec<Event>) {
        match outcome {
            OpenOutcome::Activated {
                tab_id,
                newly_pinned: true,
            } => events.push(Event::TabPinned {
                tab_id: tab_id.clone(),
            }),
            OpenOutcome::Activated { .. } => {}
            OpenOutcome::Replaced { tab_id, previous } => {
                if let Some(tab) = self.registry.tab(tab_id) {
                    events.push(Event::TabReplaced {
                        previous: previous.id.clone(),
                        tab_id: tab_id.clone(),
                        kind: tab.kind.clone(),
                    });
                }
            }
            OpenOutcome::Appended { tab_id } => self.push_opened(tab_id, events),
        }
    }

    fn push_opened(&self, tab_id: &TabId, events: &mut Vec<Event>) {
        if let Some(tab) = self.registry.tab(tab_id) {
            events.push(Event::TabOpened {
                tab_id: tab.id.clone(),
                kind: tab.kind.clone(),
                title: tab.title.clone(),
            });
        }
    }

    fn close(&mut self, tab_id: &TabId, events: &mut Vec<Event>) -> Option<Tab> {
        let tab = self.registry.close_tab(tab_id)?;
        self.close_gate.discard(tab_id);
        events.push(Event::TabClosed {
            tab_id: tab.id.clone(),
            next_active: self.registry.active_tab_id().cloned(),
        });
        Some(tab)
    }
}

/// Cloneable handle to the workspace tab state.
///
/// Constructed explicitly and passed to every component that needs it; there
/// is no process-wide instance.
#[derive(Clone)]
pub struct WorkspaceStore {
    state: Arc<RwLock<WorkspaceState>>,
    bus: Arc<dyn EventBus>,
}

impl std::fmt::Debug for WorkspaceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceStore")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl WorkspaceStore {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            state: Arc::new(RwLock::new(WorkspaceState::default())),
            bus,
        }
    }

    /// A store whose events go nowhere
    pub fn detached() -> Self {
        Self::new(Arc::new(NullEventBus))
    }

    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// Run `f` against the registry under a read lock
    pub fn read<R>(&self, f: impl FnOnce(&TabRegistry) -> R) -> R {
        f(&self.state.read().registry)
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let state = self.state.read();
        WorkspaceSnapshot {
            tabs: state.registry.tabs().to_vec(),
            active_tab_id: state.registry.active_tab_id().cloned(),
            pending_close: state.close_gate.pending().cloned(),
        }
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.read(|r| r.tabs().to_vec())
    }

    pub fn tab(&self, tab_id: &TabId) -> Option<Tab> {
        self.read(|r| r.tab(tab_id).cloned())
    }

    pub fn contains(&self, tab_id: &TabId) -> bool {
        self.read(|r| r.contains(tab_id))
    }

    pub fn tab_for_item(&self, item_id: ItemId) -> Option<Tab> {
        self.read(|r| r.tab_for_item(item_id).cloned())
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.read(|r| r.active_tab_id().cloned())
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.read(|r| r.active_tab().cloned())
    }

    pub fn pending_close(&self) -> Option<TabId> {
        self.state.read().close_gate.pending().cloned()
    }

    pub fn open_item_tab(
        &self,
        item_id: ItemId,
        item_type: ItemType,
        title: &str,
        pin: bool,
    ) -> OpenOutcome {
        let outcome = self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let outcome = state
                .registry
                .open_item_tab(item_id, item_type, title, pin);
            state.push_open(&outcome, events);
            state.push_activation(before, events);
            outcome
        });
        debug!(item_id = %item_id, pin, tab_id = %outcome.tab_id(), "Opened item tab");
        outcome
    }

    pub fn open_doc_entry_tab(
        &self,
        doc_id: DocId,
        doc_path: &str,
        title: &str,
        pin: bool,
    ) -> OpenOutcome {
        let outcome = self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let outcome = state
                .registry
                .open_doc_entry_tab(doc_id, doc_path, title, pin);
            state.push_open(&outcome, events);
            state.push_activation(before, events);
            outcome
        });
        debug!(doc_id = %doc_id, doc_path, pin, tab_id = %outcome.tab_id(), "Opened doc entry tab");
        outcome
    }

    pub fn open_draft_item_tab(&self, item_type: ItemType) -> TabId {
        let tab_id = self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let tab_id = state.registry.open_draft_item_tab(item_type);
            state.push_opened(&tab_id, events);
            state.push_activation(before, events);
            tab_id
        });
        debug!(tab_id = %tab_id, item_type = %item_type, "Opened draft tab");
        tab_id
    }

    pub fn open_new_tab(&self) -> TabId {
        self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let tab_id = state.registry.open_new_tab();
            state.push_opened(&tab_id, events);
            state.push_activation(before, events);
            tab_id
        })
    }

    pub fn open_documentation_tab(&self) -> TabId {
        self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let existed = state
                .registry
                .tabs()
                .iter()
                .any(|t| t.kind == devvault_types::TabKind::Documentation);
            let tab_id = state.registry.open_documentation_tab();
            if !existed {
                state.push_opened(&tab_id, events);
            }
            state.push_activation(before, events);
            tab_id
        })
    }

    pub fn select_tab(&self, tab_id: &TabId) -> bool {
        self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let selected = state.registry.select_tab(tab_id);
            state.push_activation(before, events);
            selected
        })
    }

    pub fn pin_tab(&self, tab_id: &TabId) -> bool {
        self.update(|state, events| {
            let pinned = state.registry.pin_tab(tab_id);
            if pinned {
                events.push(Event::TabPinned {
                    tab_id: tab_id.clone(),
                });
            }
            pinned
        })
    }

    /// Close a tab unconditionally
    pub fn close_tab(&self, tab_id: &TabId) -> Option<Tab> {
        let closed = self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let closed = state.close(tab_id, events);
            state.push_activation(before, events);
            closed
        });
        if closed.is_some() {
            debug!(tab_id = %tab_id, "Closed tab");
        }
        closed
    }

    /// Close a clean tab, or park a dirty one behind the confirmation gate
    pub fn request_close_tab(&self, tab_id: &TabId) -> CloseRequestOutcome {
        let outcome = self.update(|state, events| {
            let Some(is_dirty) = state.registry.tab(tab_id).map(|t| t.is_dirty) else {
                return CloseRequestOutcome::NotFound;
            };

            if is_dirty {
                let already_pending = state.close_gate.pending() == Some(tab_id);
                return match state.close_gate.request(tab_id.clone()) {
                    Ok(()) => {
                        if !already_pending {
                            events.push(Event::CloseConfirmationRequested {
                                tab_id: tab_id.clone(),
                            });
                        }
                        CloseRequestOutcome::AwaitingConfirmation
                    }
                    Err(pending) => CloseRequestOutcome::Blocked { pending },
                };
            }

            let before = state.registry.active_tab_id().cloned();
            match state.close(tab_id, events) {
                Some(tab) => {
                    state.push_activation(before, events);
                    CloseRequestOutcome::Closed {
                        tab,
                        next_active: state.registry.active_tab_id().cloned(),
                    }
                }
                None => CloseRequestOutcome::NotFound,
            }
        });
        debug!(tab_id = %tab_id, outcome = ?outcome, "Close requested");
        outcome
    }

    /// Close the tab waiting for confirmation. A no-op when it is already gone.
    pub fn confirm_close_tab(&self) -> Option<Tab> {
        self.update(|state, events| {
            let tab_id = state.close_gate.take()?;
            let before = state.registry.active_tab_id().cloned();
            let closed = state.close(&tab_id, events);
            state.push_activation(before, events);
            closed
        })
    }

    /// Abandon the pending close, leaving the tab and its dirty flag alone
    pub fn cancel_close_tab(&self) -> Option<TabId> {
        self.update(|state, events| {
            let tab_id = state.close_gate.take()?;
            events.push(Event::CloseCancelled {
                tab_id: tab_id.clone(),
            });
            Some(tab_id)
        })
    }

    pub fn update_tab_title(&self, item_id: ItemId, title: &str) -> bool {
        self.update(|state, events| {
            let changed = state.registry.update_tab_title(item_id, title);
            if changed {
                if let Some(tab) = state.registry.tab_for_item(item_id) {
                    events.push(Event::TabTitleChanged {
                        tab_id: tab.id.clone(),
                        title: title.to_string(),
                    });
                }
            }
            changed
        })
    }

    pub fn update_tab_title_by_id(&self, tab_id: &TabId, title: &str) -> bool {
        self.update(|state, events| {
            let changed = state.registry.update_tab_title_by_id(tab_id, title);
            if changed {
                events.push(Event::TabTitleChanged {
                    tab_id: tab_id.clone(),
                    title: title.to_string(),
                });
            }
            changed
        })
    }

    pub fn promote_draft_tab(
        &self,
        draft_tab_id: &TabId,
        item_id: ItemId,
        item_type: ItemType,
        title: &str,
    ) -> Option<Promotion> {
        let promotion = self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let promotion = state
                .registry
                .promote_draft_tab(draft_tab_id, item_id, item_type, title)?;

            if let Some(displaced) = &promotion.displaced {
                state.close_gate.discard(&displaced.id);
                events.push(Event::TabClosed {
                    tab_id: displaced.id.clone(),
                    next_active: Some(promotion.tab_id.clone()),
                });
            }
            events.push(Event::TabPromoted {
                draft_tab_id: draft_tab_id.clone(),
                tab_id: promotion.tab_id.clone(),
                item_id,
            });
            state.close_gate.discard(draft_tab_id);
            if before.as_ref() != Some(draft_tab_id) {
                state.push_activation(before, events);
            }
            Some(promotion)
        })?;

        debug!(
            draft_tab_id = %draft_tab_id,
            tab_id = %promotion.tab_id,
            item_id = %item_id,
            "Promoted draft tab"
        );
        Some(promotion)
    }

    pub fn set_tab_dirty(&self, tab_id: &TabId, is_dirty: bool) -> bool {
        self.update(|state, events| {
            let changed = state.registry.set_tab_dirty(tab_id, is_dirty);
            if changed {
                events.push(Event::TabDirtyChanged {
                    tab_id: tab_id.clone(),
                    is_dirty,
                });
            }
            changed
        })
    }

    /// Activate the tab right of the active one, wrapping around
    pub fn next_tab(&self) -> Option<TabId> {
        self.cycle(TabRegistry::next_tab)
    }

    /// Activate the tab left of the active one, wrapping around
    pub fn prev_tab(&self) -> Option<TabId> {
        self.cycle(TabRegistry::prev_tab)
    }

    fn cycle(&self, pick: fn(&TabRegistry) -> Option<TabId>) -> Option<TabId> {
        self.update(|state, events| {
            let before = state.registry.active_tab_id().cloned();
            let target = pick(&state.registry)?;
            state.registry.select_tab(&target);
            state.push_activation(before, events);
            Some(target)
        })
    }

    /// Mutate under the write lock, then publish what happened
    fn update<R>(&self, f: impl FnOnce(&mut WorkspaceState, &mut Vec<Event>) -> R) -> R {
        let mut events = Vec::new();
        let result = {
            let mut state = self.state.write();
            f(&mut state, &mut events)
        };
        for event in events {
            self.bus.dispatch_workspace(event);
        }
        result
    }
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::detached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devvault_events::RecordingEventBus;
    use devvault_types::TabKind;

    fn recorded_store() -> (WorkspaceStore, Arc<RecordingEventBus>) {
        let bus = Arc::new(RecordingEventBus::new());
        (WorkspaceStore::new(bus.clone()), bus)
    }

    #[test]
    fn test_open_events_in_order() {
        let (store, bus) = recorded_store();
        store.open_item_tab(ItemId(1), ItemType::Note, "One", false);
        store.open_item_tab(ItemId(2), ItemType::Note, "Two", false);

        let events = bus.workspace_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], Event::TabOpened { title, .. } if title == "One"));
        assert!(matches!(&events[1], Event::TabActivated { previous: None, .. }));
        assert!(matches!(
            &events[2],
            Event::TabReplaced { previous, tab_id, .. }
                if previous.as_str() == "item-1" && tab_id.as_str() == "item-2"
        ));
        assert!(matches!(&events[3], Event::TabActivated { previous: Some(p), .. } if p.as_str() == "item-1"));
    }

    #[test]
    fn test_clean_close_request_closes() {
        let (store, _bus) = recorded_store();
        let a = store.open_new_tab();
        let b = store.open_new_tab();

        let outcome = store.request_close_tab(&b);
        assert!(matches!(
            outcome,
            CloseRequestOutcome::Closed { next_active: Some(ref next), .. } if *next == a
        ));
        assert_eq!(store.request_close_tab(&b), CloseRequestOutcome::NotFound);
    }

    #[test]
    fn test_dirty_close_waits_then_cancel_keeps_tab() {
        let (store, bus) = recorded_store();
        let tab = store
            .open_item_tab(ItemId(3), ItemType::Snippet, "Three", true)
            .tab_id()
            .clone();
        store.set_tab_dirty(&tab, true);

        assert_eq!(
            store.request_close_tab(&tab),
            CloseRequestOutcome::AwaitingConfirmation
        );
        assert_eq!(store.pending_close(), Some(tab.clone()));

        assert_eq!(store.cancel_close_tab(), Some(tab.clone()));
        assert_eq!(store.pending_close(), None);
        assert!(store.tab(&tab).is_some_and(|t| t.is_dirty));
        assert!(
            bus.workspace_events()
                .iter()
                .any(|e| matches!(e, Event::CloseCancelled { .. }))
        );
    }

    #[test]
    fn test_dirty_close_confirm_closes() {
        let (store, _bus) = recorded_store();
        let keep = store.open_new_tab();
        let tab = store
            .open_item_tab(ItemId(3), ItemType::Snippet, "Three", true)
            .tab_id()
            .clone();
        store.set_tab_dirty(&tab, true);
        store.request_close_tab(&tab);

        let closed = store.confirm_close_tab().unwrap();
        assert_eq!(closed.id, tab);
        assert_eq!(store.active_tab_id(), Some(keep));
        assert_eq!(store.pending_close(), None);
    }

    #[test]
    fn test_second_dirty_close_is_blocked() {
        let (store, _bus) = recorded_store();
        let a = store
            .open_item_tab(ItemId(1), ItemType::Note, "A", true)
            .tab_id()
            .clone();
        let b = store
            .open_item_tab(ItemId(2), ItemType::Note, "B", true)
            .tab_id()
            .clone();
        store.set_tab_dirty(&a, true);
        store.set_tab_dirty(&b, true);

        store.request_close_tab(&a);
        assert_eq!(
            store.request_close_tab(&b),
            CloseRequestOutcome::Blocked { pending: a.clone() }
        );
        assert_eq!(store.pending_close(), Some(a));
    }

    #[test]
    fn test_confirm_after_tab_vanished_is_noop() {
        let (store, _bus) = recorded_store();
        let other = store.open_new_tab();
        let tab = store
            .open_item_tab(ItemId(1), ItemType::Note, "A", true)
            .tab_id()
            .clone();
        store.set_tab_dirty(&tab, true);
        store.request_close_tab(&tab);

        store.close_tab(&tab);
        assert_eq!(store.pending_close(), None);
        assert_eq!(store.confirm_close_tab(), None);
        assert_eq!(store.tabs().len(), 1);
        assert_eq!(store.active_tab_id(), Some(other));
    }

    #[test]
    fn test_promotion_publishes_event() {
        let (store, bus) = recorded_store();
        let draft = store.open_draft_item_tab(ItemType::Link);
        bus.take();

        let promotion = store
            .promote_draft_tab(&draft, ItemId(8), ItemType::Link, "Rust book")
            .unwrap();

        assert_eq!(promotion.tab_id.as_str(), "item-8");
        assert_eq!(
            bus.workspace_events(),
            vec![Event::TabPromoted {
                draft_tab_id: draft,
                tab_id: promotion.tab_id.clone(),
                item_id: ItemId(8),
            }]
        );
        assert_eq!(
            store.tab(&promotion.tab_id).map(|t| t.kind),
            Some(TabKind::Item {
                item_id: ItemId(8),
                item_type: ItemType::Link
            })
        );
    }

    #[test]
    fn test_unchanged_updates_publish_nothing() {
        let (store, bus) = recorded_store();
        let tab = store.open_new_tab();
        bus.take();

        assert!(!store.set_tab_dirty(&tab, false));
        assert!(!store.pin_tab(&tab));
        assert!(!store.select_tab(&TabId::new("missing")));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_cycling_activates_neighbours() {
        let store = WorkspaceStore::detached();
        let a = store.open_new_tab();
        let b = store.open_new_tab();

        assert_eq!(store.next_tab(), Some(a.clone()));
        assert_eq!(store.active_tab_id(), Some(a));
        assert_eq!(store.prev_tab(), Some(b.clone()));
        assert_eq!(store.active_tab_id(), Some(b));
    }

    #[test]
    fn test_clones_share_state() {
        let store = WorkspaceStore::detached();
        let other = store.clone();
        store.open_documentation_tab();
        other.open_documentation_tab();

        assert_eq!(store.tabs().len(), 1);
        assert_eq!(
            store.snapshot().active_tab_id,
            other.snapshot().active_tab_id
        );
    }
}
