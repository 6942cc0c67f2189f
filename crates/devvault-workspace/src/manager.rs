// ABOUTME: Workspace manager mounting one item editor per editable tab
// ABOUTME: Routes tab operations to the store and unmounts editors whose tabs go away

use std::sync::Arc;

use devvault_core::{CloseRequestOutcome, OpenOutcome, WorkspaceSnapshot, WorkspaceStore};
use devvault_editor::{EditorContext, EditorError, ItemEditor, ItemRepository, SaveOutcome};
use devvault_events::EventBus;
use devvault_logging::{debug, info, warn};
use devvault_types::{DocEntry, DocId, Item, ItemId, ItemType, KeyChord, Tab, TabId};

use crate::config::Config;
use crate::doc_cache::{DocCacheConfig, DocEntryCache};

/// Coordinates the tab store, the mounted editors and the doc-entry cache.
///
/// Opening an item tab mounts an editor for it and starts loading the item in
/// the background, so the manager must be used from inside a tokio runtime.
pub struct WorkspaceManager {
    store: WorkspaceStore,
    context: EditorContext,
    editors: Vec<ItemEditor>,
    doc_cache: DocEntryCache,
}

impl std::fmt::Debug for WorkspaceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceManager")
            .field("store", &self.store)
            .field("editors", &self.editors.len())
            .field("doc_cache", &self.doc_cache.len())
            .finish()
    }
}

impl WorkspaceManager {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        event_bus: Arc<dyn EventBus>,
        config: Config,
    ) -> Self {
        Self::with_store(WorkspaceStore::new(event_bus), repository, config)
    }

    /// Manage an existing store, e.g. one shared with the view layer
    pub fn with_store(
        store: WorkspaceStore,
        repository: Arc<dyn ItemRepository>,
        config: Config,
    ) -> Self {
        info!(
            autosave_enabled = config.editor.autosave_enabled,
            autosave_delay_ms = config.editor.autosave_delay_ms,
            "Creating workspace manager"
        );
        Self {
            context: EditorContext::new(repository, store.clone(), config.editor),
            doc_cache: DocEntryCache::with_config(DocCacheConfig::from(&config.workspace)),
            store,
            editors: Vec::new(),
        }
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.store.snapshot()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.store.tabs()
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.store.active_tab_id()
    }

    pub fn autosave_enabled(&self) -> bool {
        self.context.config.autosave_enabled
    }

    /// Open a persisted item and load it in the background
    pub fn open_item(
        &mut self,
        item_id: ItemId,
        item_type: ItemType,
        title: &str,
        pin: bool,
    ) -> TabId {
        self.prune_editors();
        let outcome = self.store.open_item_tab(item_id, item_type, title, pin);
        self.unmount_replaced(&outcome);

        let tab_id = outcome.tab_id().clone();
        if self.can_mount(&tab_id, item_id) {
            let editor = ItemEditor::for_item(&self.context, tab_id.clone(), item_id);
            editor.spawn_load();
            self.editors.push(editor);
        }
        tab_id
    }

    /// Open an item whose content the caller already has
    pub fn open_item_with(&mut self, item: &Item, pin: bool) -> TabId {
        self.prune_editors();
        let outcome = self
            .store
            .open_item_tab(item.id, item.item_type, &item.title, pin);
        self.unmount_replaced(&outcome);

        let tab_id = outcome.tab_id().clone();
        if self.can_mount(&tab_id, item.id) {
            self.editors
                .push(ItemEditor::with_item(&self.context, tab_id.clone(), item));
        }
        tab_id
    }

    pub fn open_draft(&mut self, item_type: ItemType) -> TabId {
        self.prune_editors();
        let tab_id = self.store.open_draft_item_tab(item_type);
        self.editors
            .push(ItemEditor::for_draft(&self.context, tab_id.clone(), item_type));
        tab_id
    }

    pub fn open_new_tab(&mut self) -> TabId {
        self.prune_editors();
        self.store.open_new_tab()
    }

    pub fn open_documentation(&mut self) -> TabId {
        self.prune_editors();
        self.store.open_documentation_tab()
    }

    /// Open a documentation page and remember its content
    pub fn open_doc_entry(&mut self, entry: &DocEntry, pin: bool) -> TabId {
        self.prune_editors();
        self.doc_cache.insert(entry.clone());
        self.store
            .open_doc_entry_tab(entry.doc_id, &entry.path, &entry.title, pin)
            .tab_id()
            .clone()
    }

    /// Cached content of a documentation page, if still fresh
    pub fn doc_entry(&mut self, doc_id: DocId, path: &str) -> Option<DocEntry> {
        self.doc_cache.get(doc_id, path)
    }

    pub fn doc_cache(&self) -> &DocEntryCache {
        &self.doc_cache
    }

    pub fn doc_cache_mut(&mut self) -> &mut DocEntryCache {
        &mut self.doc_cache
    }

    pub fn select_tab(&mut self, tab_id: &TabId) -> bool {
        self.store.select_tab(tab_id)
    }

    pub fn next_tab(&mut self) -> Option<TabId> {
        self.store.next_tab()
    }

    pub fn prev_tab(&mut self) -> Option<TabId> {
        self.store.prev_tab()
    }

    /// Close a tab, asking for confirmation first when it has unsaved changes
    pub fn request_close(&mut self, tab_id: &TabId) -> CloseRequestOutcome {
        let outcome = self.store.request_close_tab(tab_id);
        if let CloseRequestOutcome::Closed { tab, .. } = &outcome {
            self.unmount(&tab.id);
        }
        outcome
    }

    /// Close the tab awaiting confirmation, discarding its unsaved changes
    pub fn confirm_close(&mut self) -> Option<Tab> {
        let tab = self.store.confirm_close_tab()?;
        self.unmount(&tab.id);
        Some(tab)
    }

    pub fn cancel_close(&mut self) -> Option<TabId> {
        self.store.cancel_close_tab()
    }

    /// Close without confirmation
    pub fn close_tab(&mut self, tab_id: &TabId) -> Option<Tab> {
        let tab = self.store.close_tab(tab_id)?;
        self.unmount(&tab.id);
        Some(tab)
    }

    pub fn editor(&self, tab_id: &TabId) -> Option<&ItemEditor> {
        self.mounted().find(|editor| &editor.tab_id() == tab_id)
    }

    pub fn editor_mut(&mut self, tab_id: &TabId) -> Option<&mut ItemEditor> {
        self.editors
            .iter_mut()
            .filter(|editor| !editor.is_unmounted())
            .find(|editor| &editor.tab_id() == tab_id)
    }

    pub fn editor_for_item(&self, item_id: ItemId) -> Option<&ItemEditor> {
        self.mounted().find(|editor| editor.item_id() == Some(item_id))
    }

    pub fn active_editor(&self) -> Option<&ItemEditor> {
        let tab_id = self.store.active_tab_id()?;
        self.editor(&tab_id)
    }

    pub fn active_editor_mut(&mut self) -> Option<&mut ItemEditor> {
        let tab_id = self.store.active_tab_id()?;
        self.editor_mut(&tab_id)
    }

    pub fn editor_count(&self) -> usize {
        self.mounted().count()
    }

    /// Save the active tab's editor. `None` when the active tab has no editor.
    pub async fn save_active(&self) -> Option<Result<SaveOutcome, EditorError>> {
        let editor = self.active_editor()?;
        Some(editor.save().await)
    }

    /// Handle a key chord from the view layer.
    ///
    /// Only the save chord is handled, and only while autosave is off.
    /// Returns `None` when the chord was not handled.
    pub async fn handle_key(&self, chord: &KeyChord) -> Option<Result<SaveOutcome, EditorError>> {
        if !chord.is_save() || self.autosave_enabled() {
            return None;
        }
        debug!(key = %chord.key, "Save shortcut");
        self.save_active().await
    }

    /// Switch every mounted editor, and editors mounted later, between autosave and manual save
    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        if self.context.config.autosave_enabled == enabled {
            return;
        }
        info!(enabled, "Switching autosave");
        self.context.config.autosave_enabled = enabled;
        for editor in &mut self.editors {
            editor.set_autosave_enabled(enabled);
        }
    }

    /// Drop editors whose tabs no longer exist, and editors a draft promotion unmounted
    pub fn prune_editors(&mut self) {
        let store = &self.store;
        self.editors.retain(|editor| {
            // A draft being promoted briefly carries its new tab id before the store does
            let keep = !editor.is_unmounted()
                && (editor.is_creating() || store.contains(&editor.tab_id()));
            if !keep {
                debug!(tab_id = %editor.tab_id(), "Dropping editor of a closed tab");
            }
            keep
        });
    }

    fn mounted(&self) -> impl Iterator<Item = &ItemEditor> {
        self.editors.iter().filter(|editor| !editor.is_unmounted())
    }

    fn can_mount(&self, tab_id: &TabId, item_id: ItemId) -> bool {
        if self.editor(tab_id).is_some() {
            return false;
        }
        if let Some(existing) = self.editor_for_item(item_id) {
            warn!(
                item_id = %item_id,
                tab_id = %tab_id,
                existing_tab_id = %existing.tab_id(),
                "Item already has an editor, not mounting a second"
            );
            return false;
        }
        true
    }

    fn unmount_replaced(&mut self, outcome: &OpenOutcome) {
        if let Some(previous) = outcome.replaced() {
            self.unmount(&previous.id);
        }
    }

    fn unmount(&mut self, tab_id: &TabId) {
        self.editors.retain_mut(|editor| {
            if &editor.tab_id() != tab_id {
                return true;
            }
            editor.unmount();
            debug!(tab_id = %tab_id, "Unmounted editor");
            false
        });
    }
}
