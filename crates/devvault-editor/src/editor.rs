// ABOUTME: Item editor bound to one tab, owning its draft buffer and autosave timer
// ABOUTME: Loads items, debounces writes, materializes drafts and promotes their tabs

use std::sync::{Arc, Weak};

use devvault_core::WorkspaceStore;
use devvault_events::document::{Event as DocumentEvent, SaveTrigger};
use devvault_logging::{DEFAULT_SLOW_THRESHOLD, debug, error, info, time_async, warn};
use devvault_types::{
    EditorConfig, Item, ItemId, ItemType, TabId, UpdateItemRequest, draft_placeholder_title,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::debouncer::{DebounceConfig, Debouncer};
use crate::draft_buffer::{DraftBuffer, DraftFields};
use crate::error::{EditorError, ValidationError};
use crate::repository::ItemRepository;

/// What the editor's buffer is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Item(ItemId),
    /// Content that has not been created yet
    Draft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The item behind the tab no longer exists
    NotFound,
    Failed(String),
}

/// Result of an explicit save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing differed from storage
    Unchanged,
    Saved(Item),
    /// A draft was created and its tab promoted
    Created(Item),
}

/// Everything an editor needs from its surroundings
#[derive(Clone)]
pub struct EditorContext {
    pub repository: Arc<dyn ItemRepository>,
    pub store: WorkspaceStore,
    pub config: EditorConfig,
    mounted: MountedEditors,
}

impl EditorContext {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        store: WorkspaceStore,
        config: EditorConfig,
    ) -> Self {
        Self {
            repository,
            store,
            config,
            mounted: MountedEditors::default(),
        }
    }
}

/// Editors mounted from one context, so a promotion can unmount the editor of a tab it displaces
#[derive(Clone, Default)]
struct MountedEditors(Arc<Mutex<Vec<Weak<EditorShared>>>>);

impl MountedEditors {
    fn register(&self, shared: &Arc<EditorShared>) {
        let mut editors = self.0.lock();
        editors.retain(|editor| editor.strong_count() > 0);
        editors.push(Arc::downgrade(shared));
    }

    /// Unmount every editor other than `except` that shows `tab_id`
    fn unmount_tab(&self, tab_id: &TabId, except: &EditorShared) -> usize {
        let editors: Vec<Arc<EditorShared>> =
            self.0.lock().iter().filter_map(Weak::upgrade).collect();

        let mut unmounted = 0;
        for editor in editors {
            if std::ptr::eq(Arc::as_ptr(&editor), except) {
                continue;
            }
            let mut state = editor.state.lock();
            if state.tab_id == *tab_id && !state.cancelled {
                state.cancelled = true;
                unmounted += 1;
            }
        }
        unmounted
    }
}

enum FollowUp {
    Nothing,
    Autosave,
    CreateDraft,
}

/// Tab updates owed after a buffer change, applied once the state lock is released
struct Settled {
    tab_id: TabId,
    draft_title: Option<String>,
    is_dirty: bool,
    follow_up: FollowUp,
}

#[derive(Debug)]
struct EditorState {
    tab_id: TabId,
    binding: Binding,
    load_state: LoadState,
    buffer: DraftBuffer,
    read_only: bool,
    autosave_enabled: bool,
    is_creating: bool,
    has_pending_changes: bool,
    cancelled: bool,
}

impl EditorState {
    fn check_editable(&self) -> Result<(), EditorError> {
        if self.cancelled {
            Err(EditorError::Unmounted)
        } else if self.read_only {
            Err(EditorError::ReadOnly)
        } else if self.load_state != LoadState::Ready {
            Err(EditorError::NotLoaded)
        } else {
            Ok(())
        }
    }

    fn is_dirty(&self) -> bool {
        !self.autosave_enabled && self.buffer.has_changes()
    }

    /// Work out what the tab bar and storage owe the current buffer
    fn settle(&mut self) -> Settled {
        let has_changes = self.buffer.has_changes();

        let draft_title = match self.binding {
            Binding::Draft => {
                let fields = self.buffer.fields();
                let title = fields.title.trim();
                Some(if title.is_empty() {
                    draft_placeholder_title(fields.item_type)
                } else {
                    title.to_string()
                })
            }
            Binding::Item(_) => None,
        };

        let follow_up = if !self.autosave_enabled {
            FollowUp::Nothing
        } else {
            match self.binding {
                Binding::Item(_) if has_changes => FollowUp::Autosave,
                Binding::Item(_) => FollowUp::Nothing,
                Binding::Draft if self.is_creating => {
                    self.has_pending_changes = true;
                    FollowUp::Nothing
                }
                Binding::Draft if self.buffer.can_save() => {
                    self.is_creating = true;
                    FollowUp::CreateDraft
                }
                Binding::Draft => FollowUp::Nothing,
            }
        };

        Settled {
            tab_id: self.tab_id.clone(),
            draft_title,
            is_dirty: self.is_dirty(),
            follow_up,
        }
    }
}

struct EditorShared {
    state: Mutex<EditorState>,
    /// Serializes repository writes of this editor
    write_lock: tokio::sync::Mutex<()>,
    repository: Arc<dyn ItemRepository>,
    store: WorkspaceStore,
    mounted: MountedEditors,
}

impl EditorShared {
    fn publish(&self, event: DocumentEvent) {
        self.store.event_bus().dispatch_document(event);
    }

    async fn load(&self) {
        let target = {
            let state = self.state.lock();
            match state.binding {
                Binding::Item(item_id) if !state.cancelled => Some((state.tab_id.clone(), item_id)),
                _ => None,
            }
        };
        let Some((tab_id, item_id)) = target else {
            return;
        };

        let result = time_async(
            "repository.get_item",
            DEFAULT_SLOW_THRESHOLD,
            self.repository.get_item(item_id),
        )
        .await;

        let loaded = {
            let mut state = self.state.lock();
            if state.cancelled || state.binding != Binding::Item(item_id) {
                debug!(tab_id = %tab_id, item_id = %item_id, "Discarding stale item load");
                return;
            }
            match result {
                Ok(Some(item)) => {
                    state.buffer = DraftBuffer::for_item(&item);
                    state.read_only = item.item_type.is_read_only();
                    state.load_state = LoadState::Ready;
                    Ok(Some(item))
                }
                Ok(None) => {
                    state.load_state = LoadState::NotFound;
                    Ok(None)
                }
                Err(err) => {
                    state.load_state = LoadState::Failed(err.to_string());
                    Err(err)
                }
            }
        };

        match loaded {
            Ok(Some(item)) => {
                self.store.update_tab_title(item_id, &item.title);
                debug!(tab_id = %tab_id, item_id = %item_id, read_only = item.item_type.is_read_only(), "Item loaded");
                self.publish(DocumentEvent::Loaded { tab_id, item_id });
            }
            Ok(None) => {
                warn!(tab_id = %tab_id, item_id = %item_id, "Item no longer exists");
                self.publish(DocumentEvent::NotFound { tab_id, item_id });
            }
            Err(err) => {
                error!(tab_id = %tab_id, item_id = %item_id, error = %err, "Failed to load item");
            }
        }
    }

    /// Debounced write of whatever the buffer holds when the timer fires
    async fn autosave(&self) {
        let _write = self.write_lock.lock().await;

        let pending = {
            let state = self.state.lock();
            match state.binding {
                // A timer that fired while an earlier write held the lock
                Binding::Item(_) if state.cancelled => {
                    debug!(tab_id = %state.tab_id, "Skipping autosave of an unmounted editor");
                    None
                }
                Binding::Item(item_id)
                    if state.autosave_enabled
                        && !state.read_only
                        && state.buffer.has_changes()
                        && state.buffer.can_save() =>
                {
                    let sent = state.buffer.fields().normalized();
                    let request = sent.to_update_request(item_id, state.buffer.last_saved());
                    Some((item_id, request, sent))
                }
                _ => None,
            }
        };

        if let Some((item_id, request, sent)) = pending {
            // Failures are logged and published by `write`
            let _ = self.write(item_id, request, sent, SaveTrigger::Autosave).await;
        }
    }

    /// Send an update. Callers hold `write_lock`.
    async fn write(
        &self,
        item_id: ItemId,
        request: UpdateItemRequest,
        sent: DraftFields,
        trigger: SaveTrigger,
    ) -> Result<Item, EditorError> {
        let result = time_async(
            "repository.update_item",
            DEFAULT_SLOW_THRESHOLD,
            self.repository.update_item(request),
        )
        .await;

        match result {
            Ok(item) => {
                let (tab_id, is_dirty) = {
                    let mut state = self.state.lock();
                    if state.binding == Binding::Item(item_id) {
                        state.buffer.mark_saved(&sent);
                    }
                    (state.tab_id.clone(), state.is_dirty())
                };
                self.store.update_tab_title(item_id, &sent.title);
                self.store.set_tab_dirty(&tab_id, is_dirty);
                debug!(item_id = %item_id, trigger = ?trigger, "Item saved");
                self.publish(DocumentEvent::Saved { item_id, trigger });
                Ok(item)
            }
            Err(err) => {
                let tab_id = self.state.lock().tab_id.clone();
                error!(item_id = %item_id, trigger = ?trigger, error = %err, "Failed to save item");
                self.publish(DocumentEvent::SaveFailed {
                    tab_id,
                    item_id: Some(item_id),
                    trigger,
                    error: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Create the item behind a draft and promote its tab.
    ///
    /// The caller has already set `is_creating`; it is cleared on every path.
    async fn materialize(&self, trigger: SaveTrigger) -> Result<Item, EditorError> {
        let _write = self.write_lock.lock().await;

        let prepared = {
            let mut state = self.state.lock();
            if state.cancelled {
                state.is_creating = false;
                Err(EditorError::Unmounted)
            } else if let Err(err) = state.buffer.validate() {
                state.is_creating = false;
                Err(EditorError::from(err))
            } else {
                Ok((state.tab_id.clone(), state.buffer.fields().normalized()))
            }
        };
        let (draft_tab_id, sent) = prepared?;

        debug!(tab_id = %draft_tab_id, trigger = ?trigger, "Creating item from draft");
        let result = time_async(
            "repository.create_item",
            DEFAULT_SLOW_THRESHOLD,
            self.repository.create_item(sent.to_create_request()),
        )
        .await;

        let item = match result {
            Ok(item) => item,
            Err(err) => {
                {
                    let mut state = self.state.lock();
                    state.is_creating = false;
                    state.has_pending_changes = false;
                }
                error!(tab_id = %draft_tab_id, error = %err, "Failed to create item from draft");
                self.publish(DocumentEvent::SaveFailed {
                    tab_id: draft_tab_id,
                    item_id: None,
                    trigger,
                    error: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let bound = {
            let mut state = self.state.lock();
            if state.cancelled {
                state.is_creating = false;
                false
            } else {
                state.binding = Binding::Item(item.id);
                state.tab_id = TabId::for_item(item.id);
                state.buffer.mark_saved(&sent);
                true
            }
        };

        self.publish(DocumentEvent::Created {
            draft_tab_id: draft_tab_id.clone(),
            item_id: item.id,
        });
        if !bound {
            info!(item_id = %item.id, "Draft created after its editor was unmounted");
            return Ok(item);
        }

        let promotion = self.store.promote_draft_tab(
            &draft_tab_id,
            item.id,
            item.item_type,
            &sent.title,
        );
        info!(item_id = %item.id, draft_tab_id = %draft_tab_id, "Draft promoted to item");

        if let Some(displaced) = promotion.and_then(|promotion| promotion.displaced) {
            let unmounted = self.mounted.unmount_tab(&displaced.id, self);
            debug!(tab_id = %displaced.id, unmounted, "Unmounted editors of a displaced tab");
        }

        let follow_up = {
            let mut state = self.state.lock();
            let pending = std::mem::take(&mut state.has_pending_changes);
            if pending
                && !state.cancelled
                && state.autosave_enabled
                && state.buffer.has_changes()
                && state.buffer.can_save()
            {
                let fields = state.buffer.fields().normalized();
                let request = fields.to_update_request(item.id, state.buffer.last_saved());
                Some((request, fields))
            } else {
                None
            }
        };
        if let Some((request, fields)) = follow_up {
            let _ = self
                .write(item.id, request, fields, SaveTrigger::DraftSync)
                .await;
        }

        let (tab_id, is_dirty) = {
            let mut state = self.state.lock();
            state.is_creating = false;
            (state.tab_id.clone(), state.is_dirty())
        };
        self.store.set_tab_dirty(&tab_id, is_dirty);

        Ok(item)
    }

    async fn save(&self) -> Result<SaveOutcome, EditorError> {
        let binding = {
            let mut state = self.state.lock();
            state.check_editable()?;
            state.buffer.validate()?;
            if state.binding == Binding::Draft {
                if state.is_creating {
                    return Err(EditorError::CreateInProgress);
                }
                state.is_creating = true;
            }
            state.binding
        };

        let item_id = match binding {
            Binding::Draft => {
                return self
                    .materialize(SaveTrigger::Manual)
                    .await
                    .map(SaveOutcome::Created);
            }
            Binding::Item(item_id) => item_id,
        };

        let _write = self.write_lock.lock().await;
        let pending = {
            let state = self.state.lock();
            if state.cancelled {
                return Err(EditorError::Unmounted);
            }
            state.buffer.has_changes().then(|| {
                let sent = state.buffer.fields().normalized();
                let request = sent.to_update_request(item_id, state.buffer.last_saved());
                (request, sent)
            })
        };

        match pending {
            Some((request, sent)) => self
                .write(item_id, request, sent, SaveTrigger::Manual)
                .await
                .map(SaveOutcome::Saved),
            None => Ok(SaveOutcome::Unchanged),
        }
    }
}

/// Editor mounted for one tab.
///
/// Edits go through the setters; each one pins the tab, keeps the tab title
/// and dirty flag in step with the buffer, and in autosave mode (re)arms the
/// idle timer or starts creating a draft. Dropping the editor unmounts it.
pub struct ItemEditor {
    shared: Arc<EditorShared>,
    debouncer: Debouncer,
}

impl std::fmt::Debug for ItemEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemEditor")
            .field("state", &*self.shared.state.lock())
            .field("autosave_pending", &self.debouncer.is_pending())
            .finish()
    }
}

impl ItemEditor {
    /// Editor for a persisted item whose content still has to be loaded
    pub fn for_item(context: &EditorContext, tab_id: TabId, item_id: ItemId) -> Self {
        Self::mount(
            context,
            tab_id,
            Binding::Item(item_id),
            LoadState::Loading,
            DraftBuffer::for_draft(ItemType::default()),
            false,
        )
    }

    /// Editor for an item the caller already holds
    pub fn with_item(context: &EditorContext, tab_id: TabId, item: &Item) -> Self {
        Self::mount(
            context,
            tab_id,
            Binding::Item(item.id),
            LoadState::Ready,
            DraftBuffer::for_item(item),
            item.item_type.is_read_only(),
        )
    }

    pub fn for_draft(context: &EditorContext, tab_id: TabId, item_type: ItemType) -> Self {
        Self::mount(
            context,
            tab_id,
            Binding::Draft,
            LoadState::Ready,
            DraftBuffer::for_draft(item_type),
            false,
        )
    }

    fn mount(
        context: &EditorContext,
        tab_id: TabId,
        binding: Binding,
        load_state: LoadState,
        buffer: DraftBuffer,
        read_only: bool,
    ) -> Self {
        debug!(tab_id = %tab_id, binding = ?binding, "Mounting item editor");
        let state = EditorState {
            tab_id,
            binding,
            load_state,
            buffer,
            read_only,
            autosave_enabled: context.config.autosave_enabled,
            is_creating: false,
            has_pending_changes: false,
            cancelled: false,
        };

        let shared = Arc::new(EditorShared {
            state: Mutex::new(state),
            write_lock: tokio::sync::Mutex::new(()),
            repository: Arc::clone(&context.repository),
            store: context.store.clone(),
            mounted: context.mounted.clone(),
        });
        context.mounted.register(&shared);

        Self {
            shared,
            debouncer: Debouncer::with_config(DebounceConfig::with_delay(
                context.config.autosave_delay(),
            )),
        }
    }

    /// Fetch the bound item; results arriving after unmount are dropped
    pub async fn load(&self) {
        self.shared.load().await;
    }

    pub fn spawn_load(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.load().await })
    }

    pub fn tab_id(&self) -> TabId {
        self.shared.state.lock().tab_id.clone()
    }

    pub fn binding(&self) -> Binding {
        self.shared.state.lock().binding
    }

    pub fn item_id(&self) -> Option<ItemId> {
        match self.binding() {
            Binding::Item(item_id) => Some(item_id),
            Binding::Draft => None,
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.shared.state.lock().load_state.clone()
    }

    pub fn fields(&self) -> DraftFields {
        self.shared.state.lock().buffer.fields().clone()
    }

    pub fn last_saved(&self) -> DraftFields {
        self.shared.state.lock().buffer.last_saved().clone()
    }

    pub fn title_error(&self) -> Option<ValidationError> {
        self.shared.state.lock().buffer.title_error().cloned()
    }

    pub fn has_changes(&self) -> bool {
        self.shared.state.lock().buffer.has_changes()
    }

    pub fn is_creating(&self) -> bool {
        self.shared.state.lock().is_creating
    }

    pub fn is_read_only(&self) -> bool {
        self.shared.state.lock().read_only
    }

    pub fn autosave_enabled(&self) -> bool {
        self.shared.state.lock().autosave_enabled
    }

    pub fn is_unmounted(&self) -> bool {
        self.shared.state.lock().cancelled
    }

    /// An autosave timer is armed and has not fired
    pub fn autosave_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), EditorError> {
        let title = title.into();
        self.edit(move |buffer| buffer.set_title(title))
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), EditorError> {
        let description = description.into();
        self.edit(move |buffer| buffer.set_description(description))
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), EditorError> {
        let content = content.into();
        self.edit(move |buffer| buffer.set_content(content))
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) -> Result<(), EditorError> {
        let tags = tags.into();
        self.edit(move |buffer| buffer.set_tags(tags))
    }

    pub fn set_item_type(&mut self, item_type: ItemType) -> Result<(), EditorError> {
        self.edit(move |buffer| buffer.set_item_type(item_type))
    }

    pub fn focus_title(&mut self) {
        self.shared.state.lock().buffer.focus_title();
    }

    /// Leave the title field; a blank title of a bound item reverts. Returns true on revert.
    pub fn blur_title(&mut self) -> bool {
        let settled = {
            let mut state = self.shared.state.lock();
            let is_bound = matches!(state.binding, Binding::Item(_));
            if state.buffer.blur_title(is_bound) {
                Some(state.settle())
            } else {
                None
            }
        };

        match settled {
            Some(settled) => {
                self.apply(settled);
                true
            }
            None => false,
        }
    }

    /// Write the buffer now, creating the item first when this is a draft
    pub async fn save(&self) -> Result<SaveOutcome, EditorError> {
        self.shared.save().await
    }

    /// Switch between autosave and manual save.
    ///
    /// Turning autosave off cancels the idle timer and marks the tab dirty when
    /// the buffer has unsaved changes. Turning it on clears the dirty flag and
    /// schedules whatever write the buffer needs.
    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        let settled = {
            let mut state = self.shared.state.lock();
            state.autosave_enabled = enabled;
            state.check_editable().ok().map(|()| state.settle())
        };

        if !enabled {
            self.debouncer.cancel();
        }
        if let Some(settled) = settled {
            self.apply(settled);
        }
    }

    /// Stop the timer and drop the results of anything still in flight
    pub fn unmount(&mut self) {
        self.debouncer.cancel();
        let mut state = self.shared.state.lock();
        if !state.cancelled {
            state.cancelled = true;
            debug!(tab_id = %state.tab_id, "Unmounted item editor");
        }
    }

    fn edit(&mut self, change: impl FnOnce(&mut DraftBuffer)) -> Result<(), EditorError> {
        let settled = {
            let mut state = self.shared.state.lock();
            state.check_editable()?;
            change(&mut state.buffer);
            state.settle()
        };

        self.shared.store.pin_tab(&settled.tab_id);
        self.apply(settled);
        Ok(())
    }

    fn apply(&mut self, settled: Settled) {
        let store = &self.shared.store;
        if let Some(title) = &settled.draft_title {
            store.update_tab_title_by_id(&settled.tab_id, title);
        }
        store.set_tab_dirty(&settled.tab_id, settled.is_dirty);

        match settled.follow_up {
            FollowUp::Nothing => {}
            FollowUp::Autosave => {
                let shared = Arc::clone(&self.shared);
                self.debouncer
                    .debounce(move || async move { shared.autosave().await });
            }
            FollowUp::CreateDraft => {
                let shared = Arc::clone(&self.shared);
                tokio::spawn(async move {
                    let _ = shared.materialize(SaveTrigger::DraftCreate).await;
                });
            }
        }
    }
}

impl Drop for ItemEditor {
    fn drop(&mut self) {
        self.unmount();
    }
}
