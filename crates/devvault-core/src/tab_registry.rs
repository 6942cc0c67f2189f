// ABOUTME: Tab registry owning the ordered tab list and the active tab
// ABOUTME: Implements preview replacement, pinning, draft promotion and close selection

use devvault_types::{
    DOCUMENTATION_TAB_TITLE, DocId, ItemId, ItemType, NEW_TAB_TITLE, Tab, TabId, TabKind,
    draft_placeholder_title,
};

/// What opening content did to the tab bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The content already had a tab, which is now active
    Activated { tab_id: TabId, newly_pinned: bool },
    /// The unpinned tab of the same preview group was reused in place
    Replaced { tab_id: TabId, previous: Tab },
    /// A new tab was added at the end
    Appended { tab_id: TabId },
}

impl OpenOutcome {
    pub fn tab_id(&self) -> &TabId {
        match self {
            OpenOutcome::Activated { tab_id, .. }
            | OpenOutcome::Replaced { tab_id, .. }
            | OpenOutcome::Appended { tab_id } => tab_id,
        }
    }

    /// The preview tab that was replaced, if any
    pub fn replaced(&self) -> Option<&Tab> {
        match self {
            OpenOutcome::Replaced { previous, .. } => Some(previous),
            _ => None,
        }
    }
}

/// Result of turning a draft tab into an item tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub tab_id: TabId,
    /// Another tab that was already bound to the same item and had to go
    pub displaced: Option<Tab>,
}

/// Ordered tabs plus the active tab id
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    next_serial: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.tab(id).is_some()
    }

    pub fn position(&self, id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|t| &t.id == id)
    }

    pub fn tab_for_item(&self, item_id: ItemId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.kind.item_id() == Some(item_id))
    }

    pub fn active_tab_id(&self) -> Option<&TabId> {
        self.active.as_ref()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.as_ref().and_then(|id| self.tab(id))
    }

    /// Open the tab of a persisted item.
    ///
    /// An existing tab for the item is activated (and pinned when `pin` is set).
    /// Otherwise an unpinned open reuses the current item preview tab in place,
    /// and a pinned open appends.
    pub fn open_item_tab(
        &mut self,
        item_id: ItemId,
        item_type: ItemType,
        title: &str,
        pin: bool,
    ) -> OpenOutcome {
        if let Some(index) = self
            .tabs
            .iter()
            .position(|t| t.kind.item_id() == Some(item_id))
        {
            return self.activate_existing(index, pin);
        }

        let kind = TabKind::Item { item_id, item_type };
        self.place(TabId::for_item(item_id), kind, title.to_string(), pin)
    }

    /// Open a documentation page, with the same preview policy as items.
    pub fn open_doc_entry_tab(
        &mut self,
        doc_id: DocId,
        doc_path: &str,
        title: &str,
        pin: bool,
    ) -> OpenOutcome {
        if let Some(index) = self
            .tabs
            .iter()
            .position(|t| t.kind.doc_entry() == Some((doc_id, doc_path)))
        {
            return self.activate_existing(index, pin);
        }

        let id = TabId::new(format!("docEntry-{doc_id}-{doc_path}-{}", self.serial()));
        let kind = TabKind::DocEntry {
            doc_id,
            doc_path: doc_path.to_string(),
        };
        self.place(id, kind, title.to_string(), pin)
    }

    /// Append a pinned draft tab for content that does not exist yet.
    pub fn open_draft_item_tab(&mut self, item_type: ItemType) -> TabId {
        let id = TabId::new(format!("draft-{}", self.serial()));
        self.append(Tab::pinned(
            id.clone(),
            TabKind::Draft { item_type },
            draft_placeholder_title(item_type),
        ));
        id
    }

    pub fn open_new_tab(&mut self) -> TabId {
        let id = TabId::new(format!("new-{}", self.serial()));
        self.append(Tab::pinned(id.clone(), TabKind::New, NEW_TAB_TITLE));
        id
    }

    /// Activate the documentation tab, creating it on first use.
    pub fn open_documentation_tab(&mut self) -> TabId {
        if let Some(tab) = self
            .tabs
            .iter()
            .find(|t| t.kind == TabKind::Documentation)
        {
            let id = tab.id.clone();
            self.active = Some(id.clone());
            return id;
        }

        let id = TabId::new(format!("documentation-{}", self.serial()));
        self.append(Tab::pinned(
            id.clone(),
            TabKind::Documentation,
            DOCUMENTATION_TAB_TITLE,
        ));
        id
    }

    /// Activate a live tab. Unknown ids are ignored.
    pub fn select_tab(&mut self, id: &TabId) -> bool {
        if self.contains(id) {
            self.active = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Pin a tab. Returns true when the tab was a preview before.
    pub fn pin_tab(&mut self, id: &TabId) -> bool {
        match self.tabs.iter_mut().find(|t| &t.id == id) {
            Some(tab) if !tab.is_pinned => {
                tab.is_pinned = true;
                true
            }
            _ => false,
        }
    }

    /// Remove a tab. When it was active, its right neighbour (or the new last tab) takes over.
    pub fn close_tab(&mut self, id: &TabId) -> Option<Tab> {
        let index = self.position(id)?;
        let tab = self.tabs.remove(index);

        if self.active.as_ref() == Some(id) {
            self.active = if self.tabs.is_empty() {
                None
            } else {
                let next = index.min(self.tabs.len() - 1);
                Some(self.tabs[next].id.clone())
            };
        }

        Some(tab)
    }

    /// Retitle the tab bound to `item_id`. Returns true when the title changed.
    pub fn update_tab_title(&mut self, item_id: ItemId, title: &str) -> bool {
        match self
            .tabs
            .iter_mut()
            .find(|t| t.kind.item_id() == Some(item_id))
        {
            Some(tab) if tab.title != title => {
                tab.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn update_tab_title_by_id(&mut self, id: &TabId, title: &str) -> bool {
        match self.tabs.iter_mut().find(|t| &t.id == id) {
            Some(tab) if tab.title != title => {
                tab.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    /// Turn a draft tab into the tab of the item created from it.
    ///
    /// The tab keeps its position and pin state, loses its dirty flag and
    /// becomes active. Returns `None` when `draft_id` is not a live draft.
    pub fn promote_draft_tab(
        &mut self,
        draft_id: &TabId,
        item_id: ItemId,
        item_type: ItemType,
        title: &str,
    ) -> Option<Promotion> {
        let mut index = self
            .tabs
            .iter()
            .position(|t| &t.id == draft_id && t.kind.is_draft())?;

        let duplicate = self
            .tabs
            .iter()
            .position(|t| t.kind.item_id() == Some(item_id));
        let displaced = duplicate.map(|dup| {
            if dup < index {
                index -= 1;
            }
            self.tabs.remove(dup)
        });

        let tab_id = TabId::for_item(item_id);
        let tab = &mut self.tabs[index];
        tab.id = tab_id.clone();
        tab.kind = TabKind::Item { item_id, item_type };
        tab.title = title.to_string();
        tab.is_dirty = false;
        self.active = Some(tab_id.clone());

        Some(Promotion { tab_id, displaced })
    }

    /// Returns true when the flag changed.
    pub fn set_tab_dirty(&mut self, id: &TabId, dirty: bool) -> bool {
        match self.tabs.iter_mut().find(|t| &t.id == id) {
            Some(tab) if tab.is_dirty != dirty => {
                tab.is_dirty = dirty;
                true
            }
            _ => false,
        }
    }

    /// The tab right of the active one, wrapping around
    pub fn next_tab(&self) -> Option<TabId> {
        let active = self.position(self.active.as_ref()?)?;
        let next = (active + 1) % self.tabs.len();
        Some(self.tabs[next].id.clone())
    }

    /// The tab left of the active one, wrapping around
    pub fn prev_tab(&self) -> Option<TabId> {
        let active = self.position(self.active.as_ref()?)?;
        let prev = if active == 0 {
            self.tabs.len() - 1
        } else {
            active - 1
        };
        Some(self.tabs[prev].id.clone())
    }

    fn serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    fn append(&mut self, tab: Tab) {
        self.active = Some(tab.id.clone());
        self.tabs.push(tab);
    }

    fn activate_existing(&mut self, index: usize, pin: bool) -> OpenOutcome {
        let tab = &mut self.tabs[index];
        let newly_pinned = pin && !tab.is_pinned;
        if newly_pinned {
            tab.is_pinned = true;
        }
        let tab_id = tab.id.clone();
        self.active = Some(tab_id.clone());
        OpenOutcome::Activated {
            tab_id,
            newly_pinned,
        }
    }

    fn place(&mut self, id: TabId, kind: TabKind, title: String, pin: bool) -> OpenOutcome {
        if !pin {
            let group = kind.preview_group();
            let slot = self
                .tabs
                .iter()
                .position(|t| t.is_preview() && group.is_some() && t.kind.preview_group() == group);

            if let Some(index) = slot {
                let previous =
                    std::mem::replace(&mut self.tabs[index], Tab::preview(id.clone(), kind, title));
                self.active = Some(id.clone());
                return OpenOutcome::Replaced {
                    tab_id: id,
                    previous,
                };
            }

            self.append(Tab::preview(id.clone(), kind, title));
        } else {
            self.append(Tab::pinned(id.clone(), kind, title));
        }
        OpenOutcome::Appended { tab_id: id }
    }
}
