// ABOUTME: End-to-end tests of the workspace manager over an in-memory repository
// ABOUTME: Covers preview replacement, close confirmation, drafts, loads and the save shortcut

use std::sync::Arc;
use std::time::Duration;

use devvault_core::CloseRequestOutcome;
use devvault_editor::{Binding, InMemoryRepository, LoadState, SaveOutcome};
use devvault_events::RecordingEventBus;
use devvault_events::document::Event as DocumentEvent;
use devvault_types::{
    CreateItemRequest, DocEntry, DocId, EditorConfig, Item, ItemId, ItemType, KeyChord, TabId,
    TabKind,
};
use devvault_workspace::{Config, WorkspaceManager};

struct Fixture {
    repository: Arc<InMemoryRepository>,
    bus: Arc<RecordingEventBus>,
    manager: WorkspaceManager,
}

impl Fixture {
    fn new(config: Config) -> Self {
        Self::with_repository(InMemoryRepository::new(), config)
    }

    fn with_repository(repository: InMemoryRepository, config: Config) -> Self {
        let repository = Arc::new(repository);
        let bus = Arc::new(RecordingEventBus::new());
        let manager = WorkspaceManager::new(repository.clone(), bus.clone(), config);
        Self {
            repository,
            bus,
            manager,
        }
    }

    fn seed(&self, title: &str) -> Item {
        self.repository.seed(CreateItemRequest {
            item_type: ItemType::Note,
            title: title.to_string(),
            description: None,
            content: format!("{title} body"),
            tag_names: Vec::new(),
        })
    }

    fn open(&mut self, item: &Item, pin: bool) -> TabId {
        self.manager
            .open_item(item.id, item.item_type, &item.title, pin)
    }

    fn tab_ids(&self) -> Vec<TabId> {
        self.manager.tabs().into_iter().map(|tab| tab.id).collect()
    }
}

fn manual_config() -> Config {
    Config {
        editor: EditorConfig {
            autosave_enabled: false,
            ..EditorConfig::default()
        },
        ..Config::default()
    }
}

fn save_chord() -> KeyChord {
    KeyChord::new("s").with_meta()
}

async fn idle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_open_item_loads_in_background() {
    let mut fixture = Fixture::new(Config::default());
    let item = fixture.seed("Release checklist");

    let tab_id = fixture
        .manager
        .open_item(item.id, item.item_type, "Loading", false);
    assert_eq!(
        fixture.manager.editor(&tab_id).unwrap().load_state(),
        LoadState::Loading
    );

    idle(10).await;
    let editor = fixture.manager.editor(&tab_id).unwrap();
    assert_eq!(editor.load_state(), LoadState::Ready);
    assert_eq!(editor.fields().content, "Release checklist body");
    assert_eq!(
        fixture.manager.store().tab(&tab_id).unwrap().title,
        "Release checklist"
    );
}

#[tokio::test(start_paused = true)]
async fn test_preview_replacement_unmounts_previous_editor() {
    let mut fixture = Fixture::new(Config::default());
    let first = fixture.seed("First");
    let second = fixture.seed("Second");

    let first_tab = fixture.open(&first, false);
    let second_tab = fixture.open(&second, false);

    assert_eq!(fixture.tab_ids(), vec![second_tab.clone()]);
    assert!(fixture.manager.editor(&first_tab).is_none());
    assert!(fixture.manager.editor(&second_tab).is_some());
    assert_eq!(fixture.manager.editor_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edited_preview_is_kept_when_opening_another_item() {
    let mut fixture = Fixture::new(Config::default());
    let first = fixture.seed("First");
    let second = fixture.seed("Second");

    let first_tab = fixture.open(&first, false);
    idle(10).await;
    fixture
        .manager
        .editor_mut(&first_tab)
        .unwrap()
        .set_content("edited")
        .unwrap();

    let second_tab = fixture.open(&second, false);
    assert_eq!(fixture.tab_ids(), vec![first_tab.clone(), second_tab]);
    assert!(fixture.manager.editor(&first_tab).is_some());

    idle(1_000).await;
    assert_eq!(fixture.repository.item(first.id).unwrap().content, "edited");
}

#[tokio::test(start_paused = true)]
async fn test_reopening_item_activates_existing_tab() {
    let mut fixture = Fixture::new(Config::default());
    let item = fixture.seed("Only");
    let other = fixture.seed("Other");

    let tab_id = fixture.open(&item, true);
    fixture.open(&other, true);
    let again = fixture.open(&item, false);

    idle(10).await;
    assert_eq!(again, tab_id);
    assert_eq!(fixture.manager.active_tab_id(), Some(tab_id));
    assert_eq!(fixture.manager.editor_count(), 2);
    assert_eq!(fixture.repository.call_counts().get, 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_item_keeps_tab_open() {
    let mut fixture = Fixture::new(Config::default());
    let tab_id = fixture
        .manager
        .open_item(ItemId(99), ItemType::Snippet, "Deleted", true);

    idle(10).await;
    assert_eq!(
        fixture.manager.editor(&tab_id).unwrap().load_state(),
        LoadState::NotFound
    );
    assert!(fixture.manager.store().contains(&tab_id));
    assert!(fixture.bus.document_events().contains(&DocumentEvent::NotFound {
        tab_id,
        item_id: ItemId(99),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_closing_during_load_discards_result() {
    let mut fixture = Fixture::with_repository(
        InMemoryRepository::with_latency(Duration::from_millis(200)),
        Config::default(),
    );
    let item = fixture.seed("Slow");
    let tab_id = fixture.open(&item, true);

    idle(50).await;
    fixture.manager.close_tab(&tab_id).unwrap();
    idle(500).await;

    assert_eq!(fixture.manager.editor_count(), 0);
    assert!(!fixture
        .bus
        .document_events()
        .iter()
        .any(|event| matches!(event, DocumentEvent::Loaded { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_dirty_close_requires_confirmation() {
    let mut fixture = Fixture::new(manual_config());
    let dirty_item = fixture.seed("Dirty");
    let other_item = fixture.seed("Other");

    let dirty = fixture.open(&dirty_item, true);
    let other = fixture.open(&other_item, true);
    idle(10).await;
    for tab_id in [&dirty, &other] {
        fixture
            .manager
            .editor_mut(tab_id)
            .unwrap()
            .set_content("unsaved")
            .unwrap();
    }

    assert_eq!(
        fixture.manager.request_close(&dirty),
        CloseRequestOutcome::AwaitingConfirmation
    );
    assert_eq!(
        fixture.manager.request_close(&other),
        CloseRequestOutcome::Blocked {
            pending: dirty.clone()
        }
    );

    assert_eq!(fixture.manager.cancel_close(), Some(dirty.clone()));
    assert!(fixture.manager.store().tab(&dirty).unwrap().is_dirty);
    assert!(fixture.manager.editor(&dirty).unwrap().has_changes());

    fixture.manager.request_close(&dirty);
    let closed = fixture.manager.confirm_close().unwrap();
    assert_eq!(closed.id, dirty);
    assert!(fixture.manager.editor(&dirty).is_none());
    assert_eq!(fixture.repository.call_counts().update, 0);
    assert_eq!(
        fixture.repository.item(dirty_item.id).unwrap().content,
        "Dirty body"
    );
}

#[tokio::test(start_paused = true)]
async fn test_clean_close_selects_neighbour() {
    let mut fixture = Fixture::new(Config::default());
    let first = fixture.manager.open_new_tab();
    let second = fixture.manager.open_new_tab();
    let third = fixture.manager.open_new_tab();

    fixture.manager.select_tab(&second);
    let outcome = fixture.manager.request_close(&second);

    assert!(matches!(
        outcome,
        CloseRequestOutcome::Closed { ref next_active, .. } if next_active.as_ref() == Some(&third)
    ));
    assert_eq!(fixture.tab_ids(), vec![first, third.clone()]);
    assert_eq!(fixture.manager.active_tab_id(), Some(third));
}

#[tokio::test(start_paused = true)]
async fn test_save_shortcut_only_in_manual_mode() {
    let mut fixture = Fixture::new(manual_config());
    let item = fixture.seed("Shortcut");
    let tab_id = fixture.open(&item, false);
    idle(10).await;

    fixture
        .manager
        .active_editor_mut()
        .unwrap()
        .set_content("saved by chord")
        .unwrap();
    assert!(fixture
        .manager
        .handle_key(&KeyChord::new("d").with_ctrl())
        .await
        .is_none());

    let result = fixture.manager.handle_key(&save_chord()).await.unwrap();
    assert!(matches!(result, Ok(SaveOutcome::Saved(_))));
    assert!(!fixture.manager.store().tab(&tab_id).unwrap().is_dirty);
    assert_eq!(
        fixture.repository.item(item.id).unwrap().content,
        "saved by chord"
    );

    fixture.manager.set_autosave_enabled(true);
    assert!(fixture.manager.handle_key(&save_chord()).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_enabling_autosave_flushes_dirty_editors() {
    let mut fixture = Fixture::new(manual_config());
    let item = fixture.seed("Toggle");
    let tab_id = fixture.open(&item, true);
    idle(10).await;

    fixture
        .manager
        .editor_mut(&tab_id)
        .unwrap()
        .set_content("pending")
        .unwrap();
    assert!(fixture.manager.store().tab(&tab_id).unwrap().is_dirty);

    fixture.manager.set_autosave_enabled(true);
    assert!(!fixture.manager.store().tab(&tab_id).unwrap().is_dirty);

    idle(1_000).await;
    assert_eq!(fixture.repository.item(item.id).unwrap().content, "pending");
}

#[tokio::test(start_paused = true)]
async fn test_draft_promotion_keeps_editor_mounted() {
    let mut fixture = Fixture::with_repository(
        InMemoryRepository::with_latency(Duration::from_millis(100)),
        Config::default(),
    );
    let draft = fixture.manager.open_draft(ItemType::Snippet);
    let editor = fixture.manager.active_editor_mut().unwrap();

    editor.set_title("awk").unwrap();
    idle(50).await;

    // Edits and tab changes while the create is in flight
    let editor = fixture.manager.active_editor_mut().unwrap();
    editor.set_content("awk '{print $1}'").unwrap();
    editor.set_tags("text, cli").unwrap();
    fixture.manager.open_new_tab();
    fixture.manager.select_tab(&draft);

    idle(1_000).await;
    fixture.manager.prune_editors();

    let counts = fixture.repository.call_counts();
    assert_eq!(counts.create, 1);
    assert_eq!(counts.update, 1);

    let tab = fixture
        .manager
        .tabs()
        .into_iter()
        .find(|tab| matches!(tab.kind, TabKind::Item { .. }))
        .unwrap();
    assert!(fixture.manager.store().tab(&draft).is_none());
    assert_eq!(tab.title, "awk");
    assert_eq!(fixture.manager.active_tab_id(), Some(tab.id.clone()));

    let editor = fixture.manager.editor(&tab.id).unwrap();
    let Binding::Item(item_id) = editor.binding() else {
        panic!("draft was not promoted");
    };
    let stored = fixture.repository.item(item_id).unwrap();
    assert_eq!(stored.content, "awk '{print $1}'");
    assert_eq!(stored.tag_names(), vec!["text", "cli"]);
}

#[tokio::test(start_paused = true)]
async fn test_promotion_unmounts_editor_of_displaced_tab() {
    let mut fixture = Fixture::with_repository(
        InMemoryRepository::with_latency(Duration::from_millis(200)),
        Config::default(),
    );
    fixture.manager.open_draft(ItemType::Snippet);
    fixture
        .manager
        .active_editor_mut()
        .unwrap()
        .set_title("jq filters")
        .unwrap();
    idle(50).await;

    // The item the draft is about to become, opened from a stale listing
    let stale = Item {
        id: ItemId(1),
        item_type: ItemType::Snippet,
        title: "jq filters".to_string(),
        description: None,
        content: String::new(),
        tags: Vec::new(),
        created_at: 0,
        updated_at: 0,
    };
    let item_tab = fixture.manager.open_item_with(&stale, false);
    fixture
        .manager
        .editor_mut(&item_tab)
        .unwrap()
        .set_content("from displaced tab")
        .unwrap();
    assert_eq!(fixture.manager.editor_count(), 2);

    idle(1_000).await;

    let item_tabs = fixture
        .manager
        .tabs()
        .into_iter()
        .filter(|tab| tab.id == item_tab)
        .count();
    assert_eq!(item_tabs, 1);
    assert_eq!(fixture.manager.editor_count(), 1);
    assert_eq!(fixture.repository.call_counts().update, 0);
    assert_eq!(fixture.repository.item(ItemId(1)).unwrap().content, "");

    let editor = fixture.manager.editor(&item_tab).unwrap();
    assert_eq!(editor.binding(), Binding::Item(ItemId(1)));
    assert_eq!(editor.fields().title, "jq filters");
    assert!(fixture.manager.editor_for_item(ItemId(1)).is_some());

    fixture.manager.prune_editors();
    assert_eq!(fixture.manager.editor_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_delay_is_used() {
    let mut config = Config::default();
    config.editor.autosave_delay_ms = 2_000;
    let mut fixture = Fixture::new(config);
    let item = fixture.seed("Patient");
    let tab_id = fixture.open(&item, true);
    idle(10).await;

    fixture
        .manager
        .editor_mut(&tab_id)
        .unwrap()
        .set_content("later")
        .unwrap();

    idle(1_500).await;
    assert_eq!(fixture.repository.call_counts().update, 0);
    idle(1_000).await;
    assert_eq!(fixture.repository.call_counts().update, 1);
}

#[tokio::test(start_paused = true)]
async fn test_doc_entries_share_one_preview_slot_and_are_cached() {
    let mut fixture = Fixture::new(Config::default());
    let page = |path: &str| DocEntry {
        id: 1,
        doc_id: DocId(3),
        path: path.to_string(),
        title: path.to_string(),
        content: format!("<p>{path}</p>"),
        entry_type: Some("module".to_string()),
        parent_path: None,
        created_at: 0,
    };

    let item = fixture.seed("Item preview");
    let item_tab = fixture.open(&item, false);
    fixture.manager.open_doc_entry(&page("std/fs"), false);
    let io_tab = fixture.manager.open_doc_entry(&page("std/io"), false);

    // Doc entries and items have separate preview slots
    assert_eq!(fixture.tab_ids(), vec![item_tab, io_tab]);
    assert_eq!(
        fixture.manager.doc_entry(DocId(3), "std/fs").unwrap().content,
        "<p>std/fs</p>"
    );
    assert_eq!(fixture.manager.doc_cache().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_documentation_items_cannot_be_edited() {
    let mut fixture = Fixture::new(manual_config());
    let item = fixture.repository.seed(CreateItemRequest {
        item_type: ItemType::Documentation,
        title: "Bundled guide".to_string(),
        description: None,
        content: "read me".to_string(),
        tag_names: Vec::new(),
    });
    let tab_id = fixture.manager.open_item_with(&item, false);

    let editor = fixture.manager.editor_mut(&tab_id).unwrap();
    assert!(editor.is_read_only());
    assert!(editor.set_content("changed").is_err());
    assert!(fixture.manager.store().tab(&tab_id).unwrap().is_preview());

    let result = fixture.manager.handle_key(&save_chord()).await.unwrap();
    assert!(result.is_err());
    assert_eq!(fixture.repository.call_counts().update, 0);
}

#[tokio::test(start_paused = true)]
async fn test_tab_cycling_wraps() {
    let mut fixture = Fixture::new(Config::default());
    let first = fixture.manager.open_new_tab();
    let second = fixture.manager.open_documentation();

    assert_eq!(fixture.manager.next_tab(), Some(first.clone()));
    assert_eq!(fixture.manager.next_tab(), Some(second.clone()));
    assert_eq!(fixture.manager.prev_tab(), Some(first));
}

#[tokio::test(start_paused = true)]
async fn test_events_reach_aggregator_handlers() {
    use devvault_core::EventAggregator;
    use devvault_events::EventHandler;
    use devvault_events::workspace::Event as WorkspaceEvent;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Seen {
        opened: usize,
        saved: usize,
    }

    struct Counter(Arc<Mutex<Seen>>);

    impl EventHandler for Counter {
        fn handle_workspace(&mut self, event: &WorkspaceEvent) {
            if matches!(event, WorkspaceEvent::TabOpened { .. }) {
                self.0.lock().opened += 1;
            }
        }

        fn handle_document(&mut self, event: &DocumentEvent) {
            if matches!(event, DocumentEvent::Saved { .. }) {
                self.0.lock().saved += 1;
            }
        }
    }

    let repository = Arc::new(InMemoryRepository::new());
    let aggregator = Arc::new(EventAggregator::new());
    let seen = Arc::new(Mutex::new(Seen::default()));
    aggregator.register_handler(Counter(seen.clone()));

    let mut manager =
        WorkspaceManager::new(repository.clone(), aggregator.clone(), manual_config());
    let item = repository.seed(CreateItemRequest {
        item_type: ItemType::Link,
        title: "Crates".to_string(),
        description: None,
        content: "https://crates.io".to_string(),
        tag_names: Vec::new(),
    });
    manager.open_item_with(&item, true);
    manager
        .active_editor_mut()
        .unwrap()
        .set_content("https://docs.rs")
        .unwrap();
    manager.save_active().await.unwrap().unwrap();

    assert!(aggregator.queued_count() > 0);
    aggregator.process_events();
    assert_eq!(aggregator.queued_count(), 0);

    let seen = seen.lock();
    assert_eq!(seen.opened, 1);
    assert_eq!(seen.saved, 1);
}
