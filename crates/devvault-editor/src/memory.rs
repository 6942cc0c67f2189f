// ABOUTME: In-memory item repository for tests and headless hosts
// ABOUTME: Counts calls, records requests, and can inject latency and failures

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use devvault_types::{CreateItemRequest, Item, ItemId, Tag, UpdateItemRequest};
use parking_lot::Mutex;

use crate::repository::{ItemRepository, RepositoryError, RepositoryResult};

/// Number of calls made to each repository operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub update: usize,
    pub get: usize,
    pub delete: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    tag_ids: HashMap<String, i64>,
    next_item_id: i64,
    clock: i64,
    calls: CallCounts,
    creates: Vec<CreateItemRequest>,
    updates: Vec<UpdateItemRequest>,
    failing_creates: usize,
    failing_updates: usize,
    latency: Duration,
}

impl MemoryState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn tags_for(&mut self, names: &[String]) -> Vec<Tag> {
        names
            .iter()
            .map(|name| {
                let next = self.tag_ids.len() as i64 + 1;
                let id = *self.tag_ids.entry(name.clone()).or_insert(next);
                Tag {
                    id,
                    name: name.clone(),
                }
            })
            .collect()
    }

    fn insert(&mut self, request: CreateItemRequest) -> Item {
        self.next_item_id += 1;
        let now = self.tick();
        let item = Item {
            id: ItemId(self.next_item_id),
            item_type: request.item_type,
            title: request.title.trim().to_string(),
            description: request.description,
            content: request.content,
            tags: self.tags_for(&request.tag_names),
            created_at: now,
            updated_at: now,
        };
        self.items.insert(item.id, item.clone());
        item
    }
}

/// Repository keeping items in a map, with test hooks
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before touching the map
    pub fn with_latency(latency: Duration) -> Self {
        let repository = Self::new();
        repository.set_latency(latency);
        repository
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Store an item directly, bypassing counters and validation
    pub fn seed(&self, request: CreateItemRequest) -> Item {
        self.state.lock().insert(request)
    }

    /// Make the next `count` creates fail with a backend error
    pub fn fail_next_creates(&self, count: usize) {
        self.state.lock().failing_creates = count;
    }

    /// Make the next `count` updates fail with a backend error
    pub fn fail_next_updates(&self, count: usize) {
        self.state.lock().failing_updates = count;
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.state.lock().items.get(&id).cloned()
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.lock().items.values().cloned().collect()
    }

    pub fn call_counts(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn create_requests(&self) -> Vec<CreateItemRequest> {
        self.state.lock().creates.clone()
    }

    pub fn update_requests(&self) -> Vec<UpdateItemRequest> {
        self.state.lock().updates.clone()
    }

    /// Count the call and return the latency to wait before serving it
    fn enter(&self, count: impl FnOnce(&mut CallCounts)) -> Duration {
        let mut state = self.state.lock();
        count(&mut state.calls);
        state.latency
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn create_item(&self, request: CreateItemRequest) -> RepositoryResult<Item> {
        let latency = self.enter(|calls| calls.create += 1);
        simulate_latency(latency).await;

        let mut state = self.state.lock();
        state.creates.push(request.clone());

        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(RepositoryError::Backend("injected create failure".into()));
        }
        if request.title.trim().is_empty() {
            return Err(RepositoryError::Validation("title is required".into()));
        }

        Ok(state.insert(request))
    }

    async fn update_item(&self, request: UpdateItemRequest) -> RepositoryResult<Item> {
        let latency = self.enter(|calls| calls.update += 1);
        simulate_latency(latency).await;

        let mut state = self.state.lock();
        state.updates.push(request.clone());

        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(RepositoryError::Backend("injected update failure".into()));
        }
        if request
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(RepositoryError::Validation("title is required".into()));
        }
        if !state.items.contains_key(&request.id) {
            return Err(RepositoryError::NotFound(request.id));
        }

        let tags = request.tag_names.as_deref().map(|names| state.tags_for(names));
        let now = state.tick();
        let Some(item) = state.items.get_mut(&request.id) else {
            return Err(RepositoryError::NotFound(request.id));
        };

        if let Some(item_type) = request.item_type {
            item.item_type = item_type;
        }
        if let Some(title) = request.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            item.description = (!description.is_empty()).then_some(description);
        }
        if let Some(content) = request.content {
            item.content = content;
        }
        if let Some(tags) = tags {
            item.tags = tags;
        }
        item.updated_at = now;

        Ok(item.clone())
    }

    async fn get_item(&self, id: ItemId) -> RepositoryResult<Option<Item>> {
        let latency = self.enter(|calls| calls.get += 1);
        simulate_latency(latency).await;

        Ok(self.item(id))
    }

    async fn delete_item(&self, id: ItemId) -> RepositoryResult<()> {
        let latency = self.enter(|calls| calls.delete += 1);
        simulate_latency(latency).await;

        match self.state.lock().items.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound(id)),
        }
    }
}
