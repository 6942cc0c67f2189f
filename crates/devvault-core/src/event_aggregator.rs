// ABOUTME: Event aggregator that queues domain events and fans them out to handlers
// ABOUTME: Lets hosts drain workspace and document events on their own schedule

use devvault_events::{
    AppEvent, EventBus, EventHandler, document::Event as DocumentEvent,
    workspace::Event as WorkspaceEvent,
};
use parking_lot::Mutex;

/// Event aggregator that collects and dispatches events
#[derive(Default)]
pub struct EventAggregator {
    handlers: Mutex<Vec<Box<dyn EventHandler + Send>>>,
    event_queue: Mutex<Vec<AppEvent>>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler<H>(&self, handler: H)
    where
        H: EventHandler + Send + 'static,
    {
        self.handlers.lock().push(Box::new(handler));
    }

    /// Deliver every queued event to every handler, in dispatch order.
    ///
    /// Events dispatched by handlers while processing are queued for the next call.
    pub fn process_events(&self) -> usize {
        let events = std::mem::take(&mut *self.event_queue.lock());
        let mut handlers = self.handlers.lock();

        for event in &events {
            for handler in handlers.iter_mut() {
                match event {
                    AppEvent::Workspace(e) => handler.handle_workspace(e),
                    AppEvent::Document(e) => handler.handle_document(e),
                }
            }
        }

        events.len()
    }

    pub fn queue_event(&self, event: AppEvent) {
        self.event_queue.lock().push(event);
    }

    pub fn queued_count(&self) -> usize {
        self.event_queue.lock().len()
    }
}

impl EventBus for EventAggregator {
    fn dispatch_workspace(&self, event: WorkspaceEvent) {
        self.queue_event(AppEvent::Workspace(event));
    }

    fn dispatch_document(&self, event: DocumentEvent) {
        self.queue_event(AppEvent::Document(event));
    }
}
