// ABOUTME: Cross-crate event definitions for decoupled communication
// ABOUTME: Bounded contexts for tab workspace changes and item persistence outcomes

pub mod document;
pub mod event_bus;
pub mod workspace;

pub use event_bus::{EventBus, EventHandler, NullEventBus, RecordingEventBus};

/// Event of any bounded context, in dispatch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Workspace(workspace::Event),
    Document(document::Event),
}
