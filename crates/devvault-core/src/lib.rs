// ABOUTME: Core workspace state shared by editors and the workspace manager
// ABOUTME: Tab registry, close confirmation gate, injectable store and event aggregation

pub mod close_gate;
pub mod event_aggregator;
pub mod store;
pub mod tab_registry;

pub use close_gate::CloseConfirmationGate;
pub use event_aggregator::EventAggregator;
pub use store::{CloseRequestOutcome, WorkspaceSnapshot, WorkspaceStore};
pub use tab_registry::{OpenOutcome, Promotion, TabRegistry};
