//! Offline synchronization: fetch-or-fallback loads, write-through to the
//! durable store and response cache, optimistic local creation and
//! scheduled revalidation.

mod engine;
mod revalidate;
mod status;

pub use engine::{EngineOptions, SyncEngine};
pub use revalidate::RevalidationHandle;
pub use status::{BackendStatus, LoadOutcome, Snapshot, StatusReport, SyncPhase};
