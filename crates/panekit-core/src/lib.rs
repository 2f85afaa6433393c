#![forbid(unsafe_code)]

//! Core data model for panekit panels.
//!
//! This crate holds everything that is independent of a live panel: geometry
//! primitives, persisted element records addressed by GUID, the collaborator
//! traits for member binding and document persistence, and the canonical
//! document snapshot format.

pub mod binding;
pub mod geometry;
pub mod id;
pub mod record;
pub mod store;

pub use binding::{Callback, Member, MemoryBinding, TargetBinding, Value, ValueKind, VisibilityProbe};
pub use geometry::{Rect, Sides, SizeMode};
pub use id::{ElementId, NodeId};
pub use record::{
    Arrangement, ContainerRecord, Content, DOCUMENT_SCHEMA_VERSION, DocumentSnapshot, ElementMeta,
    ElementRecord, HelpSeverity, LeafKind, LeafPayload, LeafRecord, NumberStyle, PredicateKind,
    RecordSet, SnapshotError, SnapshotWarning, ToggleStyle, VisibilityRule,
};
pub use store::{DocumentStore, JsonFileStore, MemoryStore, StoreError, StoreResult};
