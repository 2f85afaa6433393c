#![forbid(unsafe_code)]

//! PaneKit public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from internal crates and offers a lightweight
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use panekit_core::binding::{
    Callback, Member, MemoryBinding, TargetBinding, Value, ValueKind, VisibilityProbe,
};
pub use panekit_core::geometry::{Rect, Sides, SizeMode};
pub use panekit_core::id::{ElementId, NodeId};
pub use panekit_core::record::{
    Arrangement, ContainerRecord, Content, DocumentSnapshot, ElementMeta, ElementRecord,
    HelpSeverity, LeafKind, LeafPayload, LeafRecord, NumberStyle, PredicateKind, RecordSet,
    ToggleStyle, VisibilityRule, DOCUMENT_SCHEMA_VERSION,
};
pub use panekit_core::store::{DocumentStore, JsonFileStore, MemoryStore, StoreError};

// --- Tree re-exports -------------------------------------------------------

pub use panekit_tree::{
    draw, DrawOp, InsertPos, LeafView, LeafWidget, Node, NodeBody, PanelRenderer,
    RecordingRenderer, Session, SessionMode, TreeError,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for panekit hosts.
#[derive(Debug)]
pub enum Error {
    /// Document persistence failure.
    Store(StoreError),
    /// Session or mutation failure.
    Tree(TreeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Tree(err) => Some(err),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

/// Standard result type for panekit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        draw, Arrangement, ContainerRecord, DocumentSnapshot, ElementId, ElementRecord, Error,
        InsertPos, LeafKind, LeafRecord, MemoryBinding, PanelRenderer, Rect, RecordSet, Result,
        Session, SizeMode, TargetBinding, Value, VisibilityRule,
    };

    pub use crate::{core, tree};
}

pub use panekit_core as core;
pub use panekit_tree as tree;

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    // A host can open a document from a store, edit it and save it back,
    // touching only facade exports.
    #[test]
    fn store_edit_save_round_trip() {
        let mut leaf = LeafRecord::new("Speed", LeafKind::Field);
        leaf.target = Some("speed".into());
        let mut root = ContainerRecord::new("Root", Arrangement::VerticalStack);
        root.children = vec![leaf.id];
        let root_id = root.id;
        let records: RecordSet = [ElementRecord::from(root), leaf.into()]
            .into_iter()
            .collect();
        let store = MemoryStore::with_snapshot(DocumentSnapshot::new(root_id, records));

        let snapshot = store.load().unwrap().unwrap();
        let result: Result<()> = (|| {
            let binding = MemoryBinding::new();
            binding.set_value("speed", Value::Float(1.0));
            let mut session =
                Session::open_editable(&snapshot.records, snapshot.root, Rc::new(binding))?;
            session.insert_record(
                session.root(),
                LeafRecord::new("Note", LeafKind::Label).into(),
                InsertPos::Append,
            )?;
            store.save(&session.commit()?)?;
            Ok(())
        })();
        result.unwrap();

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.records.len(), 3);
    }

    #[test]
    fn error_wraps_both_layers() {
        let store_err: Error = StoreError::Corruption("bad".into()).into();
        assert!(matches!(store_err, Error::Store(_)));
        let tree_err: Error = TreeError::ReadOnlySession.into();
        assert!(matches!(tree_err, Error::Tree(_)));
        assert!(std::error::Error::source(&tree_err).is_some());
    }
}
