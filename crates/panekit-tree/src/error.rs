#![forbid(unsafe_code)]

//! Tree mutation and commit errors.
//!
//! Every failure here leaves the session untouched; mutation primitives are
//! fail-safe no-ops. Recoverable data problems (unbound members, dangling
//! child references) never surface as errors at all; they degrade at
//! materialization.

use std::fmt;

use panekit_core::id::{ElementId, NodeId};

/// Errors from session mutation and persistence sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The node ID does not name a live node in this session.
    UnknownNode { node: NodeId },
    /// The record GUID does not name a record in the given set.
    UnknownRecord { record: ElementId },
    /// The operation requires a container node.
    NotAContainer { node: NodeId },
    /// The operation requires a paged container.
    NotPaged { node: NodeId },
    /// The operation requires a field leaf.
    NotAField { node: NodeId },
    /// The container does not accept children of this kind.
    ChildKindRejected { parent: NodeId },
    /// Attaching here would make the node its own ancestor.
    WouldCreateCycle { node: NodeId, new_parent: NodeId },
    /// The root (or a detached subtree root) cannot be moved this way.
    CannotMoveRoot { node: NodeId },
    /// Structural mutation attempted on a read-only session.
    ReadOnlySession,
    /// The same record GUID was reached twice while committing.
    DuplicateRecord { record: ElementId },
    /// Page index past the end of the page list.
    PageOutOfRange {
        node: NodeId,
        index: usize,
        pages: usize,
    },
    /// The session's node ID counter overflowed.
    NodeIdOverflow,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { node } => write!(f, "node {node} not found"),
            Self::UnknownRecord { record } => write!(f, "record {record} not found"),
            Self::NotAContainer { node } => write!(f, "node {node} is not a container"),
            Self::NotPaged { node } => write!(f, "node {node} is not a paged container"),
            Self::NotAField { node } => write!(f, "node {node} is not a field leaf"),
            Self::ChildKindRejected { parent } => {
                write!(f, "container {parent} does not accept children of this kind")
            }
            Self::WouldCreateCycle { node, new_parent } => write!(
                f,
                "inserting node {node} under {new_parent} would create a cycle"
            ),
            Self::CannotMoveRoot { node } => write!(f, "node {node} has no parent to detach from"),
            Self::ReadOnlySession => write!(f, "session is read-only"),
            Self::DuplicateRecord { record } => {
                write!(f, "record {record} reached twice during commit")
            }
            Self::PageOutOfRange { node, index, pages } => {
                write!(f, "page {index} out of range for node {node} ({pages} pages)")
            }
            Self::NodeIdOverflow => write!(f, "node id counter overflowed"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
