#![forbid(unsafe_code)]

//! Live panel trees: sessions, layout, mutation and rendering dispatch.
//!
//! This crate turns the persisted records of `panekit-core` into a runtime
//! tree. A [`Session`] materializes a record set against a target binding,
//! lays the tree out in two fixed passes per [`Session::refresh`], accepts
//! fail-safe structural edits, and flattens back to records on
//! [`Session::commit`]. [`draw`] hands the visible elements to a
//! host-supplied [`PanelRenderer`].
//!
//! Sessions are single-threaded values; hosts own them and drive them from
//! their UI loop.

pub mod draw;
pub mod error;
pub mod layout;
pub mod mutate;
pub mod node;
pub mod session;

pub use draw::{draw, DrawOp, LeafView, PanelRenderer, RecordingRenderer};
pub use error::{TreeError, TreeResult};
pub use layout::{HEADER_HEIGHT, HEADER_INDENT, LINE_HEIGHT, TAB_STRIP_HEIGHT};
pub use mutate::InsertPos;
pub use node::{ContainerNode, LeafNode, LeafWidget, Node, NodeBody, NodeVisibility};
pub use session::{Session, SessionMode};
