#![forbid(unsafe_code)]

//! Structural mutation of a live session.
//!
//! Every primitive validates first and mutates second: a returned error
//! means the tree is exactly as it was. Structural edits require an
//! editable session; view-state changes (page selection, expansion) are
//! allowed in read-only sessions too.

use std::rc::Rc;

use panekit_core::id::NodeId;
use panekit_core::record::{Arrangement, ElementRecord, LeafKind, RecordSet};

use crate::error::{TreeError, TreeResult};
use crate::node::{LeafWidget, NodeBody};
use crate::session::Session;

/// Where a child lands in its new parent's child list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPos {
    /// After the last existing child.
    #[default]
    Append,
    /// At this index, clamped to the child count.
    At(usize),
}

impl InsertPos {
    fn resolve(self, len: usize) -> usize {
        match self {
            Self::Append => len,
            Self::At(index) => index.min(len),
        }
    }
}

impl Session {
    fn ensure_editable(&self) -> TreeResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(TreeError::ReadOnlySession)
        }
    }

    fn container_arrangement(&self, id: NodeId) -> TreeResult<Arrangement> {
        let node = self.node(id).ok_or(TreeError::UnknownNode { node: id })?;
        match &node.body {
            NodeBody::Container(c) => Ok(c.record.arrangement),
            NodeBody::Leaf(_) => Err(TreeError::NotAContainer { node: id }),
        }
    }

    /// Splice `child` into `parent`'s child list. Callers have already
    /// validated; this only moves references.
    fn attach(&mut self, parent: NodeId, child: NodeId, pos: InsertPos) {
        if let Some(node) = self.node_mut(parent)
            && let NodeBody::Container(c) = &mut node.body
        {
            let index = pos.resolve(c.children.len());
            c.children.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Remove `node` from its parent's child list and clear the back
    /// reference. The subtree stays alive in the arena.
    fn unlink(&mut self, node: NodeId) {
        let parent = self.node(node).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
            && let NodeBody::Container(c) = &mut p.body
        {
            c.children.retain(|&c2| c2 != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }

    fn drop_recursive(&mut self, node: NodeId) {
        if let Some(removed) = self.remove_node(node) {
            for &child in removed.children() {
                self.drop_recursive(child);
            }
        }
    }

    /// Materialize a fresh record as a new child of `parent`.
    ///
    /// Paged containers accept only container records.
    pub fn insert_record(
        &mut self,
        parent: NodeId,
        record: ElementRecord,
        pos: InsertPos,
    ) -> TreeResult<NodeId> {
        self.ensure_editable()?;
        let arrangement = self.container_arrangement(parent)?;
        if arrangement == Arrangement::Paged && !record.is_container() {
            return Err(TreeError::ChildKindRejected { parent });
        }
        let record_id = record.id();
        let records: RecordSet = [record].into_iter().collect();
        let node = self
            .materialize(&records, record_id, Some(parent))?
            .ok_or(TreeError::UnknownRecord { record: record_id })?;
        self.attach(parent, node, pos);
        Ok(node)
    }

    /// Detach `node` from its parent, keeping its subtree alive and
    /// unreachable until reinserted or dropped at session end.
    pub fn detach(&mut self, node: NodeId) -> TreeResult<()> {
        self.ensure_editable()?;
        let n = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        if n.parent.is_none() {
            return Err(TreeError::CannotMoveRoot { node });
        }
        self.unlink(node);
        Ok(())
    }

    /// Attach an existing node (parented or detached) under `parent`.
    ///
    /// Rejects attaching a node under itself or any of its descendants.
    pub fn insert_existing(
        &mut self,
        parent: NodeId,
        node: NodeId,
        pos: InsertPos,
    ) -> TreeResult<()> {
        self.ensure_editable()?;
        let arrangement = self.container_arrangement(parent)?;
        let moving = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        if arrangement == Arrangement::Paged && !moving.is_container() {
            return Err(TreeError::ChildKindRejected { parent });
        }
        if node == parent || self.is_ancestor(node, parent) {
            return Err(TreeError::WouldCreateCycle {
                node,
                new_parent: parent,
            });
        }
        self.unlink(node);
        self.attach(parent, node, pos);
        Ok(())
    }

    /// Move `node` under a different parent.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId, pos: InsertPos) -> TreeResult<()> {
        self.insert_existing(new_parent, node, pos)
    }

    /// Move `node` to `new_index` among its siblings.
    pub fn reorder(&mut self, node: NodeId, new_index: usize) -> TreeResult<()> {
        self.ensure_editable()?;
        let n = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        let parent = n.parent.ok_or(TreeError::CannotMoveRoot { node })?;
        if let Some(p) = self.node_mut(parent)
            && let NodeBody::Container(c) = &mut p.body
            && let Some(from) = c.children.iter().position(|&c2| c2 == node)
        {
            c.children.remove(from);
            let to = new_index.min(c.children.len());
            c.children.insert(to, node);
        }
        Ok(())
    }

    /// Delete `node` and its whole subtree from the session.
    pub fn remove_subtree(&mut self, node: NodeId) -> TreeResult<()> {
        self.ensure_editable()?;
        let n = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        if node == self.root() {
            return Err(TreeError::CannotMoveRoot { node });
        }
        if n.parent.is_some() {
            self.unlink(node);
        }
        self.drop_recursive(node);
        Ok(())
    }

    /// Deep-copy `node` as a sibling placed right after it.
    ///
    /// Every record in the copy gets a fresh GUID and the copy root's
    /// display name gains a " Copy" suffix.
    pub fn duplicate(&mut self, node: NodeId) -> TreeResult<NodeId> {
        self.ensure_editable()?;
        let n = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        let parent = n.parent.ok_or(TreeError::CannotMoveRoot { node })?;
        let source_record = n.record_id();

        let mut records = RecordSet::new();
        self.collect_records(node, &mut records)?;
        let copy_root = records
            .duplicate_subtree(source_record)
            .ok_or(TreeError::UnknownRecord {
                record: source_record,
            })?;

        let copy = self
            .materialize(&records, copy_root, Some(parent))?
            .ok_or(TreeError::UnknownRecord { record: copy_root })?;
        let index = self
            .node(parent)
            .map(|p| p.children().iter().position(|&c| c == node))
            .and_then(|i| i)
            .map_or(InsertPos::Append, |i| InsertPos::At(i + 1));
        self.attach(parent, copy, index);
        Ok(copy)
    }

    /// Select which page of a paged container is live. View state only;
    /// allowed in read-only sessions.
    pub fn select_page(&mut self, node: NodeId, index: usize) -> TreeResult<()> {
        let arrangement = self.container_arrangement(node)?;
        if arrangement != Arrangement::Paged {
            return Err(TreeError::NotPaged { node });
        }
        let pages = self.node(node).map_or(0, |n| n.children().len());
        if index >= pages {
            return Err(TreeError::PageOutOfRange { node, index, pages });
        }
        if let Some(n) = self.node_mut(node)
            && let NodeBody::Container(c) = &mut n.body
        {
            c.selected_page = index;
        }
        Ok(())
    }

    /// Expand or collapse a headed container. View and persisted state;
    /// allowed in read-only sessions.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) -> TreeResult<()> {
        self.container_arrangement(node)?;
        if let Some(n) = self.node_mut(node)
            && let NodeBody::Container(c) = &mut n.body
        {
            c.record.expanded = expanded;
        }
        Ok(())
    }

    /// Point a field leaf at a different member and reselect its behavior.
    pub fn rebind_field(&mut self, node: NodeId, target: Option<String>) -> TreeResult<()> {
        self.ensure_editable()?;
        let n = self.node(node).ok_or(TreeError::UnknownNode { node })?;
        match &n.body {
            NodeBody::Leaf(leaf) if leaf.record.kind == LeafKind::Field => {}
            _ => return Err(TreeError::NotAField { node }),
        }
        let binding = Rc::clone(self.binding());
        if let Some(n) = self.node_mut(node)
            && let NodeBody::Leaf(leaf) = &mut n.body
        {
            leaf.record.target = target;
            leaf.widget = LeafWidget::select(&leaf.record, binding.as_ref());
        }
        Ok(())
    }
}
