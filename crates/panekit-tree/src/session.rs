#![forbid(unsafe_code)]

//! Panel sessions.
//!
//! A [`Session`] is the explicit context for one open panel: it owns the
//! node arena, the runtime ID counter, the root, and the binding handle.
//! Hosts open a session from a record set, call [`Session::refresh`] once
//! per frame, and [`Session::commit`] when the document should be
//! persisted. There is no process-wide current panel; every operation goes
//! through a session value.

use std::collections::BTreeMap;
use std::rc::Rc;

use panekit_core::binding::TargetBinding;
use panekit_core::geometry::Rect;
use panekit_core::id::{ElementId, NodeId};
use panekit_core::record::{
    Arrangement, DocumentSnapshot, ElementRecord, LeafKind, RecordSet,
};

use crate::error::{TreeError, TreeResult};
use crate::layout;
use crate::node::{ContainerNode, LeafNode, LeafWidget, Node, NodeBody, NodeVisibility};

/// Whether a session accepts structural mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Edit,
    ReadOnly,
}

/// One open panel.
pub struct Session {
    nodes: BTreeMap<NodeId, Node>,
    next_id: NodeId,
    root: NodeId,
    binding: Rc<dyn TargetBinding>,
    mode: SessionMode,
}

impl Session {
    /// Open a panel that accepts structural mutation.
    pub fn open_editable(
        records: &RecordSet,
        root: ElementId,
        binding: Rc<dyn TargetBinding>,
    ) -> TreeResult<Self> {
        Self::open(records, root, binding, SessionMode::Edit)
    }

    /// Open a display-only panel. Structural mutations return
    /// [`TreeError::ReadOnlySession`].
    pub fn open_readonly(
        records: &RecordSet,
        root: ElementId,
        binding: Rc<dyn TargetBinding>,
    ) -> TreeResult<Self> {
        Self::open(records, root, binding, SessionMode::ReadOnly)
    }

    fn open(
        records: &RecordSet,
        root: ElementId,
        binding: Rc<dyn TargetBinding>,
        mode: SessionMode,
    ) -> TreeResult<Self> {
        let mut session = Self {
            nodes: BTreeMap::new(),
            next_id: NodeId::MIN,
            root: NodeId::MIN,
            binding,
            mode,
        };
        let root_node = session
            .materialize(records, root, None)?
            .ok_or(TreeError::UnknownRecord { record: root })?;
        session.root = root_node;
        Ok(session)
    }

    /// Materialize the record `id` (and its reachable subtree) into the
    /// arena under `parent`.
    ///
    /// Returns `Ok(None)` for dangling references; a stale child ID removes
    /// that child from the live tree instead of failing the open. Paged
    /// containers discard leaf children here.
    pub(crate) fn materialize(
        &mut self,
        records: &RecordSet,
        id: ElementId,
        parent: Option<NodeId>,
    ) -> TreeResult<Option<NodeId>> {
        let Some(record) = records.get(id) else {
            return Ok(None);
        };
        let node_id = self.alloc()?;
        match record {
            ElementRecord::Container(container) => {
                let container = container.clone();
                let visibility = NodeVisibility::resolve(&container.meta, self.binding.as_ref());
                let paged = container.arrangement == Arrangement::Paged;
                let child_records = container.children.clone();
                self.nodes.insert(
                    node_id,
                    Node {
                        id: node_id,
                        parent,
                        rect: Rect::ZERO,
                        header_rect: Rect::ZERO,
                        hidden: false,
                        visibility,
                        body: NodeBody::Container(ContainerNode {
                            record: container,
                            children: Vec::new(),
                            selected_page: 0,
                        }),
                    },
                );
                let mut children = Vec::with_capacity(child_records.len());
                for child in child_records {
                    if paged && matches!(records.get(child), Some(ElementRecord::Leaf(_))) {
                        // Paged containers hold pages, not loose leaves.
                        continue;
                    }
                    if let Some(child_node) = self.materialize(records, child, Some(node_id))? {
                        children.push(child_node);
                    }
                }
                if let Some(node) = self.nodes.get_mut(&node_id)
                    && let NodeBody::Container(c) = &mut node.body
                {
                    c.children = children;
                }
            }
            ElementRecord::Leaf(leaf) => {
                let leaf = leaf.clone();
                let visibility = NodeVisibility::resolve(&leaf.meta, self.binding.as_ref());
                let widget = LeafWidget::select(&leaf, self.binding.as_ref());
                let on_change = match leaf.kind {
                    // A button fires its action itself.
                    LeafKind::Button => None,
                    _ => leaf
                        .meta
                        .change_callback
                        .as_deref()
                        .and_then(|symbol| self.binding.invoke(symbol)),
                };
                self.nodes.insert(
                    node_id,
                    Node {
                        id: node_id,
                        parent,
                        rect: Rect::ZERO,
                        header_rect: Rect::ZERO,
                        hidden: false,
                        visibility,
                        body: NodeBody::Leaf(LeafNode {
                            record: leaf,
                            widget,
                            on_change,
                        }),
                    },
                );
            }
        }
        Ok(Some(node_id))
    }

    fn alloc(&mut self) -> TreeResult<NodeId> {
        let id = self.next_id;
        self.next_id = id.checked_next().ok_or(TreeError::NodeIdOverflow)?;
        Ok(id)
    }

    /// Root node of the live tree.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub(crate) fn binding(&self) -> &Rc<dyn TargetBinding> {
        &self.binding
    }

    /// Session mode.
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Whether structural mutation is allowed.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.mode, SessionMode::Edit)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for an opened session).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all live nodes in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Whether `ancestor` is on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while let Some(n) = self.node(current) {
            match n.parent {
                Some(p) if p == ancestor => return true,
                Some(p) => current = p,
                None => return false,
            }
        }
        false
    }

    /// Recompute visibility and both layout passes for the whole tree.
    ///
    /// Pass order is fixed: visibility first, then sizes bottom-up, then
    /// positions strictly top-down. The passes never interleave.
    pub fn refresh(&mut self, area: Rect) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "panel_refresh",
            nodes = self.nodes.len(),
            width = area.width,
            height = area.height
        )
        .entered();

        self.refresh_hidden();
        layout::refresh_size(self, self.root, area.width);
        layout::refresh_position(self, self.root, area.x, area.y);
    }

    fn refresh_hidden(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let hidden = node.visibility.is_hidden();
            if let Some(node) = self.nodes.get_mut(&id) {
                node.hidden = hidden;
            }
        }
    }

    /// Flatten the live tree back into records.
    ///
    /// The persisted set is a pure function of the tree: every container
    /// emits its current child order, and anything unreachable from the
    /// root is simply absent from the result. Reaching the same record
    /// GUID twice is a programming error.
    pub fn commit(&self) -> TreeResult<DocumentSnapshot> {
        let root = self
            .node(self.root)
            .ok_or(TreeError::UnknownNode { node: self.root })?
            .record_id();
        let mut records = RecordSet::new();
        self.collect_records(self.root, &mut records)?;
        Ok(DocumentSnapshot::new(root, records))
    }

    pub(crate) fn collect_records(&self, id: NodeId, out: &mut RecordSet) -> TreeResult<()> {
        let node = self.node(id).ok_or(TreeError::UnknownNode { node: id })?;
        let record: ElementRecord = match &node.body {
            NodeBody::Leaf(leaf) => leaf.record.clone().into(),
            NodeBody::Container(c) => {
                let mut record = c.record.clone();
                record.children = c
                    .children
                    .iter()
                    .filter_map(|&child| self.node(child).map(Node::record_id))
                    .collect();
                record.into()
            }
        };
        let record_id = record.id();
        if out.insert(record).is_some() {
            return Err(TreeError::DuplicateRecord { record: record_id });
        }
        if let NodeBody::Container(c) = &node.body {
            for &child in &c.children {
                self.collect_records(child, out)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("mode", &self.mode)
            .finish()
    }
}
