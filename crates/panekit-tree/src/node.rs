#![forbid(unsafe_code)]

//! Runtime tree nodes.
//!
//! A [`Node`] is the live counterpart of one persisted record: the record
//! data plus everything resolved against the target object at
//! materialization (leaf behavior, callbacks, visibility probes) and the
//! rectangles solved by the layout passes.

use std::fmt;
use std::rc::Rc;

use panekit_core::binding::{Callback, Member, TargetBinding, ValueKind, VisibilityProbe};
use panekit_core::geometry::Rect;
use panekit_core::id::{ElementId, NodeId};
use panekit_core::record::{
    ContainerRecord, ElementMeta, HelpSeverity, LeafKind, LeafPayload, LeafRecord, VisibilityRule,
};

use crate::layout::LINE_HEIGHT;

/// Visibility policy resolved against the binding.
#[derive(Clone)]
pub enum NodeVisibility {
    Show,
    Hide,
    /// Consulted every frame; returns whether the element is visible.
    Probe(VisibilityProbe),
}

impl NodeVisibility {
    pub(crate) fn resolve(meta: &ElementMeta, binding: &dyn TargetBinding) -> Self {
        match &meta.visibility {
            VisibilityRule::AlwaysShow => Self::Show,
            VisibilityRule::AlwaysHide => Self::Hide,
            VisibilityRule::Delegated { symbol, kind } => {
                // A missing predicate degrades to visible.
                match binding.visibility_probe(symbol, *kind) {
                    Some(probe) => Self::Probe(probe),
                    None => Self::Show,
                }
            }
        }
    }

    pub(crate) fn is_hidden(&self) -> bool {
        match self {
            Self::Show => false,
            Self::Hide => true,
            Self::Probe(probe) => !probe(),
        }
    }
}

impl fmt::Debug for NodeVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => f.write_str("Show"),
            Self::Hide => f.write_str("Hide"),
            Self::Probe(_) => f.write_str("Probe(..)"),
        }
    }
}

/// Leaf behavior, selected once at materialization.
///
/// Selection is total: every member kind maps to some behavior, and an
/// unresolvable target maps to [`LeafWidget::Unbound`].
#[derive(Clone)]
pub enum LeafWidget {
    /// Boolean field.
    Toggle { member: Rc<dyn Member> },
    /// Integer or float field.
    Number { member: Rc<dyn Member> },
    /// Any other member kind, edited by its type.
    Typed {
        member: Rc<dyn Member>,
        kind: ValueKind,
    },
    /// Field whose target did not resolve.
    Unbound,
    Button { action: Option<Callback> },
    Label,
    Spacer,
    HelpBox { severity: HelpSeverity },
}

impl LeafWidget {
    pub(crate) fn select(record: &LeafRecord, binding: &dyn TargetBinding) -> Self {
        match record.kind {
            LeafKind::Field => {
                let member = record
                    .target
                    .as_deref()
                    .and_then(|symbol| binding.resolve(symbol));
                match member {
                    None => Self::Unbound,
                    Some(member) => match member.kind() {
                        ValueKind::Bool => Self::Toggle { member },
                        ValueKind::Int | ValueKind::Float => Self::Number { member },
                        kind => Self::Typed { member, kind },
                    },
                }
            }
            LeafKind::Button => Self::Button {
                action: record
                    .meta
                    .change_callback
                    .as_deref()
                    .and_then(|symbol| binding.invoke(symbol)),
            },
            LeafKind::Label => Self::Label,
            LeafKind::Spacer => Self::Spacer,
            LeafKind::HelpBox => Self::HelpBox {
                severity: match record.payload {
                    LeafPayload::HelpBox { severity } => severity,
                    _ => HelpSeverity::None,
                },
            },
        }
    }

    /// The bound member, for behaviors that edit one.
    #[must_use]
    pub fn member(&self) -> Option<&Rc<dyn Member>> {
        match self {
            Self::Toggle { member } | Self::Number { member } | Self::Typed { member, .. } => {
                Some(member)
            }
            _ => None,
        }
    }

    /// Stable behavior name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Toggle { .. } => "toggle",
            Self::Number { .. } => "number",
            Self::Typed { .. } => "typed",
            Self::Unbound => "unbound",
            Self::Button { .. } => "button",
            Self::Label => "label",
            Self::Spacer => "spacer",
            Self::HelpBox { .. } => "help_box",
        }
    }
}

impl fmt::Debug for LeafWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime state of a container node.
#[derive(Debug, Clone)]
pub struct ContainerNode {
    pub record: ContainerRecord,
    /// Live children in display order. Owns the subtree through the arena.
    pub children: Vec<NodeId>,
    /// View state; not persisted.
    pub selected_page: usize,
}

/// Runtime state of a leaf node.
#[derive(Clone)]
pub struct LeafNode {
    pub record: LeafRecord,
    pub widget: LeafWidget,
    /// Fired after a bound value changes under the renderer. `None` for
    /// buttons: a button invokes its action itself.
    pub on_change: Option<Callback>,
}

impl LeafNode {
    /// Height this leaf claims when its height mode is `Auto`.
    #[must_use]
    pub fn intrinsic_height(&self) -> f32 {
        match self.record.kind {
            LeafKind::HelpBox => {
                let newlines = self.record.content.text.matches('\n').count();
                match newlines {
                    0 | 1 => 2.0 * LINE_HEIGHT,
                    2 => 2.5 * LINE_HEIGHT,
                    n => n as f32 * LINE_HEIGHT,
                }
            }
            _ => LINE_HEIGHT,
        }
    }
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("record", &self.record.id)
            .field("widget", &self.widget)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Container or leaf payload of a node.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Container(ContainerNode),
    Leaf(LeafNode),
}

/// One live node in a session's arena.
///
/// `parent` is a non-owning back-reference used for ancestry walks;
/// ownership flows parent to child through the arena map.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Solved bounds, valid after the last `refresh`.
    pub rect: Rect,
    /// Solved header band, valid when the record shows a header.
    pub header_rect: Rect,
    /// Result of the last visibility pass.
    pub hidden: bool,
    pub(crate) visibility: NodeVisibility,
    pub body: NodeBody,
}

impl Node {
    /// Shared meta of the underlying record.
    #[must_use]
    pub fn meta(&self) -> &ElementMeta {
        match &self.body {
            NodeBody::Container(c) => &c.record.meta,
            NodeBody::Leaf(l) => &l.record.meta,
        }
    }

    /// GUID of the underlying record.
    #[must_use]
    pub fn record_id(&self) -> ElementId {
        match &self.body {
            NodeBody::Container(c) => c.record.id,
            NodeBody::Leaf(l) => l.record.id,
        }
    }

    /// Display name shorthand.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.meta().display_name
    }

    /// Whether this node is a container.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.body, NodeBody::Container(_))
    }

    /// Child nodes in display order (empty for leaves).
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.body {
            NodeBody::Container(c) => &c.children,
            NodeBody::Leaf(_) => &[],
        }
    }

    /// Whether this node is removed from layout entirely.
    ///
    /// Hidden nodes whose record sets `hide_means_disable` keep their space
    /// and draw disabled instead.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.hidden && !self.meta().hide_means_disable
    }
}
