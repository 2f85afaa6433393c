#![forbid(unsafe_code)]

//! Rendering dispatch.
//!
//! The engine does not paint anything itself. [`draw`] walks the live tree
//! in display order and hands each visible element to a [`PanelRenderer`],
//! which owns the actual widgets. Change callbacks fire here: a bound value
//! is sampled before and after the renderer touches a leaf, and the leaf's
//! callback runs when the two samples differ.

use panekit_core::geometry::Rect;
use panekit_core::id::NodeId;
use panekit_core::record::{Arrangement, LeafRecord};

use crate::layout::{HEADER_HEIGHT, HEADER_INDENT, LINE_HEIGHT, TAB_STRIP_HEIGHT};
use crate::node::{LeafWidget, NodeBody};
use crate::session::Session;

/// Borrowed view of one leaf handed to the renderer.
#[derive(Clone, Copy)]
pub struct LeafView<'a> {
    pub record: &'a LeafRecord,
    pub widget: &'a LeafWidget,
}

/// Host-side widget backend.
///
/// Implementations draw into whatever UI system the host runs; rects are in
/// the coordinate space the last [`Session::refresh`] was given.
pub trait PanelRenderer {
    /// Draw a container's header band.
    fn header(&mut self, rect: Rect, title: &str, expanded: bool);

    /// Draw one tab of a paged container's strip.
    fn tab(&mut self, rect: Rect, title: &str, selected: bool);

    /// Draw a leaf. `enabled` is false inside a hidden-but-disabling
    /// subtree; the renderer greys the widget out instead of skipping it.
    fn leaf(&mut self, rect: Rect, view: LeafView<'_>, enabled: bool);

    /// Draw placeholder text where no real content exists.
    fn placeholder(&mut self, rect: Rect, text: &str);
}

/// Walk the live tree and dispatch every visible element to `renderer`.
///
/// Skipped nodes and collapsed subtrees are not visited. Requires a
/// preceding [`Session::refresh`] for meaningful rects.
pub fn draw(session: &Session, renderer: &mut dyn PanelRenderer) {
    #[cfg(feature = "tracing")]
    let _span = tracing::trace_span!("panel_draw", nodes = session.len()).entered();

    draw_node(session, session.root(), renderer, true);
}

fn draw_node(session: &Session, id: NodeId, renderer: &mut dyn PanelRenderer, enabled: bool) {
    let Some(node) = session.node(id) else {
        return;
    };
    if node.is_skipped() {
        return;
    }
    let enabled = enabled && !node.hidden;

    match &node.body {
        NodeBody::Leaf(leaf) => {
            let view = LeafView {
                record: &leaf.record,
                widget: &leaf.widget,
            };
            match (&leaf.on_change, leaf.widget.member()) {
                (Some(on_change), Some(member)) if member.can_write() => {
                    let before = member.get();
                    renderer.leaf(node.rect, view, enabled);
                    if member.get() != before {
                        on_change();
                    }
                }
                _ => renderer.leaf(node.rect, view, enabled),
            }
        }
        NodeBody::Container(container) => {
            let show_header = container.record.show_header;
            if show_header {
                renderer.header(node.header_rect, node.display_name(), container.record.expanded);
                if !container.record.expanded {
                    return;
                }
            }
            match container.record.arrangement {
                Arrangement::Paged => {
                    draw_paged(session, renderer, node.rect, show_header, container, enabled);
                }
                Arrangement::VerticalStack | Arrangement::HorizontalStack => {
                    for &child in &container.children {
                        draw_node(session, child, renderer, enabled);
                    }
                }
            }
        }
    }
}

fn draw_paged(
    session: &Session,
    renderer: &mut dyn PanelRenderer,
    rect: Rect,
    show_header: bool,
    container: &crate::node::ContainerNode,
    enabled: bool,
) {
    let strip = Rect::new(
        rect.x + if show_header { HEADER_INDENT } else { 0.0 },
        rect.y + if show_header { HEADER_HEIGHT } else { 0.0 },
        (rect.width - if show_header { HEADER_INDENT } else { 0.0 }).max(0.0),
        TAB_STRIP_HEIGHT,
    );

    let pages: Vec<NodeId> = container
        .children
        .iter()
        .copied()
        .filter(|&page| session.node(page).is_some_and(|n| !n.is_skipped()))
        .collect();
    if pages.is_empty() {
        renderer.placeholder(
            Rect::new(strip.x, strip.y, strip.width, LINE_HEIGHT * 2.0),
            "No pages",
        );
        return;
    }

    let selected = container.children[container.selected_page.min(container.children.len() - 1)];
    let tab_width = strip.width / pages.len() as f32;
    for (i, &page) in pages.iter().enumerate() {
        let Some(page_node) = session.node(page) else {
            continue;
        };
        renderer.tab(
            Rect::new(strip.x + tab_width * i as f32, strip.y, tab_width, strip.height),
            page_node.display_name(),
            page == selected,
        );
    }
    draw_node(session, selected, renderer, enabled);
}

/// Renderer that records every dispatch instead of painting.
///
/// Used by tests and by hosts that want to hit-test or inspect the draw
/// order without a UI backend.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub ops: Vec<DrawOp>,
}

/// One recorded dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Header {
        rect: Rect,
        title: String,
        expanded: bool,
    },
    Tab {
        rect: Rect,
        title: String,
        selected: bool,
    },
    Leaf {
        rect: Rect,
        name: String,
        enabled: bool,
    },
    Placeholder {
        rect: Rect,
        text: String,
    },
}

impl RecordingRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PanelRenderer for RecordingRenderer {
    fn header(&mut self, rect: Rect, title: &str, expanded: bool) {
        self.ops.push(DrawOp::Header {
            rect,
            title: title.to_owned(),
            expanded,
        });
    }

    fn tab(&mut self, rect: Rect, title: &str, selected: bool) {
        self.ops.push(DrawOp::Tab {
            rect,
            title: title.to_owned(),
            selected,
        });
    }

    fn leaf(&mut self, rect: Rect, view: LeafView<'_>, enabled: bool) {
        self.ops.push(DrawOp::Leaf {
            rect,
            name: view.record.meta.display_name.clone(),
            enabled,
        });
    }

    fn placeholder(&mut self, rect: Rect, text: &str) {
        self.ops.push(DrawOp::Placeholder {
            rect,
            text: text.to_owned(),
        });
    }
}
