#![forbid(unsafe_code)]

//! Two-pass layout over the live tree.
//!
//! Pass 1 ([`refresh_size`]) walks top-down but computes bottom-up: a
//! container's size is a function of its children's sizes. Pass 2
//! ([`refresh_position`]) is strictly top-down and runs only after pass 1
//! has finished for the whole tree; it assigns final coordinates from the
//! sizes pass 1 resolved.
//!
//! Skipped nodes (hidden without `hide_means_disable`) are excluded from
//! both passes. Hidden nodes that disable instead keep their space.

use panekit_core::geometry::SizeMode;
use panekit_core::id::NodeId;
use panekit_core::record::{Arrangement, LeafKind};

use crate::node::NodeBody;
use crate::session::Session;

/// Height of a container's header band.
pub const HEADER_HEIGHT: f32 = 18.0;
/// Horizontal shift applied to a headed container's content.
pub const HEADER_INDENT: f32 = 18.0;
/// Height of one text line; the intrinsic height of most leaves.
pub const LINE_HEIGHT: f32 = 18.0;
/// Height of a paged container's tab strip.
pub const TAB_STRIP_HEIGHT: f32 = LINE_HEIGHT;

/// Resolve the size of `id` and its live subtree, given the width the
/// parent offers.
pub(crate) fn refresh_size(session: &mut Session, id: NodeId, available_width: f32) {
    let Some(node) = session.node(id) else {
        return;
    };
    let padding = node.meta().padding;

    match &node.body {
        NodeBody::Leaf(leaf) => {
            // Spacers declare a floor of one line on both axes.
            let (width_mode, height_mode) = if leaf.record.kind == LeafKind::Spacer {
                let w = match leaf.record.width {
                    SizeMode::Fixed(px) => px.max(LINE_HEIGHT),
                    SizeMode::Auto => LINE_HEIGHT,
                };
                let h = match leaf.record.height {
                    SizeMode::Fixed(px) => px.max(LINE_HEIGHT),
                    SizeMode::Auto => LINE_HEIGHT,
                };
                (SizeMode::Fixed(w), SizeMode::Fixed(h))
            } else {
                (leaf.record.width, leaf.record.height)
            };
            let intrinsic = leaf.intrinsic_height();
            let width = (width_mode.resolve_width(available_width) - padding.horizontal_sum())
                .max(0.0);
            let height =
                (height_mode.resolve_height(intrinsic) - padding.vertical_sum()).max(0.0);
            if let Some(node) = session.node_mut(id) {
                node.rect.width = width;
                node.rect.height = height;
            }
        }
        NodeBody::Container(container) => {
            let arrangement = container.record.arrangement;
            let show_header = container.record.show_header;
            let expanded = container.record.expanded;
            let selected_page = container.selected_page;
            let children = container.children.clone();

            let inner_width = (available_width - padding.horizontal_sum()).max(0.0);

            // Collapsed: the whole element is the header band. The subtree
            // is not visited.
            if show_header && !expanded {
                if let Some(node) = session.node_mut(id) {
                    node.rect.width = inner_width;
                    node.rect.height = HEADER_HEIGHT;
                    node.header_rect.width = inner_width;
                    node.header_rect.height = HEADER_HEIGHT;
                }
                return;
            }

            let content_width = if show_header {
                (inner_width - HEADER_INDENT).max(0.0)
            } else {
                inner_width
            };

            let content_height = match arrangement {
                Arrangement::VerticalStack => {
                    size_vertical(session, &children, content_width)
                }
                Arrangement::HorizontalStack => {
                    size_horizontal(session, &children, content_width)
                }
                Arrangement::Paged => {
                    size_paged(session, &children, selected_page, content_width)
                }
            };

            let height = content_height + if show_header { HEADER_HEIGHT } else { 0.0 };
            if let Some(node) = session.node_mut(id) {
                node.rect.width = inner_width;
                node.rect.height = height;
                if show_header {
                    node.header_rect.width = inner_width;
                    node.header_rect.height = HEADER_HEIGHT;
                }
            }
        }
    }
}

/// Every child gets the same width; heights accumulate.
fn size_vertical(session: &mut Session, children: &[NodeId], content_width: f32) -> f32 {
    let mut total = 0.0;
    for &child in children {
        if is_skipped(session, child) {
            continue;
        }
        refresh_size(session, child, content_width);
        total += outer_height(session, child);
    }
    total
}

/// Fixed-width leaves consume their declared pixels first; the remainder is
/// divided equally among auto children. Containers always count as auto.
fn size_horizontal(session: &mut Session, children: &[NodeId], content_width: f32) -> f32 {
    let mut autos = Vec::new();
    let mut consumed = 0.0;
    for &child in children {
        if is_skipped(session, child) {
            continue;
        }
        if claims_fixed_width(session, child) {
            refresh_size(session, child, content_width);
            consumed += outer_width(session, child);
        } else {
            autos.push(child);
        }
    }
    // No auto children: nothing to divide.
    if !autos.is_empty() {
        let share = (content_width - consumed).max(0.0) / autos.len() as f32;
        for child in autos {
            refresh_size(session, child, share);
        }
    }

    let mut tallest: f32 = 0.0;
    for &child in children {
        if is_skipped(session, child) {
            continue;
        }
        tallest = tallest.max(outer_height(session, child));
    }
    tallest
}

/// Only the selected page is sized; the others are not visited until they
/// are selected. An empty paged container shows a two-line placeholder.
fn size_paged(
    session: &mut Session,
    children: &[NodeId],
    selected_page: usize,
    content_width: f32,
) -> f32 {
    if children.is_empty() {
        return LINE_HEIGHT * 2.0;
    }
    let selected = children[selected_page.min(children.len() - 1)];
    if is_skipped(session, selected) {
        return TAB_STRIP_HEIGHT;
    }
    refresh_size(session, selected, content_width);
    TAB_STRIP_HEIGHT + outer_height(session, selected)
}

/// Assign final coordinates to `id` and its live subtree. Requires sizes
/// from [`refresh_size`].
pub(crate) fn refresh_position(session: &mut Session, id: NodeId, x: f32, y: f32) {
    let Some(node) = session.node(id) else {
        return;
    };
    let padding = node.meta().padding;
    let x = x + padding.left;
    let y = y + padding.top;

    let NodeBody::Container(container) = &node.body else {
        if let Some(node) = session.node_mut(id) {
            node.rect.x = x;
            node.rect.y = y;
        }
        return;
    };

    let arrangement = container.record.arrangement;
    let show_header = container.record.show_header;
    let expanded = container.record.expanded;
    let selected_page = container.selected_page;
    let children = container.children.clone();

    if let Some(node) = session.node_mut(id) {
        node.rect.x = x;
        node.rect.y = y;
        if show_header {
            node.header_rect.x = x;
            node.header_rect.y = y;
        }
    }

    if show_header && !expanded {
        return;
    }
    let (content_x, content_y) = if show_header {
        (x + HEADER_INDENT, y + HEADER_HEIGHT)
    } else {
        (x, y)
    };

    match arrangement {
        Arrangement::VerticalStack => {
            let mut cursor = content_y;
            for &child in &children {
                if is_skipped(session, child) {
                    continue;
                }
                refresh_position(session, child, content_x, cursor);
                cursor += outer_height(session, child);
            }
        }
        Arrangement::HorizontalStack => {
            let mut cursor = content_x;
            for &child in &children {
                if is_skipped(session, child) {
                    continue;
                }
                refresh_position(session, child, cursor, content_y);
                cursor += outer_width(session, child);
            }
        }
        Arrangement::Paged => {
            if children.is_empty() {
                return;
            }
            let selected = children[selected_page.min(children.len() - 1)];
            if is_skipped(session, selected) {
                return;
            }
            refresh_position(session, selected, content_x, content_y + TAB_STRIP_HEIGHT);
        }
    }
}

fn is_skipped(session: &Session, id: NodeId) -> bool {
    session.node(id).is_none_or(|node| node.is_skipped())
}

/// Height a child occupies in its parent: resolved height plus the child's
/// own vertical padding.
fn outer_height(session: &Session, id: NodeId) -> f32 {
    session
        .node(id)
        .map_or(0.0, |node| node.rect.height + node.meta().padding.vertical_sum())
}

/// Width a child occupies in its parent: resolved width plus the child's
/// own horizontal padding.
fn outer_width(session: &Session, id: NodeId) -> f32 {
    session
        .node(id)
        .map_or(0.0, |node| node.rect.width + node.meta().padding.horizontal_sum())
}

/// Whether a child takes a declared width out of the row before the
/// remainder is divided. Spacers always do; their auto width defaults to a
/// fixed line.
fn claims_fixed_width(session: &Session, id: NodeId) -> bool {
    match session.node(id).map(|node| &node.body) {
        Some(NodeBody::Leaf(leaf)) => {
            leaf.record.kind == LeafKind::Spacer || !leaf.record.width.is_auto()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panekit_core::binding::MemoryBinding;
    use panekit_core::geometry::{Rect, Sides};
    use panekit_core::record::{
        ContainerRecord, ElementRecord, LeafRecord, RecordSet, VisibilityRule,
    };
    use std::rc::Rc;

    fn open(records: RecordSet, root: panekit_core::id::ElementId) -> Session {
        Session::open_editable(&records, root, Rc::new(MemoryBinding::new())).unwrap()
    }

    fn plain(mut container: ContainerRecord) -> ContainerRecord {
        container.show_header = false;
        container
    }

    fn sized_leaf(name: &str, width: SizeMode, height: SizeMode) -> LeafRecord {
        let mut leaf = LeafRecord::new(name, LeafKind::Label);
        leaf.width = width;
        leaf.height = height;
        leaf
    }

    #[test]
    fn leaf_auto_fills_width_and_line_height() {
        let leaf = sized_leaf("L", SizeMode::Auto, SizeMode::Auto);
        let mut root = plain(ContainerRecord::new("R", Arrangement::VerticalStack));
        root.children = vec![leaf.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), leaf.into()].into_iter().collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let child = session.node(session.root()).unwrap().children()[0];
        let rect = session.node(child).unwrap().rect;
        assert_eq!(rect, Rect::new(0.0, 0.0, 200.0, LINE_HEIGHT));
    }

    #[test]
    fn leaf_padding_subtracts_from_own_size_and_offsets_position() {
        let mut leaf = sized_leaf("L", SizeMode::Auto, SizeMode::Fixed(30.0));
        leaf.meta.padding = Sides::new(2.0, 3.0, 4.0, 5.0);
        let mut root = plain(ContainerRecord::new("R", Arrangement::VerticalStack));
        root.children = vec![leaf.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), leaf.into()].into_iter().collect(),
            root_id,
        );
        session.refresh(Rect::from_size(100.0, 400.0));
        let child = session.node(session.root()).unwrap().children()[0];
        let rect = session.node(child).unwrap().rect;
        assert_eq!(rect.x, 5.0);
        assert_eq!(rect.y, 2.0);
        assert_eq!(rect.width, 100.0 - 8.0);
        assert_eq!(rect.height, 30.0 - 6.0);
        // The parent accounts for the padding when summing.
        assert_eq!(session.node(session.root()).unwrap().rect.height, 30.0);
    }

    #[test]
    fn collapsed_container_is_exactly_the_header_band() {
        let leaf = sized_leaf("L", SizeMode::Auto, SizeMode::Fixed(500.0));
        let mut root = ContainerRecord::new("R", Arrangement::VerticalStack);
        root.expanded = false;
        root.children = vec![leaf.id];
        let root_id = root.id;
        let leaf_record_id = leaf.id;
        let mut session = open(
            [ElementRecord::from(root), leaf.into()].into_iter().collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        assert_eq!(root_node.rect.height, HEADER_HEIGHT);
        assert_eq!(root_node.header_rect.height, HEADER_HEIGHT);
        // The child was never visited.
        let child = root_node.children()[0];
        assert_eq!(session.node(child).unwrap().rect, Rect::ZERO);
        assert_eq!(session.node(child).unwrap().record_id(), leaf_record_id);
    }

    #[test]
    fn header_reserves_band_and_indent() {
        let leaf = sized_leaf("L", SizeMode::Auto, SizeMode::Fixed(20.0));
        let mut root = ContainerRecord::new("R", Arrangement::VerticalStack);
        root.children = vec![leaf.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), leaf.into()].into_iter().collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        assert_eq!(root_node.rect.height, HEADER_HEIGHT + 20.0);
        assert_eq!(root_node.header_rect, Rect::new(0.0, 0.0, 200.0, HEADER_HEIGHT));
        let child = root_node.children()[0];
        let rect = session.node(child).unwrap().rect;
        assert_eq!(rect.x, HEADER_INDENT);
        assert_eq!(rect.y, HEADER_HEIGHT);
        assert_eq!(rect.width, 200.0 - HEADER_INDENT);
    }

    #[test]
    fn vertical_stack_sums_heights_and_positions_below() {
        let a = sized_leaf("A", SizeMode::Auto, SizeMode::Fixed(20.0));
        let b = sized_leaf("B", SizeMode::Auto, SizeMode::Fixed(30.0));
        let mut root = plain(ContainerRecord::new("R", Arrangement::VerticalStack));
        root.children = vec![a.id, b.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), a.into(), b.into()]
                .into_iter()
                .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        assert_eq!(root_node.rect.height, 50.0);
        let second = root_node.children()[1];
        assert_eq!(session.node(second).unwrap().rect.y, 20.0);
    }

    #[test]
    fn horizontal_partition_fixed_then_equal_shares() {
        let fixed = sized_leaf("F", SizeMode::Fixed(50.0), SizeMode::Auto);
        let a = sized_leaf("A", SizeMode::Auto, SizeMode::Auto);
        let b = sized_leaf("B", SizeMode::Auto, SizeMode::Auto);
        let mut root = plain(ContainerRecord::new("R", Arrangement::HorizontalStack));
        root.children = vec![fixed.id, a.id, b.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), fixed.into(), a.into(), b.into()]
                .into_iter()
                .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(300.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        let widths: Vec<f32> = root_node
            .children()
            .iter()
            .map(|&c| session.node(c).unwrap().rect.width)
            .collect();
        assert_eq!(widths, vec![50.0, 125.0, 125.0]);
        let xs: Vec<f32> = root_node
            .children()
            .iter()
            .map(|&c| session.node(c).unwrap().rect.x)
            .collect();
        assert_eq!(xs, vec![0.0, 50.0, 175.0]);
        assert_eq!(widths.iter().sum::<f32>(), 300.0);
    }

    #[test]
    fn horizontal_all_fixed_skips_division() {
        let a = sized_leaf("A", SizeMode::Fixed(40.0), SizeMode::Auto);
        let b = sized_leaf("B", SizeMode::Fixed(60.0), SizeMode::Auto);
        let mut root = plain(ContainerRecord::new("R", Arrangement::HorizontalStack));
        root.children = vec![a.id, b.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), a.into(), b.into()]
                .into_iter()
                .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(300.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        let widths: Vec<f32> = root_node
            .children()
            .iter()
            .map(|&c| session.node(c).unwrap().rect.width)
            .collect();
        assert_eq!(widths, vec![40.0, 60.0]);
    }

    #[test]
    fn horizontal_height_is_tallest_child() {
        let a = sized_leaf("A", SizeMode::Auto, SizeMode::Fixed(20.0));
        let b = sized_leaf("B", SizeMode::Auto, SizeMode::Fixed(44.0));
        let mut root = plain(ContainerRecord::new("R", Arrangement::HorizontalStack));
        root.children = vec![a.id, b.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), a.into(), b.into()]
                .into_iter()
                .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(300.0, 400.0));
        assert_eq!(session.node(session.root()).unwrap().rect.height, 44.0);
    }

    #[test]
    fn empty_paged_uses_placeholder_height() {
        let root = plain(ContainerRecord::new("R", Arrangement::Paged));
        let root_id = root.id;
        let mut session = open([ElementRecord::from(root)].into_iter().collect(), root_id);
        session.refresh(Rect::from_size(300.0, 400.0));
        assert_eq!(
            session.node(session.root()).unwrap().rect.height,
            LINE_HEIGHT * 2.0
        );
    }

    #[test]
    fn paged_sizes_only_selected_page() {
        let mut one = plain(ContainerRecord::new("One", Arrangement::VerticalStack));
        let mut two = plain(ContainerRecord::new("Two", Arrangement::VerticalStack));
        let a = sized_leaf("A", SizeMode::Auto, SizeMode::Fixed(20.0));
        let b = sized_leaf("B", SizeMode::Auto, SizeMode::Fixed(80.0));
        one.children = vec![a.id];
        two.children = vec![b.id];
        let mut root = plain(ContainerRecord::new("R", Arrangement::Paged));
        root.children = vec![one.id, two.id];
        let root_id = root.id;
        let mut session = open(
            [
                ElementRecord::from(root),
                one.into(),
                two.into(),
                a.into(),
                b.into(),
            ]
            .into_iter()
            .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(300.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        assert_eq!(root_node.rect.height, TAB_STRIP_HEIGHT + 20.0);
        let second_page = root_node.children()[1];
        assert_eq!(session.node(second_page).unwrap().rect, Rect::ZERO);

        // Switching pages sizes the newly selected page and leaves the
        // other untouched by this frame.
        session.select_page(session.root(), 1).unwrap();
        session.refresh(Rect::from_size(300.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        assert_eq!(root_node.rect.height, TAB_STRIP_HEIGHT + 80.0);
        let selected = session.node(root_node.children()[1]).unwrap();
        assert_eq!(selected.rect.y, TAB_STRIP_HEIGHT);
        assert_eq!(selected.rect.height, 80.0);
    }

    #[test]
    fn skipped_child_is_excluded_hidden_disable_keeps_space() {
        let mut skipped = sized_leaf("S", SizeMode::Auto, SizeMode::Fixed(25.0));
        skipped.meta.visibility = VisibilityRule::AlwaysHide;
        let mut disabled = sized_leaf("D", SizeMode::Auto, SizeMode::Fixed(25.0));
        disabled.meta.visibility = VisibilityRule::AlwaysHide;
        disabled.meta.hide_means_disable = true;
        let shown = sized_leaf("V", SizeMode::Auto, SizeMode::Fixed(25.0));
        let mut root = plain(ContainerRecord::new("R", Arrangement::VerticalStack));
        root.children = vec![skipped.id, disabled.id, shown.id];
        let root_id = root.id;
        let mut session = open(
            [
                ElementRecord::from(root),
                skipped.into(),
                disabled.into(),
                shown.into(),
            ]
            .into_iter()
            .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        // Only the disabled and the shown child consume space.
        assert_eq!(root_node.rect.height, 50.0);
        let shown_node = session.node(root_node.children()[2]).unwrap();
        assert_eq!(shown_node.rect.y, 25.0);
    }

    #[test]
    fn spacer_defaults_to_one_line_and_clamps_up() {
        let auto = LeafRecord::new("S1", LeafKind::Spacer);
        let mut small = LeafRecord::new("S2", LeafKind::Spacer);
        small.height = SizeMode::Fixed(4.0);
        let mut root = plain(ContainerRecord::new("R", Arrangement::VerticalStack));
        root.children = vec![auto.id, small.id];
        let root_id = root.id;
        let mut session = open(
            [ElementRecord::from(root), auto.into(), small.into()]
                .into_iter()
                .collect(),
            root_id,
        );
        session.refresh(Rect::from_size(200.0, 400.0));
        let root_node = session.node(session.root()).unwrap();
        for &child in root_node.children() {
            assert_eq!(session.node(child).unwrap().rect.height, LINE_HEIGHT);
        }
    }
}
