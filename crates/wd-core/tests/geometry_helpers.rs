//! Integration tests: hint-aware pose edits and sequence positions.
//!
//! Builds small widget trees through the class registry and checks the
//! helpers against the poses the container layouts then derive.

use pretty_assertions::assert_eq;
use wd_core::geometry::{
    HAlign, VAlign, anchor_widget, box_position, grid_position, move_widget, resize_widget,
    swap_in_parent,
};
use wd_core::{
    ClassRegistry, Geometry, LayoutKind, NodeIndex, Orientation, SizeHint, WidgetTree, do_layout,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Sandbox with a 200×200 root of `class` at the origin.
fn tree_with_root(class: &str) -> (WidgetTree, ClassRegistry, NodeIndex) {
    let reg = ClassRegistry::with_defaults();
    let mut sandbox = reg.instantiate("Sandbox").unwrap();
    sandbox.geometry = Geometry::absolute((0.0, 0.0), (200.0, 200.0));
    let mut tree = WidgetTree::new(sandbox);
    let mut root = reg.instantiate(class).unwrap();
    root.geometry = Geometry::absolute((0.0, 0.0), (200.0, 200.0));
    let root = tree.add_node(tree.root, root);
    (tree, reg, root)
}

fn add(tree: &mut WidgetTree, reg: &ClassRegistry, parent: NodeIndex, g: Geometry) -> NodeIndex {
    let mut node = reg.instantiate("Button").unwrap();
    node.geometry = g;
    tree.add_node(parent, node)
}

fn half_width() -> Geometry {
    Geometry {
        size_hint: SizeHint {
            x: Some(0.5),
            y: None,
        },
        ..Geometry::absolute((0.0, 0.0), (0.0, 40.0))
    }
}

// ─── resize ──────────────────────────────────────────────────────────────

#[test]
fn resize_scales_hint_by_requested_ratio() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let child = add(&mut tree, &reg, root, half_width());
    do_layout(&mut tree, root).unwrap();
    assert!(approx(tree.geometry(child).size.width, 100.0));

    resize_widget(&mut tree, child, Some(150.0), None).unwrap();
    let g = tree.geometry(child);
    assert!(approx(g.size_hint.x.unwrap(), 0.75));
    assert!(approx(g.size.width, 150.0));
}

#[test]
fn resize_to_zero_clamps_hint() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let child = add(&mut tree, &reg, root, half_width());
    do_layout(&mut tree, root).unwrap();

    resize_widget(&mut tree, child, Some(0.0), None).unwrap();
    assert!(approx(tree.geometry(child).size_hint.x.unwrap(), 0.001));
}

#[test]
fn degenerate_hint_is_reset_before_scaling() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let mut g = half_width();
    g.size_hint.x = Some(0.0);
    let child = add(&mut tree, &reg, root, g);
    do_layout(&mut tree, root).unwrap();

    resize_widget(&mut tree, child, Some(50.0), None).unwrap();
    assert!(approx(tree.geometry(child).size_hint.x.unwrap(), 0.25));
    assert!(approx(tree.geometry(child).size.width, 50.0));
}

#[test]
fn unhinted_axis_resizes_absolutely() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let child = add(&mut tree, &reg, root, half_width());
    do_layout(&mut tree, root).unwrap();

    resize_widget(&mut tree, child, None, Some(70.0)).unwrap();
    let g = tree.geometry(child);
    assert_eq!(g.size_hint.y, None);
    assert!(approx(g.size.height, 70.0));
}

// ─── move / anchor ───────────────────────────────────────────────────────

#[test]
fn move_translates_active_hint_key() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let mut g = Geometry::absolute((0.0, 0.0), (20.0, 20.0));
    g.pos_hint.right = Some(1.0);
    let child = add(&mut tree, &reg, root, g);
    do_layout(&mut tree, root).unwrap();
    assert!(approx(tree.geometry(child).pos.x, 180.0));

    move_widget(&mut tree, child, Some(80.0), Some(30.0));
    do_layout(&mut tree, root).unwrap();
    let g = tree.geometry(child);
    assert!(approx(g.pos_hint.right.unwrap(), 0.5));
    assert!(approx(g.pos.x, 80.0));
    assert!(approx(g.pos.y, 30.0));
    assert_eq!(g.pos_hint.y, None);
}

#[test]
fn anchoring_keeps_the_pose() {
    let (mut tree, reg, root) = tree_with_root("FloatLayout");
    let child = add(
        &mut tree,
        &reg,
        root,
        Geometry::absolute((40.0, 60.0), (20.0, 10.0)),
    );

    anchor_widget(&mut tree, child, Some(HAlign::Right), Some(VAlign::Middle)).unwrap();
    let g = tree.geometry(child);
    assert!(approx(g.pos_hint.right.unwrap(), 0.3));
    assert!(approx(g.pos_hint.center_y.unwrap(), 0.325));
    assert!(approx(g.pos.x, 40.0));
    assert!(approx(g.pos.y, 60.0));

    anchor_widget(&mut tree, child, Some(HAlign::Free), None).unwrap();
    let g = tree.geometry(child);
    assert!(!g.pos_hint.has_horizontal());
    assert!(g.pos_hint.has_vertical());
}

// ─── sequence positions ──────────────────────────────────────────────────

#[test]
fn box_position_flags_ends() {
    let (mut tree, reg, root) = tree_with_root("BoxLayout");
    let kids: Vec<_> = (0..3)
        .map(|_| add(&mut tree, &reg, root, half_width()))
        .collect();
    let first = box_position(&tree, kids[0]).unwrap();
    assert!(first.at_front && !first.at_end);
    let last = box_position(&tree, kids[2]).unwrap();
    assert_eq!((last.index, last.size), (2, 3));
    assert!(last.at_end);
}

#[test]
fn grid_position_of_partial_last_row() {
    let (mut tree, reg, root) = tree_with_root("GridLayout");
    tree.node_mut(root).caps.layout = Some(LayoutKind::Grid {
        rows: None,
        cols: Some(3),
    });
    let kids: Vec<_> = (0..5)
        .map(|_| add(&mut tree, &reg, root, half_width()))
        .collect();
    let p = grid_position(&tree, kids[1]).unwrap();
    assert_eq!((p.rows, p.cols, p.row, p.col), (2, 3, 0, 1));
    assert!(p.at_top);
    assert!(!p.at_bottom);
    // Nothing below the third cell of the first row.
    assert!(grid_position(&tree, kids[2]).unwrap().at_bottom);
    assert!(grid_position(&tree, kids[4]).unwrap().at_right);
}

#[test]
fn reorder_forward_then_back_is_identity() {
    let (mut tree, reg, root) = tree_with_root("BoxLayout");
    tree.node_mut(root).caps.layout = Some(LayoutKind::Box(Orientation::Vertical));
    let kids: Vec<_> = (0..4)
        .map(|_| add(&mut tree, &reg, root, half_width()))
        .collect();
    let before = tree.children(root).to_vec();
    for (i, &kid) in kids.iter().enumerate() {
        for n in 1..(kids.len() - i) as isize {
            assert!(swap_in_parent(&mut tree, kid, n));
            assert!(swap_in_parent(&mut tree, kid, -n));
            assert_eq!(tree.children(root), before.as_slice());
        }
    }
    assert!(!swap_in_parent(&mut tree, kids[0], -1));
    assert!(!swap_in_parent(&mut tree, kids[3], 1));
}
