//! Geometry & alignment helpers.
//!
//! Hint-aware pose edits. A widget whose axis carries a hint is edited by
//! rewriting the hint (relative to the parent's frame) so the project
//! keeps its responsive layout; an unhinted axis is edited absolutely.

use crate::layout::{self, grid_dims};
use crate::model::*;
use crate::sandbox::LayoutFault;
use petgraph::graph::NodeIndex;

// ─── Alignment ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
    Free,
}

/// Which edge (or centre) a pose is pinned to on each axis.
pub fn alignment(g: &Geometry) -> (HAlign, VAlign) {
    let h = if g.pos_hint.x.is_some() {
        HAlign::Left
    } else if g.pos_hint.right.is_some() {
        HAlign::Right
    } else if g.pos_hint.center_x.is_some() {
        HAlign::Center
    } else {
        HAlign::Free
    };
    let v = if g.pos_hint.top.is_some() {
        VAlign::Top
    } else if g.pos_hint.y.is_some() {
        VAlign::Bottom
    } else if g.pos_hint.center_y.is_some() {
        VAlign::Middle
    } else {
        VAlign::Free
    };
    (h, v)
}

// ─── Sequence positions ──────────────────────────────────────────────────

/// Where a node sits inside a stacking (box) container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxPosition {
    pub size: usize,
    pub index: usize,
    pub at_front: bool,
    pub at_end: bool,
}

pub fn box_position(tree: &WidgetTree, node: NodeIndex) -> Option<BoxPosition> {
    let parent = tree.parent(node)?;
    if !matches!(tree.layout_of(parent), Some(LayoutKind::Box(_))) {
        return None;
    }
    let size = tree.children(parent).len();
    let index = tree.index_in_parent(node)?;
    Some(BoxPosition {
        size,
        index,
        at_front: index == 0,
        at_end: index + 1 == size,
    })
}

/// Where a node sits inside a grid container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub size: usize,
    pub index: usize,
    pub rows: usize,
    pub cols: usize,
    pub row: usize,
    pub col: usize,
    pub at_top: bool,
    pub at_bottom: bool,
    pub at_left: bool,
    pub at_right: bool,
    pub at_front: bool,
    pub at_end: bool,
}

pub fn grid_position(tree: &WidgetTree, node: NodeIndex) -> Option<GridPosition> {
    let parent = tree.parent(node)?;
    let Some(LayoutKind::Grid { rows, cols }) = tree.layout_of(parent) else {
        return None;
    };
    let size = tree.children(parent).len();
    let index = tree.index_in_parent(node)?;
    let (rows, cols) = grid_dims(rows, cols, size);
    let (row, col) = (index / cols, index % cols);
    Some(GridPosition {
        size,
        index,
        rows,
        cols,
        row,
        col,
        at_top: row == 0,
        // No cell below / to the right to move into.
        at_bottom: index + cols >= size,
        at_left: col == 0,
        at_right: col + 1 == cols || index + 1 == size,
        at_front: index == 0,
        at_end: index + 1 == size,
    })
}

/// Swap `node` with the sibling `delta` positions away. Returns `false`
/// (and changes nothing) when the destination is out of range.
pub fn swap_in_parent(tree: &mut WidgetTree, node: NodeIndex, delta: isize) -> bool {
    let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) else {
        return false;
    };
    let len = tree.children(parent).len() as isize;
    let dest = index as isize + delta;
    if delta == 0 || dest < 0 || dest >= len {
        return false;
    }
    tree.swap_children(parent, index, dest as usize)
}

// ─── Pose edits ──────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn hint(self, g: &Geometry) -> Option<f64> {
        match self {
            Axis::X => g.size_hint.x,
            Axis::Y => g.size_hint.y,
        }
    }

    fn set_hint(self, g: &mut Geometry, v: f64) {
        match self {
            Axis::X => g.size_hint.x = Some(v),
            Axis::Y => g.size_hint.y = Some(v),
        }
    }

    fn size(self, g: &Geometry) -> f64 {
        match self {
            Axis::X => g.size.width,
            Axis::Y => g.size.height,
        }
    }

    fn set_size(self, g: &mut Geometry, v: f64) {
        match self {
            Axis::X => g.size.width = v,
            Axis::Y => g.size.height = v,
        }
    }
}

fn relayout(tree: &mut WidgetTree, parent: Option<NodeIndex>) -> Result<(), LayoutFault> {
    match parent {
        Some(p) => layout::do_layout(tree, p),
        None => Ok(()),
    }
}

/// Resize `node`, preserving hints where present.
///
/// On a hinted axis the hint is scaled by `requested / current` and
/// clamped to [`MIN_SIZE_HINT`]. A hint already below the minimum is
/// reset to `1` and the parent re-laid out first, so the ratio is taken
/// against a meaningful size.
pub fn resize_widget(
    tree: &mut WidgetTree,
    node: NodeIndex,
    width: Option<f64>,
    height: Option<f64>,
) -> Result<(), LayoutFault> {
    let parent = tree.parent(node);
    if let Some(w) = width {
        resize_axis(tree, node, parent, Axis::X, w)?;
    }
    if let Some(h) = height {
        resize_axis(tree, node, parent, Axis::Y, h)?;
    }
    relayout(tree, parent)
}

fn resize_axis(
    tree: &mut WidgetTree,
    node: NodeIndex,
    parent: Option<NodeIndex>,
    axis: Axis,
    requested: f64,
) -> Result<(), LayoutFault> {
    let requested = requested.max(0.0);
    let Some(mut hint) = axis.hint(&tree.geometry(node)) else {
        axis.set_size(&mut tree.node_mut(node).geometry, requested);
        return Ok(());
    };
    if hint < MIN_SIZE_HINT {
        hint = 1.0;
        axis.set_hint(&mut tree.node_mut(node).geometry, hint);
        relayout(tree, parent)?;
    }
    let current = axis.size(&tree.geometry(node));
    if current > 0.0 {
        let scaled = (hint * requested / current).max(MIN_SIZE_HINT);
        let g = &mut tree.node_mut(node).geometry;
        axis.set_hint(g, scaled);
        axis.set_size(g, requested);
    }
    Ok(())
}

/// Move `node` to absolute `(x, y)` in playground space, translating the
/// active position-hint key of each axis relative to the parent frame.
///
/// Does not re-lay out the parent: stacking containers would snap the
/// node back, and the dragged node must follow the pointer.
pub fn move_widget(tree: &mut WidgetTree, node: NodeIndex, x: Option<f64>, y: Option<f64>) {
    let frame = tree.parent(node).map(|p| tree.geometry(p).rect());
    let g = &mut tree.node_mut(node).geometry;
    let (w, h) = (g.size.width, g.size.height);

    if let Some(x) = x {
        if let Some(frame) = frame.filter(|f| f.width() > 0.0) {
            let rel = |v: f64| (v - frame.x0) / frame.width();
            if g.pos_hint.right.is_some() {
                g.pos_hint.right = Some(rel(x + w));
            } else if g.pos_hint.center_x.is_some() {
                g.pos_hint.center_x = Some(rel(x + w / 2.0));
            } else if g.pos_hint.x.is_some() {
                g.pos_hint.x = Some(rel(x));
            }
        }
        g.pos.x = x;
    }

    if let Some(y) = y {
        if let Some(frame) = frame.filter(|f| f.height() > 0.0) {
            let rel = |v: f64| (v - frame.y0) / frame.height();
            if g.pos_hint.top.is_some() {
                g.pos_hint.top = Some(rel(y + h));
            } else if g.pos_hint.center_y.is_some() {
                g.pos_hint.center_y = Some(rel(y + h / 2.0));
            } else if g.pos_hint.y.is_some() {
                g.pos_hint.y = Some(rel(y));
            }
        }
        g.pos.y = y;
    }
}

/// Re-pin `node` to an edge or centre of its parent without moving it.
///
/// Replaces every position-hint key of the touched axis with the single
/// key matching the requested alignment, computed from the current
/// absolute pose. `Free` just clears the axis.
pub fn anchor_widget(
    tree: &mut WidgetTree,
    node: NodeIndex,
    h: Option<HAlign>,
    v: Option<VAlign>,
) -> Result<(), LayoutFault> {
    let Some(parent) = tree.parent(node) else {
        return Ok(());
    };
    let frame = tree.geometry(parent).rect();
    let g = &mut tree.node_mut(node).geometry;

    if let Some(h) = h {
        g.pos_hint.clear_horizontal();
        if frame.width() > 0.0 {
            let begin = (g.pos.x - frame.x0) / frame.width();
            let span = g.size.width / frame.width();
            match h {
                HAlign::Left => g.pos_hint.x = Some(begin),
                HAlign::Center => g.pos_hint.center_x = Some(begin + span / 2.0),
                HAlign::Right => g.pos_hint.right = Some(begin + span),
                HAlign::Free => {}
            }
        }
    }

    if let Some(v) = v {
        g.pos_hint.clear_vertical();
        if frame.height() > 0.0 {
            let begin = (g.pos.y - frame.y0) / frame.height();
            let span = g.size.height / frame.height();
            match v {
                VAlign::Bottom => g.pos_hint.y = Some(begin),
                VAlign::Middle => g.pos_hint.center_y = Some(begin + span / 2.0),
                VAlign::Top => g.pos_hint.top = Some(begin + span),
                VAlign::Free => {}
            }
        }
    }

    layout::do_layout(tree, parent)
}

/// `true` if `node` is a strict descendant of `container`.
pub fn widget_contains(tree: &WidgetTree, container: NodeIndex, node: NodeIndex) -> bool {
    tree.widget_contains(container, node)
}
