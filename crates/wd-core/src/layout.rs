//! Container layout.
//!
//! Derives each child's absolute pose from the container's frame, the
//! child's hints and the container's `LayoutKind`. Absolute values set on a
//! child survive only on axes the layout leaves free (no hint, or a
//! free-form container). Custom containers delegate to project code
//! through the fault sandbox.

use crate::model::*;
use crate::sandbox::{self, LayoutFault};
use kurbo::{Point, Rect};
use petgraph::graph::NodeIndex;

/// Layout code supplied by the project for a custom container class.
///
/// Registered with [`ClassRegistry::register_custom`](crate::ClassRegistry::register_custom)
/// and shared by every instance of the class. [`do_layout`] calls it in
/// place of the built-in arrangement for that container; children are
/// still laid out recursively afterwards.
///
/// The hook runs inside the fault sandbox: a returned `Err` and a panic
/// both become a [`LayoutFault`] naming the class, and on either one the
/// children keep the poses they had before the call.
pub trait CustomLayout: Send + Sync {
    /// Position `children`, given in sibling order with their current
    /// poses (hints included), inside the container's `frame`. Only the
    /// slice is written back; `Err` carries a message for the designer's
    /// diagnostics.
    fn layout(&self, frame: Rect, children: &mut [Geometry]) -> Result<(), String>;
}

/// Lay out `container`'s children, then recurse into them.
pub fn do_layout(tree: &mut WidgetTree, container: NodeIndex) -> Result<(), LayoutFault> {
    let Some(node) = tree.get(container) else {
        return Ok(());
    };
    let Some(layout) = node.caps.layout else {
        return Ok(());
    };
    let frame = node.geometry.rect();
    let hook = node.caps.hook.clone();
    let class = node.class.clone();
    let children = tree.children(container).to_vec();

    let mut poses: Vec<Geometry> = children.iter().map(|&c| tree.geometry(c)).collect();
    match hook {
        Some(hook) => sandbox::isolate(&class, || {
            hook.layout(frame, &mut poses)
                .map_err(|message| LayoutFault::Failed {
                    class: class.clone(),
                    message,
                })
        })?,
        None => arrange(layout, frame, &mut poses),
    }
    for (&child, pose) in children.iter().zip(poses) {
        tree.node_mut(child).geometry = pose;
    }

    for child in children {
        do_layout(tree, child)?;
    }
    Ok(())
}

/// Grid dimensions for `n` children: the fixed dimension wins, the other
/// is derived by ceiling division.
pub fn grid_dims(rows: Option<usize>, cols: Option<usize>, n: usize) -> (usize, usize) {
    match (rows, cols) {
        (_, Some(cols)) if cols > 0 => (n.div_ceil(cols).max(1), cols),
        (Some(rows), _) if rows > 0 => (rows, n.div_ceil(rows).max(1)),
        _ => (1, n.max(1)),
    }
}

fn arrange(layout: LayoutKind, frame: Rect, poses: &mut [Geometry]) {
    match layout {
        LayoutKind::Float => {
            for g in poses.iter_mut() {
                apply_size_hint(g, frame.width(), frame.height());
                apply_pos_hint(g, frame);
            }
        }
        LayoutKind::Box(Orientation::Horizontal) => {
            let fixed: f64 = poses
                .iter()
                .filter(|g| g.size_hint.x.is_none())
                .map(|g| g.size.width)
                .sum();
            let weight: f64 = poses.iter().filter_map(|g| g.size_hint.x).sum();
            let free = (frame.width() - fixed).max(0.0);
            let mut x = frame.x0;
            for g in poses.iter_mut() {
                if let Some(h) = g.size_hint.x {
                    g.size.width = share(free, h, weight);
                }
                if let Some(h) = g.size_hint.y {
                    g.size.height = frame.height() * h;
                }
                g.pos = Point::new(x, frame.y0);
                x += g.size.width;
            }
        }
        LayoutKind::Box(Orientation::Vertical) => {
            let fixed: f64 = poses
                .iter()
                .filter(|g| g.size_hint.y.is_none())
                .map(|g| g.size.height)
                .sum();
            let weight: f64 = poses.iter().filter_map(|g| g.size_hint.y).sum();
            let free = (frame.height() - fixed).max(0.0);
            // First child at the top.
            let mut y = frame.y1;
            for g in poses.iter_mut() {
                if let Some(h) = g.size_hint.y {
                    g.size.height = share(free, h, weight);
                }
                if let Some(h) = g.size_hint.x {
                    g.size.width = frame.width() * h;
                }
                y -= g.size.height;
                g.pos = Point::new(frame.x0, y);
            }
        }
        LayoutKind::Grid { rows, cols } => {
            let (rows, cols) = grid_dims(rows, cols, poses.len());
            let cell_w = frame.width() / cols as f64;
            let cell_h = frame.height() / rows as f64;
            for (i, g) in poses.iter_mut().enumerate() {
                let (row, col) = (i / cols, i % cols);
                apply_size_hint(g, cell_w, cell_h);
                g.pos = Point::new(
                    frame.x0 + col as f64 * cell_w,
                    frame.y1 - (row + 1) as f64 * cell_h,
                );
            }
        }
        LayoutKind::Anchor => {
            let center = frame.center();
            for g in poses.iter_mut() {
                apply_size_hint(g, frame.width(), frame.height());
                g.pos = Point::new(
                    center.x - g.size.width / 2.0,
                    center.y - g.size.height / 2.0,
                );
            }
        }
        LayoutKind::ScreenManager { .. }
        | LayoutKind::Tabbed { .. }
        | LayoutKind::Carousel { .. }
        | LayoutKind::Ghost
        | LayoutKind::Sandbox => {
            for g in poses.iter_mut() {
                apply_size_hint(g, frame.width(), frame.height());
                g.pos = frame.origin();
            }
        }
    }
}

fn share(free: f64, hint: f64, weight: f64) -> f64 {
    if weight > 0.0 { free * hint / weight } else { 0.0 }
}

fn apply_size_hint(g: &mut Geometry, width: f64, height: f64) {
    if let Some(h) = g.size_hint.x {
        g.size.width = width * h;
    }
    if let Some(h) = g.size_hint.y {
        g.size.height = height * h;
    }
}

fn apply_pos_hint(g: &mut Geometry, frame: Rect) {
    let hint = g.pos_hint;
    let (w, h) = (g.size.width, g.size.height);
    if let Some(x) = hint.x {
        g.pos.x = frame.x0 + x * frame.width();
    } else if let Some(right) = hint.right {
        g.pos.x = frame.x0 + right * frame.width() - w;
    } else if let Some(cx) = hint.center_x {
        g.pos.x = frame.x0 + cx * frame.width() - w / 2.0;
    }
    if let Some(top) = hint.top {
        g.pos.y = frame.y0 + top * frame.height() - h;
    } else if let Some(y) = hint.y {
        g.pos.y = frame.y0 + y * frame.height();
    } else if let Some(cy) = hint.center_y {
        g.pos.y = frame.y0 + cy * frame.height() - h / 2.0;
    }
}
