//! Widget tree sidebar.
//!
//! A flat, depth-first listing of the project tree drawn in its own
//! window rectangle. Drops onto it are resolved row by row.

use kurbo::{Point, Rect};
use wd_core::{NodeIndex, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetTreeView {
    /// Window rectangle of the sidebar.
    pub frame: Rect,
    pub row_height: f64,
}

impl WidgetTreeView {
    pub fn new(frame: Rect, row_height: f64) -> Self {
        Self { frame, row_height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.frame.x0 && p.x <= self.frame.x1 && p.y >= self.frame.y0 && p.y <= self.frame.y1
    }

    /// Rows in display order, starting with `root`.
    pub fn rows(&self, tree: &WidgetTree, root: NodeIndex) -> Vec<NodeIndex> {
        tree.descendants(root)
    }

    /// Node whose row lies under `p`. The first row is at the top.
    pub fn node_at(&self, tree: &WidgetTree, root: NodeIndex, p: Point) -> Option<NodeIndex> {
        if !self.contains(p) || self.row_height <= 0.0 {
            return None;
        }
        let row = ((self.frame.y1 - p.y) / self.row_height).floor() as usize;
        self.rows(tree, root).get(row).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wd_core::ClassRegistry;

    #[test]
    fn rows_map_top_down() {
        let reg = ClassRegistry::with_defaults();
        let mut tree = WidgetTree::new(reg.instantiate("Sandbox").unwrap());
        let root = tree.add_node(tree.root, reg.instantiate("BoxLayout").unwrap());
        let a = tree.add_node(root, reg.instantiate("Button").unwrap());
        let b = tree.add_node(root, reg.instantiate("Label").unwrap());

        let view = WidgetTreeView::new(Rect::new(0.0, 0.0, 100.0, 240.0), 24.0);
        assert_eq!(view.node_at(&tree, root, Point::new(5.0, 230.0)), Some(root));
        assert_eq!(view.node_at(&tree, root, Point::new(5.0, 200.0)), Some(a));
        assert_eq!(view.node_at(&tree, root, Point::new(5.0, 170.0)), Some(b));
        assert_eq!(view.node_at(&tree, root, Point::new(5.0, 20.0)), None);
        assert_eq!(view.node_at(&tree, root, Point::new(150.0, 230.0)), None);
    }
}
