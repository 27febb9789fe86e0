//! Widget tree data model.
//!
//! The designed UI is a tree of `WidgetNode`s stored in a petgraph
//! `StableDiGraph`. Edges go parent → child; sibling order is kept
//! explicitly per parent because it is both the paint order (index 0 is
//! painted first, so the last child is topmost) and the sequence that
//! stacking containers lay out.
//!
//! Geometry lives in playground-local space with a bottom-left origin:
//! `pos.y` is the bottom edge and `top = y + height`.

use crate::id::NodeId;
use crate::layout::CustomLayout;
use kurbo::{Point, Rect, Size};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Smallest size hint a resize may produce.
pub const MIN_SIZE_HINT: f64 = 0.001;

// ─── Hints ───────────────────────────────────────────────────────────────

/// Relative position hint. At most one key per axis is meaningful; the
/// helpers in [`crate::geometry`] keep it that way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PosHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

impl PosHint {
    pub fn is_empty(&self) -> bool {
        !self.has_horizontal() && !self.has_vertical()
    }

    pub fn has_horizontal(&self) -> bool {
        self.x.is_some() || self.center_x.is_some() || self.right.is_some()
    }

    pub fn has_vertical(&self) -> bool {
        self.y.is_some() || self.center_y.is_some() || self.top.is_some()
    }

    pub fn clear_horizontal(&mut self) {
        self.x = None;
        self.center_x = None;
        self.right = None;
    }

    pub fn clear_vertical(&mut self) {
        self.y = None;
        self.center_y = None;
        self.top = None;
    }

    /// Dictionary form: only the keys that are set.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Relative size hint; `None` on an axis means the absolute size wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeHint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl SizeHint {
    pub const NONE: SizeHint = SizeHint { x: None, y: None };

    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }

    /// List form `[x, y]` with `null` for a free axis.
    pub fn to_json(&self) -> Value {
        Value::Array(vec![opt_number(self.x), opt_number(self.y)])
    }
}

impl Default for SizeHint {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn opt_number(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// A widget's pose: absolute position and size plus the hints that, when
/// set, make the absolute values derived by the parent's layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub pos: Point,
    pub size: Size,
    #[serde(default)]
    pub pos_hint: PosHint,
    #[serde(default)]
    pub size_hint: SizeHint,
}

impl Geometry {
    /// Pose with no hints at all.
    pub fn absolute(pos: impl Into<Point>, size: impl Into<Size>) -> Self {
        Self {
            pos: pos.into(),
            size: size.into(),
            pos_hint: PosHint::default(),
            size_hint: SizeHint::NONE,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.pos, self.size)
    }

    pub fn right(&self) -> f64 {
        self.pos.x + self.size.width
    }

    pub fn top(&self) -> f64 {
        self.pos.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.pos.x + self.size.width / 2.0,
            self.pos.y + self.size.height / 2.0,
        )
    }

    /// Inclusive point-in-rect test.
    pub fn collide(&self, p: Point) -> bool {
        p.x >= self.pos.x && p.x <= self.right() && p.y >= self.pos.y && p.y <= self.top()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            pos: Point::ZERO,
            size: Size::new(100.0, 100.0),
            pos_hint: PosHint::default(),
            size_hint: SizeHint::default(),
        }
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// How a container arranges its children. Presence of a layout kind is
/// the "supports layout" capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutKind {
    /// Free-form: children keep absolute poses unless hinted.
    Float,
    /// Stacks children along one axis in sibling order.
    Box(Orientation),
    /// Row-major grid; at least one dimension is fixed.
    Grid {
        rows: Option<usize>,
        cols: Option<usize>,
    },
    Anchor,
    /// Logical child list is every screen; only `current` is displayed.
    ScreenManager { current: Option<NodeIndex> },
    /// Children are tab contents; only `current` is displayed.
    Tabbed { current: usize },
    Carousel { index: usize },
    /// Transient drag wrapper.
    Ghost,
    /// Host container of the project root.
    Sandbox,
}

impl LayoutKind {
    pub fn is_stacking(&self) -> bool {
        matches!(self, LayoutKind::Box(_) | LayoutKind::Grid { .. })
    }

    pub fn is_free_form(&self) -> bool {
        matches!(self, LayoutKind::Float)
    }
}

/// Opaque composites are hit-tested as leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Built-in widget with internal children the designer must not touch.
    Complex,
    /// Project-defined class whose children come from its own rule.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Container,
    Composite,
}

/// Per-node capabilities, resolved from the class registry once when the
/// node is instantiated.
#[derive(Clone)]
pub struct WidgetCaps {
    pub layout: Option<LayoutKind>,
    pub composite: Option<Composite>,
    /// `false` for widgets with closed drop semantics (file browsers).
    pub accepts_drops: bool,
    /// Project layout code for custom containers.
    pub hook: Option<Arc<dyn CustomLayout>>,
}

impl WidgetCaps {
    pub fn leaf() -> Self {
        Self {
            layout: None,
            composite: None,
            accepts_drops: true,
            hook: None,
        }
    }

    pub fn container(layout: LayoutKind) -> Self {
        Self {
            layout: Some(layout),
            ..Self::leaf()
        }
    }

    pub fn supports_layout(&self) -> bool {
        self.layout.is_some()
    }

    pub fn kind(&self) -> NodeKind {
        if self.composite.is_some() {
            NodeKind::Composite
        } else if self.layout.is_some() {
            NodeKind::Container
        } else {
            NodeKind::Leaf
        }
    }
}

impl Default for WidgetCaps {
    fn default() -> Self {
        Self::leaf()
    }
}

impl fmt::Debug for WidgetCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetCaps")
            .field("layout", &self.layout)
            .field("composite", &self.composite)
            .field("accepts_drops", &self.accepts_drops)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

// ─── Widget Nodes ────────────────────────────────────────────────────────

/// The serializable attributes of a widget: everything except identity,
/// class capabilities and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetAttrs {
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct WidgetNode {
    pub id: NodeId,
    pub class: String,
    pub geometry: Geometry,
    /// Free-form widget properties (`text`, `source`, ...).
    pub props: BTreeMap<String, Value>,
    pub caps: WidgetCaps,
}

impl WidgetNode {
    pub fn new(id: NodeId, class: impl Into<String>, caps: WidgetCaps) -> Self {
        Self {
            id,
            class: class.into(),
            geometry: Geometry::default(),
            props: BTreeMap::new(),
            caps,
        }
    }

    pub fn attrs(&self) -> WidgetAttrs {
        WidgetAttrs {
            geometry: self.geometry,
            props: self.props.clone(),
        }
    }

    pub fn apply_attrs(&mut self, attrs: WidgetAttrs) {
        self.geometry = attrs.geometry;
        self.props = attrs.props;
    }

    pub fn supports_layout(&self) -> bool {
        self.caps.supports_layout()
    }
}

// ─── Widget Tree ─────────────────────────────────────────────────────────

/// Owner of every widget the designer knows about, attached or not.
///
/// Detached nodes (a widget being dragged, a palette widget not yet
/// dropped, a removed widget kept alive for redo) have no parent edge.
#[derive(Debug, Clone)]
pub struct WidgetTree {
    pub graph: StableDiGraph<WidgetNode, ()>,

    /// The sandbox node hosting the project root.
    pub root: NodeIndex,

    pub id_index: HashMap<NodeId, NodeIndex>,

    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl WidgetTree {
    /// Tree whose root is the given sandbox node.
    pub fn new(sandbox: WidgetNode) -> Self {
        let mut graph = StableDiGraph::new();
        let id = sandbox.id;
        let root = graph.add_node(sandbox);
        let mut id_index = HashMap::new();
        id_index.insert(id, root);
        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Add a node with no parent.
    pub fn add_detached(&mut self, node: WidgetNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add a node as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: WidgetNode) -> NodeIndex {
        let idx = self.add_detached(node);
        self.insert_child(parent, idx, None);
        idx
    }

    /// Attach a detached node at `index` (clamped), or last.
    ///
    /// # Panics
    /// If `child` already has a parent: a node lives in at most one
    /// child list.
    pub fn insert_child(&mut self, parent: NodeIndex, child: NodeIndex, index: Option<usize>) {
        assert!(
            self.parent(child).is_none(),
            "{:?} is already attached",
            self.graph[child].id
        );
        self.graph.add_edge(parent, child, ());
        let order = self.child_order.entry(parent).or_default();
        let at = index.unwrap_or(order.len()).min(order.len());
        order.insert(at, child);
    }

    /// Detach `child` from its parent. Returns the former parent and the
    /// sibling index the child had.
    pub fn detach(&mut self, child: NodeIndex) -> Option<(NodeIndex, usize)> {
        let parent = self.parent(child)?;
        if let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
        let order = self.child_order.get_mut(&parent)?;
        let index = order.iter().position(|&c| c == child)?;
        order.remove(index);
        Some((parent, index))
    }

    /// Swap two siblings by position. Out-of-range positions are ignored.
    pub fn swap_children(&mut self, parent: NodeIndex, a: usize, b: usize) -> bool {
        match self.child_order.get_mut(&parent) {
            Some(order) if a < order.len() && b < order.len() => {
                order.swap(a, b);
                a != b
            }
            _ => false,
        }
    }

    /// Drop a node and all its descendants from the graph.
    pub fn remove_subtree(&mut self, idx: NodeIndex) {
        self.detach(idx);
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            if let Some(children) = self.child_order.remove(&n) {
                stack.extend(children);
            }
            if let Some(node) = self.graph.remove_node(n) {
                self.id_index.remove(&node.id);
            }
        }
    }

    pub fn contains_node(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    pub fn node(&self, idx: NodeIndex) -> &WidgetNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut WidgetNode {
        &mut self.graph[idx]
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&WidgetNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&WidgetNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn geometry(&self, idx: NodeIndex) -> Geometry {
        self.graph[idx].geometry
    }

    pub fn layout_of(&self, idx: NodeIndex) -> Option<LayoutKind> {
        self.get(idx).and_then(|n| n.caps.layout)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in sibling order, back-most first.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, idx: NodeIndex) -> Option<usize> {
        let parent = self.parent(idx)?;
        self.children(parent).iter().position(|&c| c == idx)
    }

    /// Children the host actually displays: one screen, tab or slide for
    /// paging containers, every child otherwise.
    pub fn visible_children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 8]> {
        let children = self.children(idx);
        match self.layout_of(idx) {
            Some(LayoutKind::ScreenManager { current }) => current
                .filter(|c| children.contains(c))
                .into_iter()
                .collect(),
            Some(LayoutKind::Tabbed { current }) | Some(LayoutKind::Carousel { index: current }) => {
                children.get(current).copied().into_iter().collect()
            }
            _ => children.iter().copied().collect(),
        }
    }

    /// `true` if `node` is a strict descendant of `container`.
    pub fn widget_contains(&self, container: NodeIndex, node: NodeIndex) -> bool {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if parent == container {
                return true;
            }
            current = parent;
        }
        false
    }

    /// `true` if the node hangs off the sandbox root.
    pub fn is_attached(&self, idx: NodeIndex) -> bool {
        idx == self.root || self.widget_contains(self.root, idx)
    }

    /// Depth-first pre-order walk starting at (and including) `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    pub fn collide(&self, idx: NodeIndex, p: Point) -> bool {
        self.get(idx).is_some_and(|n| n.geometry.collide(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> WidgetNode {
        WidgetNode::new(NodeId::intern(name), "Widget", WidgetCaps::leaf())
    }

    fn tree() -> WidgetTree {
        WidgetTree::new(WidgetNode::new(
            NodeId::intern("sandbox"),
            "Sandbox",
            WidgetCaps::container(LayoutKind::Sandbox),
        ))
    }

    #[test]
    fn insert_and_detach_keep_sibling_order() {
        let mut t = tree();
        let a = t.add_node(t.root, node("t_a"));
        let b = t.add_node(t.root, node("t_b"));
        let c = t.add_detached(node("t_c"));
        t.insert_child(t.root, c, Some(1));
        assert_eq!(t.children(t.root), &[a, c, b]);

        assert_eq!(t.detach(a), Some((t.root, 0)));
        assert_eq!(t.children(t.root), &[c, b]);
        assert_eq!(t.parent(a), None);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn double_attach_panics() {
        let mut t = tree();
        let a = t.add_node(t.root, node("t_dbl"));
        t.insert_child(t.root, a, None);
    }

    #[test]
    fn containment_is_strict_and_transitive() {
        let mut t = tree();
        let a = t.add_node(t.root, node("c_a"));
        let b = t.add_node(a, node("c_b"));
        let c = t.add_node(b, node("c_c"));
        assert!(t.widget_contains(a, c));
        assert!(!t.widget_contains(c, a));
        assert!(!t.widget_contains(a, a));
        assert_eq!(t.descendants(a), vec![a, b, c]);
    }

    #[test]
    fn remove_subtree_clears_index() {
        let mut t = tree();
        let a = t.add_node(t.root, node("r_a"));
        let b = t.add_node(a, node("r_b"));
        t.remove_subtree(a);
        assert!(!t.contains_node(a));
        assert!(!t.contains_node(b));
        assert!(t.index_of(NodeId::intern("r_b")).is_none());
        assert!(t.children(t.root).is_empty());
    }

    #[test]
    fn collide_is_inclusive() {
        let g = Geometry::absolute((10.0, 10.0), (20.0, 20.0));
        assert!(g.collide(Point::new(10.0, 30.0)));
        assert!(!g.collide(Point::new(30.1, 15.0)));
    }

    #[test]
    fn hint_json_forms() {
        let hint = PosHint {
            x: Some(0.5),
            ..PosHint::default()
        };
        assert_eq!(hint.to_json(), serde_json::json!({"x": 0.5}));
        let size = SizeHint {
            x: Some(0.25),
            y: None,
        };
        assert_eq!(size.to_json(), serde_json::json!([0.25, null]));
    }
}
