//! Playground: the live widget tree and everything that mutates its
//! structure.
//!
//! Owns the tree, the markup mirror and the undo log, and is the only
//! place where widgets are attached to or detached from containers.
//! Hit-testing for selection and for drops lives here too, as does the
//! drag ghost that carries a widget between containers.
//!
//! Window coordinates map to playground-local ones through `frame`,
//! `pan` and `scale`. Both spaces are y-up.

use crate::config::EditorConfig;
use crate::mirror::MarkupMirror;
use crate::treeview::WidgetTreeView;
use crate::undo::{UndoEntry, UndoLog, WidgetOperation};
use kurbo::{Point, Rect, Size, Vec2};
use serde_json::{Value, json};
use wd_core::layout;
use wd_core::{
    ClassRegistry, Geometry, KvDocument, LayoutFault, LayoutKind, NodeId, NodeIndex, NodeKind,
    PropertyKind, WidgetAttrs, WidgetCaps, WidgetNode, WidgetTree,
};

/// A recoverable fault raised by project code, kept for the host to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub class: String,
    pub message: String,
}

/// Where a drag came from, which decides where it may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragType {
    /// Fresh widget from the palette: any container accepts it.
    NewWidget,
    /// Widget pulled out of its parent mid-gesture: any layout-capable
    /// container accepts it.
    Reparent,
    /// Long-press drag: only the original parent accepts it.
    InPlace,
}

/// Transient wrapper around the widget being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGhost {
    /// The ghost container itself (detached from the tree).
    pub node: NodeIndex,
    pub widget: NodeIndex,
    pub drag_type: DragType,
    /// Parent and sibling index the widget was taken from.
    pub origin: Option<(NodeIndex, usize)>,
    /// Pose before the drag, restored before every placement attempt.
    pub first_pose: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    pub class: String,
    /// Serialized `WidgetAttrs`.
    pub attrs: Value,
    /// Mirror text of the copied widget, without id lines.
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Replay from the undo log: do not record.
    pub from_undo: bool,
    /// Change originated in the text: do not mirror.
    pub from_kv: bool,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    pub from_undo: bool,
    pub from_kv: bool,
}

enum Hit {
    Node(NodeIndex),
    /// A widget with closed drop semantics is on top.
    Blocked,
}

pub struct Playground {
    pub tree: WidgetTree,
    pub registry: ClassRegistry,
    pub mirror: Box<dyn MarkupMirror>,
    pub undo: UndoLog,
    pub config: EditorConfig,
    /// Window rectangle the playground is drawn in.
    pub frame: Rect,
    pub scale: f64,
    pub pan: Vec2,
    /// The project root widget, the sandbox's single child.
    pub root: Option<NodeIndex>,
    pub tree_view: Option<WidgetTreeView>,
    ghost: Option<DragGhost>,
    clipboard: Option<Clipboard>,
    diagnostics: Vec<Diagnostic>,
}

impl Playground {
    pub fn new(config: EditorConfig, registry: ClassRegistry, frame: Rect) -> Self {
        let mut sandbox = WidgetNode::new(
            NodeId::for_class("Sandbox"),
            "Sandbox",
            WidgetCaps::container(LayoutKind::Sandbox),
        );
        sandbox.geometry = Geometry::absolute(Point::ZERO, frame.size());
        let undo = UndoLog::new(config.undo_depth);
        Self {
            tree: WidgetTree::new(sandbox),
            registry,
            mirror: Box::new(KvDocument::new()),
            undo,
            config,
            frame,
            scale: 1.0,
            pan: Vec2::ZERO,
            root: None,
            tree_view: None,
            ghost: None,
            clipboard: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_mirror(mut self, mirror: Box<dyn MarkupMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    // ─── Coordinates ─────────────────────────────────────────────────────

    pub fn to_local(&self, p: Point) -> Point {
        ((p - self.frame.origin() - self.pan) / self.scale).to_point()
    }

    pub fn to_window(&self, p: Point) -> Point {
        self.frame.origin() + self.pan + p.to_vec2() * self.scale
    }

    pub fn to_window_rect(&self, r: Rect) -> Rect {
        Rect::from_points(self.to_window(r.origin()), self.to_window(Point::new(r.x1, r.y1)))
    }

    /// Window-space pointer delta in local units.
    pub fn local_delta(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    pub fn collide_window(&self, p: Point) -> bool {
        p.x >= self.frame.x0 && p.x <= self.frame.x1 && p.y >= self.frame.y0 && p.y <= self.frame.y1
    }

    // ─── Tree helpers ────────────────────────────────────────────────────

    /// Create a detached widget of `class`.
    pub fn instantiate(&mut self, class: &str) -> Option<NodeIndex> {
        let Some(node) = self.registry.instantiate(class) else {
            log::warn!("unknown widget class `{class}`");
            return None;
        };
        Some(self.tree.add_detached(node))
    }

    /// Create a widget and attach it without recording an undo entry.
    /// Used when building the tree from a project.
    pub fn spawn(&mut self, class: &str, parent: Option<NodeIndex>) -> Option<NodeIndex> {
        let widget = self.instantiate(class)?;
        let opts = AddOptions {
            from_undo: true,
            ..AddOptions::default()
        };
        if self.add_widget_to_parent(widget, parent, opts) {
            Some(widget)
        } else {
            self.tree.remove_subtree(widget);
            None
        }
    }

    /// Show the tree-view sidebar in `frame`, with rows as tall as the
    /// config says.
    pub fn show_tree_view(&mut self, frame: Rect) {
        self.tree_view = Some(WidgetTreeView::new(frame, self.config.tree_row_height));
    }

    /// Replace a widget's pose and let its parent re-lay out.
    pub fn set_geometry(&mut self, node: NodeIndex, geometry: Geometry) {
        self.tree.node_mut(node).geometry = geometry;
        if let Some(parent) = self.tree.parent(node) {
            self.relayout(parent);
        }
        self.mirror_pose(node);
    }

    /// Write `node`'s pose to the markup. Hints go first: an absolute
    /// value is only written when no hint overrides it, and is dropped
    /// from the text when one does.
    pub fn mirror_pose(&mut self, node: NodeIndex) {
        let Some(pose) = self.tree.get(node).map(|w| w.geometry) else {
            return;
        };
        let tree = &self.tree;
        let mirror = &mut self.mirror;
        mirror.set_property_value(tree, node, "size_hint", &pose.size_hint.to_json(), PropertyKind::List);
        if pose.size_hint.is_empty() {
            let size = json!([pose.size.width, pose.size.height]);
            mirror.set_property_value(tree, node, "size", &size, PropertyKind::List);
        } else {
            mirror.clear_property(tree, node, "size");
        }
        mirror.set_property_value(tree, node, "pos_hint", &pose.pos_hint.to_json(), PropertyKind::Dict);
        if pose.pos_hint.is_empty() {
            let pos = json!([pose.pos.x, pose.pos.y]);
            mirror.set_property_value(tree, node, "pos", &pos, PropertyKind::List);
        } else {
            mirror.clear_property(tree, node, "pos");
        }
    }

    /// [`Playground::mirror_pose`] for `node` and everything under it. A
    /// rule rebuilt by the mirror only carries `props`, so every re-insert
    /// goes through here.
    pub fn mirror_subtree_pose(&mut self, node: NodeIndex) {
        for idx in self.tree.descendants(node) {
            self.mirror_pose(idx);
        }
    }

    pub fn set_layout(&mut self, node: NodeIndex, layout: LayoutKind) {
        self.tree.node_mut(node).caps.layout = Some(layout);
        self.relayout(node);
    }

    /// Re-lay out `node`'s subtree. Returns `false` on a fault, which is
    /// recorded as a diagnostic.
    pub fn relayout(&mut self, node: NodeIndex) -> bool {
        self.sandboxed(|pg| layout::do_layout(&mut pg.tree, node))
            .is_some()
    }

    /// Run `f` inside the fault boundary. A fault is reported and turned
    /// into `None`.
    pub fn sandboxed<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, LayoutFault>) -> Option<T> {
        match f(self) {
            Ok(value) => Some(value),
            Err(fault) => {
                self.report(fault);
                None
            }
        }
    }

    pub fn report(&mut self, fault: LayoutFault) {
        log::warn!("{fault}");
        self.diagnostics.push(Diagnostic {
            class: fault.class().to_string(),
            message: fault.to_string(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // ─── Hit-testing ─────────────────────────────────────────────────────

    /// Widget under a window position, for selection.
    pub fn pick(&self, p: Point) -> Option<NodeIndex> {
        if !self.collide_window(p) {
            return None;
        }
        self.find_target(self.to_local(p), self.root?, None)
    }

    /// Deepest widget under local point `p` in `root`'s subtree.
    ///
    /// Children are tested back to front and a later match overrides an
    /// earlier one, so the topmost painted child wins. Returns `root`
    /// itself when no child matches and `None` when `p` is outside it.
    /// With a `dragged` widget, a widget with closed drop semantics on
    /// top blocks the drop entirely.
    pub fn find_target(&self, p: Point, root: NodeIndex, dragged: Option<NodeIndex>) -> Option<NodeIndex> {
        match self.find_in(p, root, dragged)? {
            Hit::Node(node) => Some(node),
            Hit::Blocked => None,
        }
    }

    fn find_in(&self, p: Point, node: NodeIndex, dragged: Option<NodeIndex>) -> Option<Hit> {
        if !self.tree.collide(node, p) {
            return None;
        }
        let mut found = Hit::Node(node);
        for child in self.tree.visible_children(node) {
            if Some(child) == dragged {
                continue;
            }
            let widget = self.tree.node(child);
            if dragged.is_some() && !widget.caps.accepts_drops {
                if self.tree.collide(child, p) {
                    found = Hit::Blocked;
                }
                continue;
            }
            // Opaque composites are leaves, except that a drag may go
            // into a tabbed panel's visible tab.
            let opaque = widget.caps.kind() == NodeKind::Composite
                && !(dragged.is_some() && matches!(widget.caps.layout, Some(LayoutKind::Tabbed { .. })));
            if opaque {
                if self.tree.collide(child, p) && self.allowed_target_for(child, dragged) {
                    found = Hit::Node(child);
                }
                continue;
            }
            if !self.allowed_target_for(child, dragged) && self.tree.children(child).is_empty() {
                continue;
            }
            if let Some(hit) = self.find_in(p, child, dragged) {
                found = hit;
            }
        }
        Some(found)
    }

    /// Whether `candidate` may receive `dragged`. Without a dragged
    /// widget every node is a target (plain hit-testing).
    pub fn allowed_target_for(&self, candidate: NodeIndex, dragged: Option<NodeIndex>) -> bool {
        let Some(widget) = self.tree.get(candidate) else {
            return false;
        };
        let Some(dragged) = dragged else {
            return true;
        };
        candidate != dragged && widget.caps.accepts_drops && widget.supports_layout()
    }

    /// Whether `widget` may be pulled out of its parent.
    pub fn can_reparent(&self, widget: NodeIndex) -> bool {
        Some(widget) != self.root
            && self.tree.parent(widget).is_some()
            && !self.in_ghost(widget)
            && self.tree.is_attached(widget)
    }

    // ─── Drag ghost ──────────────────────────────────────────────────────

    pub fn ghost(&self) -> Option<&DragGhost> {
        self.ghost.as_ref()
    }

    pub fn is_ghost(&self, node: NodeIndex) -> bool {
        self.ghost.is_some_and(|g| g.node == node)
    }

    pub fn in_ghost(&self, widget: NodeIndex) -> bool {
        self.ghost
            .is_some_and(|g| self.tree.parent(widget) == Some(g.node))
    }

    /// Take `widget` out of its parent into a fresh drag ghost under the
    /// pointer. A widget already in the ghost keeps its origin.
    pub fn start_reparent(&mut self, widget: NodeIndex, pointer: Point, drag_type: DragType) {
        let previous = self.drop_ghost().filter(|g| g.widget == widget);
        let (origin, first_pose) = match previous {
            Some(g) => (g.origin, g.first_pose),
            None => {
                let first_pose = self.tree.geometry(widget);
                (self.detach_widget(widget), first_pose)
            }
        };

        let (w, h) = self.config.ghost_size;
        let mut node = WidgetNode::new(
            NodeId::for_class("DragGhost"),
            "DragGhost",
            WidgetCaps::container(LayoutKind::Ghost),
        );
        node.geometry = Geometry::absolute(Point::ZERO, Size::new(w, h));
        let ghost = self.tree.add_detached(node);
        self.tree.insert_child(ghost, widget, None);
        log::debug!("drag {:?} ({drag_type:?}) from {origin:?}", self.tree.node(widget).id);

        self.ghost = Some(DragGhost {
            node: ghost,
            widget,
            drag_type,
            origin,
            first_pose,
        });
        self.move_ghost(pointer);
    }

    /// Keep the ghost centred above the pointer.
    pub fn move_ghost(&mut self, pointer: Point) {
        let Some(ghost) = self.ghost else {
            return;
        };
        let local = self.to_local(pointer);
        let size = self.tree.geometry(ghost.node).size;
        let pos = Point::new(
            local.x - size.width / 2.0,
            local.y + self.config.ghost_offset / self.scale,
        );
        self.tree.node_mut(ghost.node).geometry.pos = pos;
        for child in self.tree.children(ghost.node).to_vec() {
            self.tree.node_mut(child).geometry.pos = pos;
        }
    }

    /// Overwrite the ghost's bookkeeping, used when a nested drag is
    /// folded back into the outer one.
    pub fn adopt_ghost(&mut self, drag_type: DragType, origin: Option<(NodeIndex, usize)>, first_pose: Geometry) {
        if let Some(ghost) = &mut self.ghost {
            ghost.drag_type = drag_type;
            ghost.origin = origin;
            ghost.first_pose = first_pose;
        }
    }

    /// Put `widget` back in the ghost, wherever it currently is.
    pub fn park_in_ghost(&mut self, widget: NodeIndex) {
        let Some(ghost) = self.ghost else {
            return;
        };
        if self.tree.parent(widget) == Some(ghost.node) {
            return;
        }
        self.detach_widget(widget);
        self.tree.insert_child(ghost.node, widget, None);
        let pos = self.tree.geometry(ghost.node).pos;
        self.tree.node_mut(widget).geometry.pos = pos;
    }

    /// Destroy the ghost. Widgets still inside it are left detached.
    pub fn drop_ghost(&mut self) -> Option<DragGhost> {
        let ghost = self.ghost.take()?;
        for child in self.tree.children(ghost.node).to_vec() {
            self.tree.detach(child);
        }
        self.tree.remove_subtree(ghost.node);
        Some(ghost)
    }

    // ─── Placement ───────────────────────────────────────────────────────

    /// Attach `widget` under `container`, routing into a tabbed panel's
    /// current tab and making a new screen current. Returns the node the
    /// widget actually went into.
    pub fn attach_widget(&mut self, widget: NodeIndex, container: NodeIndex, index: Option<usize>) -> NodeIndex {
        let mut parent = container;
        if let Some(LayoutKind::Tabbed { current }) = self.tree.layout_of(container)
            && self.tree.node(widget).class != "TabbedPanelItem"
            && let Some(&tab) = self.tree.children(container).get(current)
        {
            parent = tab;
        }
        self.tree.insert_child(parent, widget, index);
        if let Some(LayoutKind::ScreenManager { .. }) = self.tree.layout_of(parent) {
            self.tree.node_mut(parent).caps.layout = Some(LayoutKind::ScreenManager {
                current: Some(widget),
            });
        }
        if parent == self.tree.root {
            self.root = Some(widget);
        }
        parent
    }

    /// Detach `widget` from its parent, keeping a screen manager's
    /// current screen valid.
    pub fn detach_widget(&mut self, widget: NodeIndex) -> Option<(NodeIndex, usize)> {
        let (parent, index) = self.tree.detach(widget)?;
        if let Some(LayoutKind::ScreenManager { current: Some(current) }) = self.tree.layout_of(parent)
            && current == widget
        {
            let siblings = self.tree.children(parent);
            let next = siblings
                .get(index.saturating_sub(1))
                .or(siblings.first())
                .copied();
            self.tree.node_mut(parent).caps.layout = Some(LayoutKind::ScreenManager { current: next });
        }
        if parent == self.tree.root && self.root == Some(widget) {
            self.root = None;
        }
        Some((parent, index))
    }

    /// Move `widget` into `container` if that is a legal drop. Returns
    /// `false` (tree unchanged) for cycles and ineligible containers.
    pub fn try_place_widget(&mut self, widget: NodeIndex, container: NodeIndex, index: Option<usize>) -> bool {
        if container == widget || self.tree.widget_contains(widget, container) {
            log::debug!("refusing to drop {:?} into itself", self.tree.node(widget).id);
            return false;
        }
        if !self.allowed_target_for(container, Some(widget)) {
            return false;
        }
        let old_parent = self.detach_widget(widget).map(|(p, _)| p);
        let parent = self.attach_widget(widget, container, index);
        if let Some(old) = old_parent.filter(|&p| p != parent) {
            self.relayout(old);
        }
        self.relayout(parent)
    }

    /// Container (and hovered child) under a window position for a drop
    /// of `widget`, from the playground or the tree-view sidebar.
    fn drop_container(&self, widget: NodeIndex, p: Point) -> Option<(NodeIndex, Option<NodeIndex>)> {
        let Some(root) = self.root else {
            // Empty playground: a new widget becomes the root.
            return self.collide_window(p).then_some((self.tree.root, None));
        };

        if let Some(view) = self.tree_view
            && view.contains(p)
        {
            let mut node = view.node_at(&self.tree, root, p)?;
            let mut hovered = None;
            loop {
                if self.allowed_target_for(node, Some(widget)) {
                    return Some((node, hovered));
                }
                hovered = Some(node);
                node = self.tree.parent(node).filter(|&n| n != self.tree.root)?;
            }
        }

        if !self.collide_window(p) {
            return None;
        }
        let local = self.to_local(p);
        let container = self.find_target(local, root, Some(widget))?;
        let hovered = self
            .tree
            .children(container)
            .iter()
            .copied()
            .filter(|&c| c != widget && self.tree.collide(c, local))
            .last();
        Some((container, hovered))
    }

    /// Try to drop the ghosted `widget` at window position `p`.
    ///
    /// Returns `Ok(true)` when the widget landed in a real container and
    /// the ghost is gone, `Ok(false)` when it stays in the ghost. Runs
    /// container layout, so callers wrap it in [`Playground::sandboxed`].
    pub fn place_dragged(&mut self, widget: NodeIndex, p: Point) -> Result<bool, LayoutFault> {
        let Some(ghost) = self.ghost else {
            return Ok(false);
        };
        let Some((container, hovered)) = self.drop_container(widget, p) else {
            return Ok(false);
        };
        if container == widget || self.tree.widget_contains(widget, container) {
            return Ok(false);
        }
        let can_place = match ghost.drag_type {
            DragType::NewWidget | DragType::Reparent => self.allowed_target_for(container, Some(widget)),
            DragType::InPlace => {
                ghost.origin.is_some_and(|(parent, _)| parent == container)
                    && self.allowed_target_for(container, Some(widget))
            }
        };

        self.tree.node_mut(widget).geometry = ghost.first_pose;
        if !can_place {
            let pos = self.tree.geometry(ghost.node).pos;
            self.tree.node_mut(widget).geometry.pos = pos;
            return Ok(false);
        }

        let index = match ghost.origin {
            Some((parent, index))
                if parent == container && self.tree.layout_of(parent).is_some_and(|l| l.is_free_form()) =>
            {
                Some(index)
            }
            _ => hovered.and_then(|h| self.tree.children(container).iter().position(|&c| c == h)),
        };

        self.tree.detach(widget);
        let parent = self.attach_widget(widget, container, index);
        log::debug!(
            "dropped {:?} into {:?} at {index:?}",
            self.tree.node(widget).id,
            self.tree.node(parent).id
        );
        layout::do_layout(&mut self.tree, parent)?;
        self.drop_ghost();
        Ok(true)
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Attach a detached widget under `target`, or as the project root
    /// when `target` is `None`. Mirrors and records the change unless the
    /// options say it came from the text or the undo log.
    pub fn add_widget_to_parent(&mut self, widget: NodeIndex, target: Option<NodeIndex>, opts: AddOptions) -> bool {
        if !self.tree.contains_node(widget) {
            return false;
        }
        let container = match target {
            Some(t) => t,
            None if self.root.is_some_and(|r| r != widget) => {
                log::warn!("playground already has a root widget");
                return false;
            }
            None => self.tree.root,
        };
        if container == widget || self.tree.widget_contains(widget, container) {
            log::warn!("cannot add {:?} inside itself", self.tree.node(widget).id);
            return false;
        }
        if self.tree.parent(widget).is_some() {
            log::warn!("{:?} was still attached", self.tree.node(widget).id);
            self.detach_widget(widget);
        }

        let parent = self.attach_widget(widget, container, opts.index);
        let index = self.tree.index_in_parent(widget).unwrap_or_default();
        if !opts.from_kv {
            self.mirror.add_widget_to_parent(&self.tree, widget, Some(parent));
        }
        self.relayout(parent);
        if !opts.from_kv {
            self.mirror_subtree_pose(widget);
        }
        if !opts.from_undo {
            self.record(UndoEntry::Widget(WidgetOperation::add(widget, parent, index)));
        }
        true
    }

    /// Detach `widget`, keeping it in the graph for redo. Returns where
    /// it was.
    pub fn remove_widget_from_parent(&mut self, widget: NodeIndex, opts: RemoveOptions) -> Option<(NodeIndex, usize)> {
        let Some(parent) = self.tree.parent(widget) else {
            log::warn!("remove: {:?} has no parent", self.tree.get(widget).map(|w| w.id));
            return None;
        };
        if !opts.from_kv {
            self.mirror
                .remove_widget_from_parent(&self.tree, widget, Some(parent));
        }
        let (parent, index) = self.detach_widget(widget)?;
        self.relayout(parent);
        if !opts.from_undo {
            self.record(UndoEntry::Widget(WidgetOperation::remove(widget, parent, index)));
        }
        Some((parent, index))
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Copy the class and attributes of `widget`, without id or children.
    pub fn do_copy(&mut self, widget: NodeIndex) -> bool {
        let Some(node) = self.tree.get(widget) else {
            return false;
        };
        let attrs = match serde_json::to_value(node.attrs()) {
            Ok(attrs) => attrs,
            Err(err) => {
                log::warn!("copy: cannot serialize {:?}: {err}", node.id);
                return false;
            }
        };
        let text = self
            .mirror
            .widget_text(&self.tree, widget)
            .lines()
            .filter(|line| !line.trim_start().starts_with("id:"))
            .map(|line| format!("{line}\n"))
            .collect();
        self.clipboard = Some(Clipboard {
            class: node.class.clone(),
            attrs,
            text,
        });
        true
    }

    pub fn do_cut(&mut self, widget: NodeIndex) -> bool {
        self.do_copy(widget) && self.do_delete(widget)
    }

    /// Paste the clipboard into the nearest suitable ancestor of
    /// `selection` (or as the root of an empty playground).
    pub fn do_paste(&mut self, selection: Option<NodeIndex>) -> Option<NodeIndex> {
        let clip = self.clipboard.clone()?;
        let attrs: WidgetAttrs = match serde_json::from_value(clip.attrs) {
            Ok(attrs) => attrs,
            Err(err) => {
                log::warn!("paste: bad clipboard attributes: {err}");
                return None;
            }
        };
        let target = match self.root {
            None => None,
            Some(root) => Some(self.paste_target(selection.unwrap_or(root))?),
        };
        let mut node = self.registry.instantiate(&clip.class)?;
        node.apply_attrs(attrs);
        let widget = self.tree.add_detached(node);
        if self.add_widget_to_parent(widget, target, AddOptions::default()) {
            Some(widget)
        } else {
            self.tree.remove_subtree(widget);
            None
        }
    }

    /// First ancestor of `from` (inclusive) that lays out children and is
    /// not a project class, unless it is the root.
    pub fn paste_target(&self, from: NodeIndex) -> Option<NodeIndex> {
        let mut node = from;
        loop {
            if node == self.tree.root {
                return None;
            }
            let widget = self.tree.get(node)?;
            if widget.supports_layout() && (!self.registry.is_custom(&widget.class) || Some(node) == self.root) {
                return Some(node);
            }
            node = self.tree.parent(node)?;
        }
    }

    pub fn do_delete(&mut self, widget: NodeIndex) -> bool {
        self.remove_widget_from_parent(widget, RemoveOptions::default())
            .is_some()
    }

    pub fn do_select_all(&self) -> Option<NodeIndex> {
        self.root
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Push `entry` onto the undo log, then free detached widgets that
    /// only the dropped history could have brought back.
    pub fn record(&mut self, entry: UndoEntry) {
        for dropped in self.undo.push(entry) {
            let Some(widget) = dropped.widget() else {
                continue;
            };
            if !self.tree.contains_node(widget) || self.tree.parent(widget).is_some() {
                continue;
            }
            if self.tree.descendants(widget).iter().any(|&n| self.undo.references(n)) {
                continue;
            }
            log::debug!("freeing {:?}, no history left", self.tree.node(widget).id);
            self.tree.remove_subtree(widget);
        }
    }

    /// Undo the last entry. Returns its description.
    pub fn do_undo(&mut self) -> Option<String> {
        let entry = self.undo.begin_undo()?;
        entry.undo(self);
        let description = self.undo.end_undo(entry);
        log::debug!("undo: {description}");
        Some(description)
    }

    pub fn do_redo(&mut self) -> Option<String> {
        let entry = self.undo.begin_redo()?;
        entry.redo(self);
        let description = self.undo.end_redo(entry);
        log::debug!("redo: {description}");
        Some(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn playground() -> Playground {
        Playground::new(
            EditorConfig::default(),
            ClassRegistry::with_defaults(),
            Rect::new(0.0, 0.0, 400.0, 300.0),
        )
    }

    #[test]
    fn window_local_transform_round_trips() {
        let mut pg = playground();
        pg.frame = Rect::new(50.0, 20.0, 450.0, 320.0);
        pg.pan = Vec2::new(10.0, 0.0);
        pg.scale = 2.0;
        let local = pg.to_local(Point::new(160.0, 60.0));
        assert_eq!(local, Point::new(50.0, 20.0));
        assert_eq!(pg.to_window(local), Point::new(160.0, 60.0));
        assert_eq!(pg.local_delta(Vec2::new(4.0, -2.0)), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn topmost_overlapping_child_wins() {
        let mut pg = playground();
        let root = pg.spawn("FloatLayout", None).unwrap();
        let back = pg.spawn("Button", Some(root)).unwrap();
        let front = pg.spawn("Button", Some(root)).unwrap();
        pg.set_geometry(back, Geometry::absolute((10.0, 10.0), (50.0, 50.0)));
        pg.set_geometry(front, Geometry::absolute((30.0, 30.0), (50.0, 50.0)));

        assert_eq!(pg.find_target(Point::new(40.0, 40.0), root, None), Some(front));
        assert_eq!(pg.find_target(Point::new(15.0, 15.0), root, None), Some(back));
        assert_eq!(pg.find_target(Point::new(200.0, 200.0), root, None), Some(root));
        assert_eq!(pg.find_target(Point::new(500.0, 500.0), root, None), None);
    }

    #[test]
    fn second_root_is_refused() {
        let mut pg = playground();
        let root = pg.spawn("FloatLayout", None).unwrap();
        assert_eq!(pg.root, Some(root));
        assert!(pg.spawn("BoxLayout", None).is_none());
        assert_eq!(pg.tree.children(pg.tree.root), &[root]);
    }

    #[test]
    fn paste_target_skips_leaves_and_project_classes() {
        let mut pg = playground();
        pg.registry.register_custom("LoginForm", "BoxLayout", None);
        let root = pg.spawn("FloatLayout", None).unwrap();
        let form = pg.spawn("LoginForm", Some(root)).unwrap();
        let button = pg.spawn("Button", Some(form)).unwrap();
        assert_eq!(pg.paste_target(button), Some(root));
        assert_eq!(pg.paste_target(root), Some(root));
    }
}
