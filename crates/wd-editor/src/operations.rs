//! Gesture operations.
//!
//! An `Operation` is one undoable gesture. It is created at pointer-down
//! with its start snapshot, consumes pointer moves through
//! [`Operation::update`] (which may hand back a different kind: a move
//! that leaves its parent turns into a reparent), and is closed by
//! [`Operation::finish`], which reports whether anything changed.
//!
//! Live updates touch the tree only. The markup mirror is brought up to
//! date by `do_redo` / `do_undo`, which replay a snapshot onto both.

use crate::input::Pointer;
use crate::playground::{DragType, Playground};
use kurbo::Vec2;
use wd_core::geometry::{self, HAlign, VAlign};
use wd_core::{Geometry, LayoutKind, NodeIndex, Orientation, alignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Null,
    Translate,
    Resize,
    Index,
    Reparent,
}

/// Before / after state of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshots<S> {
    pub start: S,
    pub finish: Option<S>,
}

impl<S: PartialEq> Snapshots<S> {
    pub fn new(start: S) -> Self {
        Self { start, finish: None }
    }

    /// `true` once finished with a state different from the start.
    pub fn changed(&self) -> bool {
        self.finish.as_ref().is_some_and(|f| *f != self.start)
    }
}

#[derive(Debug)]
pub enum Operation {
    Null(NullOp),
    Translate(TranslateOp),
    Resize(ResizeOp),
    Index(IndexOp),
    Reparent(Box<ReparentOp>),
}

impl Operation {
    /// The operation a drag of `target` starts as, by its parent's layout.
    pub fn natural_for(pg: &Playground, target: NodeIndex) -> Self {
        match pg.tree.parent(target).and_then(|p| pg.tree.layout_of(p)) {
            Some(layout) if layout.is_free_form() => Operation::Translate(TranslateOp::new(pg, target)),
            Some(layout) if layout.is_stacking() => Operation::Index(IndexOp::new(pg, target)),
            _ => Operation::Null(NullOp {
                target: Some(target),
            }),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Null(_) => OperationKind::Null,
            Operation::Translate(_) => OperationKind::Translate,
            Operation::Resize(_) => OperationKind::Resize,
            Operation::Index(_) => OperationKind::Index,
            Operation::Reparent(_) => OperationKind::Reparent,
        }
    }

    pub fn target(&self) -> Option<NodeIndex> {
        match self {
            Operation::Null(op) => op.target,
            Operation::Translate(op) => Some(op.target),
            Operation::Resize(op) => Some(op.base.target),
            Operation::Index(op) => Some(op.target),
            Operation::Reparent(op) => Some(op.target),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::Null(_) => "nothing",
            Operation::Translate(_) => "move widget",
            Operation::Resize(_) => "resize widget",
            Operation::Index(_) => "reorder widget",
            Operation::Reparent(_) => "reparent widget",
        }
    }

    /// Feed a pointer move. Returns the operation that handles the rest
    /// of the gesture, which may be a different kind.
    pub fn update(self, pg: &mut Playground, pointer: Pointer) -> Operation {
        match self {
            Operation::Null(op) => op.update(pg, pointer),
            Operation::Translate(op) => op.update(pg, pointer),
            Operation::Resize(op) => op.update(pg, pointer),
            Operation::Index(op) => op.update(pg, pointer),
            Operation::Reparent(op) => op.update(pg, pointer),
        }
    }

    /// Capture the finish snapshot. Returns `true` if the gesture changed
    /// anything and should be recorded.
    pub fn finish(&mut self, pg: &mut Playground) -> bool {
        match self {
            Operation::Null(_) => false,
            Operation::Translate(op) => op.finish(pg),
            Operation::Resize(op) => op.base.finish(pg),
            Operation::Index(op) => op.finish(pg),
            Operation::Reparent(op) => op.finish(pg),
        }
    }

    /// Restore the start state in the tree and the mirror.
    pub fn do_undo(&self, pg: &mut Playground) {
        match self {
            Operation::Null(_) => {}
            Operation::Translate(op) => op.do_undo(pg),
            Operation::Resize(op) => op.base.do_undo(pg),
            Operation::Index(op) => op.do_undo(pg),
            Operation::Reparent(op) => op.do_undo(pg),
        }
    }

    /// Restore the finish state in the tree and the mirror.
    pub fn do_redo(&self, pg: &mut Playground) {
        match self {
            Operation::Null(_) => {}
            Operation::Translate(op) => op.do_redo(pg),
            Operation::Resize(op) => op.base.do_redo(pg),
            Operation::Index(op) => op.do_redo(pg),
            Operation::Reparent(op) => op.do_redo(pg),
        }
    }
}

fn escalate(pg: &mut Playground, op: Operation, pointer: Pointer) -> Operation {
    let Some(target) = op.target() else {
        return op;
    };
    log::debug!("{:?} left its parent, reparenting", pg.tree.node(target).id);
    let reparent = ReparentOp::begin(pg, target, Some(op), pointer, DragType::Reparent);
    Operation::Reparent(Box::new(reparent))
}

/// Write a pose back verbatim, letting siblings and children re-flow
/// around it.
fn apply_pose(pg: &mut Playground, target: NodeIndex, pose: Geometry) {
    if !pg.tree.contains_node(target) {
        return;
    }
    pg.tree.node_mut(target).geometry = pose;
    if let Some(parent) = pg.tree.parent(target) {
        pg.relayout(parent);
        pg.tree.node_mut(target).geometry = pose;
    }
    pg.relayout(target);
}

// ─── Null ────────────────────────────────────────────────────────────────

/// Echo operation for gestures that change nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullOp {
    pub target: Option<NodeIndex>,
}

impl NullOp {
    /// Nothing to do inside the parent; leaving it starts a reparent.
    fn update(self, pg: &mut Playground, pointer: Pointer) -> Operation {
        let Some(target) = self.target else {
            return Operation::Null(self);
        };
        let p = pg.to_local(pointer.pos);
        if let Some(parent) = pg.tree.parent(target)
            && !pg.tree.collide(parent, p)
            && pg.can_reparent(target)
        {
            return escalate(pg, Operation::Null(self), pointer);
        }
        Operation::Null(self)
    }
}

// ─── Translate ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TranslateOp {
    pub target: NodeIndex,
    pub poses: Snapshots<Geometry>,
    /// Effect applied up front (anchor buttons); pointer moves are ignored.
    frozen: bool,
}

impl TranslateOp {
    pub fn new(pg: &Playground, target: NodeIndex) -> Self {
        Self {
            target,
            poses: Snapshots::new(pg.tree.geometry(target)),
            frozen: false,
        }
    }

    /// Re-pin `target` to the given alignment right away.
    pub fn anchored(pg: &mut Playground, target: NodeIndex, h: Option<HAlign>, v: Option<VAlign>) -> Self {
        let mut op = Self::new(pg, target);
        op.frozen = true;
        pg.sandboxed(|pg| geometry::anchor_widget(&mut pg.tree, target, h, v));
        op
    }

    fn update(self, pg: &mut Playground, pointer: Pointer) -> Operation {
        if self.frozen {
            return Operation::Translate(self);
        }
        let p = pg.to_local(pointer.pos);
        if let Some(parent) = pg.tree.parent(self.target)
            && !pg.tree.collide(parent, p)
            && pg.can_reparent(self.target)
        {
            return escalate(pg, Operation::Translate(self), pointer);
        }
        let d = pg.local_delta(pointer.delta);
        let pos = pg.tree.geometry(self.target).pos;
        geometry::move_widget(&mut pg.tree, self.target, Some(pos.x + d.x), Some(pos.y + d.y));
        Operation::Translate(self)
    }

    fn finish(&mut self, pg: &mut Playground) -> bool {
        self.poses.finish = pg.tree.get(self.target).map(|w| w.geometry);
        self.poses.changed()
    }

    fn do_undo(&self, pg: &mut Playground) {
        apply_pose(pg, self.target, self.poses.start);
        pg.mirror_pose(self.target);
    }

    fn do_redo(&self, pg: &mut Playground) {
        if let Some(pose) = self.poses.finish {
            apply_pose(pg, self.target, pose);
            pg.mirror_pose(self.target);
        }
    }
}

// ─── Resize ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VEdge {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HEdge {
    Left,
    Right,
}

/// Drag of one edge or corner handle. Snapshots and replay are the
/// translate ones.
///
/// The edge opposite the handle stays put only on axes where the widget
/// is pinned to that side or free. A centred widget (`HAlign::Center`,
/// `VAlign::Middle`) keeps its centre through the re-layout instead, so
/// it grows on both sides and the dragged edge moves half as far as the
/// pointer.
#[derive(Debug, Clone)]
pub struct ResizeOp {
    pub base: TranslateOp,
    pub vertical: Option<VEdge>,
    pub horizontal: Option<HEdge>,
}

impl ResizeOp {
    pub fn new(pg: &Playground, target: NodeIndex, vertical: Option<VEdge>, horizontal: Option<HEdge>) -> Self {
        Self {
            base: TranslateOp::new(pg, target),
            vertical,
            horizontal,
        }
    }

    fn update(self, pg: &mut Playground, pointer: Pointer) -> Operation {
        let target = self.base.target;
        let p = pg.to_local(pointer.pos);
        let before = pg.tree.geometry(target);
        let (h_align, v_align) = alignment(&before);

        // Distance from the opposite edge, never negative.
        let height = self.vertical.map(|edge| {
            match edge {
                VEdge::Up => p.y - before.pos.y,
                VEdge::Down => before.top() - p.y,
            }
            .max(0.0)
        });
        let width = self.horizontal.map(|edge| {
            match edge {
                HEdge::Right => p.x - before.pos.x,
                HEdge::Left => before.right() - p.x,
            }
            .max(0.0)
        });
        if pg
            .sandboxed(|pg| geometry::resize_widget(&mut pg.tree, target, width, height))
            .is_none()
        {
            return Operation::Resize(self);
        }

        // Keep the edge opposite the handle where it was.
        let after = pg.tree.geometry(target);
        let y = match (self.vertical, v_align) {
            (Some(VEdge::Down), VAlign::Bottom | VAlign::Free) => Some(before.top() - after.size.height),
            (Some(VEdge::Up), VAlign::Top) => Some(before.pos.y),
            _ => None,
        };
        let x = match (self.horizontal, h_align) {
            (Some(HEdge::Left), HAlign::Left | HAlign::Free) => Some(before.right() - after.size.width),
            (Some(HEdge::Right), HAlign::Right) => Some(before.pos.x),
            _ => None,
        };
        if x.is_some() || y.is_some() {
            geometry::move_widget(&mut pg.tree, target, x, y);
        }
        Operation::Resize(self)
    }
}

// ─── Index ───────────────────────────────────────────────────────────────

/// Reorder within a stacking container.
#[derive(Debug, Clone)]
pub struct IndexOp {
    pub target: NodeIndex,
    pub indices: Snapshots<usize>,
    /// Pointer offset from the target's origin when the drag started.
    grab: Option<Vec2>,
    /// Reorder button: a swap applied up front, pointer moves ignored.
    frozen: bool,
}

impl IndexOp {
    pub fn new(pg: &Playground, target: NodeIndex) -> Self {
        Self {
            target,
            indices: Snapshots::new(pg.tree.index_in_parent(target).unwrap_or_default()),
            grab: None,
            frozen: false,
        }
    }

    /// Swap `target` with the sibling `delta` positions away. `None` when
    /// there is no such sibling.
    pub fn stepped(pg: &mut Playground, target: NodeIndex, delta: isize) -> Option<Self> {
        let mut op = Self::new(pg, target);
        op.frozen = true;
        if !geometry::swap_in_parent(&mut pg.tree, target, delta) {
            return None;
        }
        if let Some(parent) = pg.tree.parent(target) {
            pg.relayout(parent);
        }
        Some(op)
    }

    fn update(mut self, pg: &mut Playground, pointer: Pointer) -> Operation {
        if self.frozen {
            return Operation::Index(self);
        }
        let Some(parent) = pg.tree.parent(self.target) else {
            return Operation::Index(self);
        };
        let p = pg.to_local(pointer.pos);
        if !pg.tree.collide(parent, p) && pg.can_reparent(self.target) {
            return escalate(pg, Operation::Index(self), pointer);
        }

        let previous = pg.to_local(pointer.pos - pointer.delta);
        let grab = *self
            .grab
            .get_or_insert_with(|| previous - pg.tree.geometry(self.target).pos);

        let hovered = pg
            .tree
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| c != self.target && pg.tree.collide(c, p))
            .last();
        if let Some(sibling) = hovered
            && let Some(to) = pg.tree.index_in_parent(sibling)
        {
            pg.tree.detach(self.target);
            pg.tree.insert_child(parent, self.target, Some(to));
        }
        pg.relayout(parent);

        // Follow the pointer along the stacking axes only.
        let (along_x, along_y) = match pg.tree.layout_of(parent) {
            Some(LayoutKind::Box(Orientation::Horizontal)) => (true, false),
            Some(LayoutKind::Box(Orientation::Vertical)) => (false, true),
            Some(LayoutKind::Grid { .. }) => (true, true),
            _ => (false, false),
        };
        let pos = p - grab;
        geometry::move_widget(
            &mut pg.tree,
            self.target,
            along_x.then_some(pos.x),
            along_y.then_some(pos.y),
        );
        Operation::Index(self)
    }

    fn finish(&mut self, pg: &mut Playground) -> bool {
        if let Some(parent) = pg.tree.parent(self.target) {
            pg.relayout(parent);
        }
        self.indices.finish = pg.tree.index_in_parent(self.target);
        self.indices.changed()
    }

    fn do_undo(&self, pg: &mut Playground) {
        let from = self.indices.finish.unwrap_or(self.indices.start);
        self.apply(pg, from, self.indices.start);
    }

    fn do_redo(&self, pg: &mut Playground) {
        if let Some(to) = self.indices.finish {
            self.apply(pg, self.indices.start, to);
        }
    }

    fn apply(&self, pg: &mut Playground, from: usize, to: usize) {
        let (Some(parent), Some(current)) = (pg.tree.parent(self.target), pg.tree.index_in_parent(self.target))
        else {
            log::warn!("reorder: {:?} is no longer attached", pg.tree.get(self.target).map(|w| w.id));
            return;
        };
        if current != to {
            if self.frozen {
                pg.tree.swap_children(parent, current, to);
            } else {
                pg.tree.detach(self.target);
                pg.tree.insert_child(parent, self.target, Some(to));
            }
            pg.relayout(parent);
        }
        pg.mirror.shift_widget(&pg.tree, self.target, from);
        if self.frozen
            && let Some(&displaced) = pg.tree.children(parent).get(from)
            && displaced != self.target
        {
            pg.mirror.shift_widget(&pg.tree, displaced, to);
        }
    }
}

// ─── Reparent ────────────────────────────────────────────────────────────

/// Move across containers, including palette drops.
///
/// Holds the operation that was running when the widget left its parent
/// (`move_from`) and the one that runs in the new parent (`move_to`);
/// undo and redo replay them around the parent change.
#[derive(Debug)]
pub struct ReparentOp {
    pub target: NodeIndex,
    pub parents: Snapshots<Option<(NodeIndex, usize)>>,
    pub move_from: Option<Box<Operation>>,
    pub move_to: Option<Box<Operation>>,
    /// Pose when the widget entered the ghost.
    pub first_pose: Geometry,
    pub drag_type: DragType,
    committed: bool,
}

impl ReparentOp {
    /// Pull `target` into the drag ghost under the pointer.
    pub fn begin(
        pg: &mut Playground,
        target: NodeIndex,
        from: Option<Operation>,
        pointer: Pointer,
        drag_type: DragType,
    ) -> Self {
        let start = match pg.ghost() {
            Some(ghost) if ghost.widget == target => ghost.origin,
            _ => pg.tree.parent(target).zip(pg.tree.index_in_parent(target)),
        };
        pg.start_reparent(target, pointer.pos, drag_type);
        let first_pose = pg
            .ghost()
            .map(|g| g.first_pose)
            .unwrap_or_else(|| pg.tree.geometry(target));
        Self {
            target,
            parents: Snapshots::new(start),
            move_from: from.map(Box::new),
            move_to: None,
            first_pose,
            drag_type,
            committed: false,
        }
    }

    fn original_parent(&self) -> Option<NodeIndex> {
        self.parents.start.map(|(parent, _)| parent)
    }

    fn update(mut self: Box<Self>, pg: &mut Playground, pointer: Pointer) -> Operation {
        if pg.in_ghost(self.target) {
            pg.move_ghost(pointer.pos);
            if !self.place_widget(pg, pointer) {
                return Operation::Reparent(self);
            }
            follow_pointer(pg, self.target, pointer);

            // Back where it started: carry on as the original gesture.
            if pg.tree.parent(self.target) == self.original_parent()
                && let Some(original) = self.move_from.take()
            {
                log::debug!("{:?} returned to its parent", pg.tree.node(self.target).id);
                return *original;
            }
            self.move_to = Some(Box::new(Operation::natural_for(pg, self.target)));
            return Operation::Reparent(self);
        }

        let Some(op) = self.move_to.take() else {
            return Operation::Reparent(self);
        };
        match op.update(pg, pointer) {
            Operation::Reparent(nested) => {
                // Left the new parent: fold the nested drag into this one.
                log::trace!("discarding nested reparent of {:?}", pg.tree.node(nested.target).id);
                pg.adopt_ghost(self.drag_type, self.parents.start, self.first_pose);
            }
            next => self.move_to = Some(Box::new(next)),
        }
        Operation::Reparent(self)
    }

    /// Try to drop the ghosted widget under the pointer. A layout fault
    /// counts as an ineligible target and leaves the widget in the ghost.
    fn place_widget(&mut self, pg: &mut Playground, pointer: Pointer) -> bool {
        let target = self.target;
        match pg.sandboxed(|pg| pg.place_dragged(target, pointer.pos)) {
            Some(placed) => placed,
            None => {
                pg.park_in_ghost(target);
                false
            }
        }
    }

    fn finish(&mut self, pg: &mut Playground) -> bool {
        let Some(op) = &mut self.move_to else {
            return false;
        };
        op.finish(pg);
        let slot = pg
            .tree
            .parent(self.target)
            .zip(pg.tree.index_in_parent(self.target));
        self.parents.finish = Some(slot);
        self.committed = self.parents.changed();
        self.committed
    }

    fn do_undo(&self, pg: &mut Playground) {
        if let Some(op) = &self.move_to {
            op.do_undo(pg);
        }
        if self.committed {
            let parent = self.parents.finish.flatten().map(|(p, _)| p);
            pg.mirror
                .remove_widget_from_parent(&pg.tree, self.target, parent);
        }
        move_to_slot(pg, self.target, self.parents.start);
        if self.committed
            && let Some(parent) = self.original_parent()
        {
            pg.mirror
                .add_widget_to_parent(&pg.tree, self.target, Some(parent));
            pg.mirror_subtree_pose(self.target);
        }
        match self.move_from.as_deref() {
            Some(op) if op.kind() != OperationKind::Null => op.do_undo(pg),
            _ => {
                apply_pose(pg, self.target, self.first_pose);
                if self.committed && self.original_parent().is_some() {
                    pg.mirror_subtree_pose(self.target);
                }
            }
        }
    }

    fn do_redo(&self, pg: &mut Playground) {
        let Some(slot) = self.parents.finish else {
            return;
        };
        if self.committed {
            pg.mirror
                .remove_widget_from_parent(&pg.tree, self.target, self.original_parent());
        }
        move_to_slot(pg, self.target, slot);
        if self.committed
            && let Some((parent, _)) = slot
        {
            pg.mirror
                .add_widget_to_parent(&pg.tree, self.target, Some(parent));
            pg.mirror_subtree_pose(self.target);
        }
        if let Some(op) = &self.move_to {
            op.do_redo(pg);
        }
    }
}

/// Centre a widget dropped into a free-form container on the pointer.
fn follow_pointer(pg: &mut Playground, target: NodeIndex, pointer: Pointer) {
    let Some(parent) = pg.tree.parent(target) else {
        return;
    };
    if !pg.tree.layout_of(parent).is_some_and(|l| l.is_free_form()) {
        return;
    }
    let p = pg.to_local(pointer.pos);
    let size = pg.tree.geometry(target).size;
    geometry::move_widget(
        &mut pg.tree,
        target,
        Some(p.x - size.width / 2.0),
        Some(p.y - size.height / 2.0),
    );
}

/// Put `target` at `slot`, or leave it detached for `None`.
fn move_to_slot(pg: &mut Playground, target: NodeIndex, slot: Option<(NodeIndex, usize)>) {
    let current = pg.tree.parent(target).zip(pg.tree.index_in_parent(target));
    if current == slot {
        return;
    }
    let old = pg.detach_widget(target).map(|(parent, _)| parent);
    if let Some((parent, index)) = slot {
        pg.attach_widget(target, parent, Some(index));
        pg.relayout(parent);
    }
    if let Some(old) = old.filter(|&o| Some(o) != slot.map(|(p, _)| p)) {
        pg.relayout(old);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use kurbo::{Point, Rect};
    use wd_core::ClassRegistry;

    fn float_scene() -> (Playground, NodeIndex, NodeIndex) {
        let mut pg = Playground::new(
            EditorConfig::default(),
            ClassRegistry::with_defaults(),
            Rect::new(0.0, 0.0, 400.0, 300.0),
        );
        let root = pg.spawn("FloatLayout", None).unwrap();
        let button = pg.spawn("Button", Some(root)).unwrap();
        pg.set_geometry(button, Geometry::absolute((10.0, 10.0), (50.0, 50.0)));
        (pg, root, button)
    }

    #[test]
    fn snapshots_report_change_only_when_finished() {
        let mut s = Snapshots::new(3usize);
        assert!(!s.changed());
        s.finish = Some(3);
        assert!(!s.changed());
        s.finish = Some(1);
        assert!(s.changed());
    }

    #[test]
    fn natural_operation_follows_parent_layout() {
        let (mut pg, root, button) = float_scene();
        assert_eq!(Operation::natural_for(&pg, button).kind(), OperationKind::Translate);
        assert_eq!(Operation::natural_for(&pg, root).kind(), OperationKind::Null);

        let column = pg.spawn("BoxLayout", Some(root)).unwrap();
        let label = pg.spawn("Label", Some(column)).unwrap();
        assert_eq!(Operation::natural_for(&pg, label).kind(), OperationKind::Index);
    }

    #[test]
    fn resize_from_bottom_keeps_top_edge() {
        let (mut pg, _, button) = float_scene();
        let op = Operation::Resize(ResizeOp::new(&pg, button, Some(VEdge::Down), None));
        // Bottom edge from y=10 down to y=0: top stays at 60.
        let op = op.update(&mut pg, Pointer::moved(Point::new(30.0, 10.0), Point::new(30.0, 0.0)));
        assert_eq!(op.kind(), OperationKind::Resize);
        let g = pg.tree.geometry(button);
        assert_eq!(g.size.height, 60.0);
        assert_eq!(g.pos.y, 0.0);
        assert_eq!(g.top(), 60.0);
    }

    #[test]
    fn resize_never_goes_negative() {
        let (mut pg, _, button) = float_scene();
        let op = Operation::Resize(ResizeOp::new(&pg, button, None, Some(HEdge::Right)));
        op.update(&mut pg, Pointer::moved(Point::new(60.0, 30.0), Point::new(-40.0, 30.0)));
        assert_eq!(pg.tree.geometry(button).size.width, 0.0);
    }

    #[test]
    fn frozen_translate_ignores_pointer() {
        let (mut pg, _, button) = float_scene();
        let op = Operation::Translate(TranslateOp::anchored(&mut pg, button, Some(HAlign::Left), None));
        let anchored = pg.tree.geometry(button);
        assert_eq!(anchored.pos_hint.x, Some(10.0 / 400.0));
        let mut op = op.update(&mut pg, Pointer::moved(Point::new(0.0, 0.0), Point::new(50.0, 50.0)));
        assert_eq!(pg.tree.geometry(button), anchored);
        assert!(op.finish(&mut pg));
    }
}
