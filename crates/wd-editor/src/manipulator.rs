//! Manipulator: the per-session gesture coordinator.
//!
//! Owns the selection, the adorner set computed for it and the single
//! in-flight operation. Pointer-down either starts an operation on the
//! current adorner or re-selects; moves feed the operation; pointer-up
//! (or a host cancel) is the one exit point that records or rolls back
//! the gesture and clears the slot.

use crate::adorner::{Adorner, AdornerKind, AdornerPart, adorners_for};
use crate::input::{InputEvent, Pointer};
use crate::operations::{Operation, OperationKind, ReparentOp};
use crate::playground::{DragType, Playground};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::undo::UndoEntry;
use kurbo::Point;
use smallvec::{SmallVec, smallvec};
use std::time::Instant;
use wd_core::NodeIndex;

/// Called with the new selection whenever it changes.
pub type SelectionListener = Box<dyn FnMut(Option<NodeIndex>)>;

pub struct Manipulator {
    selection: Option<NodeIndex>,
    adorners: SmallVec<[AdornerKind; 4]>,
    current: usize,
    operation: Option<Operation>,
    last_pos: Option<Point>,
    /// When a held press turns into an in-place drag.
    long_press: Option<Instant>,
    listeners: Vec<SelectionListener>,
}

impl Default for Manipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Manipulator {
    pub fn new() -> Self {
        Self {
            selection: None,
            adorners: smallvec![AdornerKind::Null],
            current: 0,
            operation: None,
            last_pos: None,
            long_press: None,
            listeners: Vec::new(),
        }
    }

    pub fn selection(&self) -> Option<NodeIndex> {
        self.selection
    }

    pub fn adorners(&self) -> &[AdornerKind] {
        &self.adorners
    }

    /// The adorner currently shown.
    pub fn adorner(&self) -> Adorner {
        let kind = self
            .adorners
            .get(self.current)
            .copied()
            .unwrap_or(AdornerKind::Null);
        Adorner::new(kind, self.selection)
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.operation.is_some()
    }

    pub fn on_selection_changed(&mut self, listener: impl FnMut(Option<NodeIndex>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, pg: &Playground, target: Option<NodeIndex>) {
        if self.selection == target {
            self.refresh_adorners(pg);
            return;
        }
        self.selection = target;
        self.current = 0;
        self.refresh_adorners(pg);
        log::debug!("selected {:?}", target.and_then(|t| pg.tree.get(t)).map(|w| w.id));
        for listener in &mut self.listeners {
            listener(target);
        }
    }

    /// Recompute the adorner set, keeping the current kind if it still
    /// applies.
    pub fn refresh_adorners(&mut self, pg: &Playground) {
        let shown = self.adorners.get(self.current).copied();
        self.adorners = adorners_for(pg, self.selection);
        self.current = shown
            .and_then(|kind| self.adorners.iter().position(|&k| k == kind))
            .unwrap_or(0);
    }

    pub fn next_adorner(&mut self) -> AdornerKind {
        self.current = (self.current + 1) % self.adorners.len().max(1);
        self.adorner().kind
    }

    /// Drop a selection that no longer points into the tree.
    pub fn validate_selection(&mut self, pg: &Playground) {
        let stale = self.selection.is_some_and(|s| {
            !pg.tree.contains_node(s) || !(pg.tree.is_attached(s) || pg.in_ghost(s))
        });
        if stale {
            self.select(pg, None);
        } else {
            self.refresh_adorners(pg);
        }
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// # Panics
    /// If an operation is already in flight: gestures are single-pointer.
    pub fn begin_operation(&mut self, op: Operation) {
        assert!(self.operation.is_none(), "an operation is already in flight");
        log::trace!("begin {:?}", op.kind());
        self.operation = Some(op);
    }

    /// Feed one host event. Returns `true` if it was consumed.
    pub fn handle(&mut self, pg: &mut Playground, event: &InputEvent, now: Instant) -> bool {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(pg, Point::new(*x, *y), now),
            InputEvent::PointerMove { x, y } => self.pointer_move(pg, Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => self.pointer_up(pg, Point::new(*x, *y)),
            InputEvent::PointerCancel => self.cancel(pg),
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => match ShortcutMap::resolve(key, *ctrl, *shift, *alt, *meta) {
                Some(action) => self.dispatch(pg, action),
                None => false,
            },
        }
    }

    pub fn pointer_down(&mut self, pg: &mut Playground, p: Point, now: Instant) -> bool {
        self.last_pos = Some(p);
        let mut part = self.adorner().hit(pg, p);
        if part.is_none() {
            let hit = pg.pick(p);
            self.select(pg, hit);
            // Press-and-drag on a new widget moves it straight away.
            part = self
                .adorner()
                .hit(pg, p)
                .filter(|part| *part == AdornerPart::Center);
        }
        let Some(part) = part else {
            return self.selection.is_some();
        };
        let Some(op) = self.adorner().prepare_operation(pg, p) else {
            return false;
        };
        let hold = part == AdornerPart::Center
            && op.target().is_some_and(|t| pg.can_reparent(t))
            && matches!(op.kind(), OperationKind::Translate | OperationKind::Index | OperationKind::Null);
        self.long_press = hold.then(|| now + pg.config.long_press());
        self.begin_operation(op);
        true
    }

    pub fn pointer_move(&mut self, pg: &mut Playground, p: Point) -> bool {
        let Some(last) = self.last_pos else {
            return false;
        };
        self.last_pos = Some(p);
        let pointer = Pointer::moved(last, p);
        if pointer.delta.hypot2() > 0.0 {
            self.long_press = None;
        }
        let Some(op) = self.operation.take() else {
            return false;
        };
        let before = op.kind();
        let next = op.update(pg, pointer);
        if next.kind() != before {
            log::debug!("{before:?} became {:?}", next.kind());
        }
        self.operation = Some(next);
        self.refresh_adorners(pg);
        true
    }

    pub fn pointer_up(&mut self, pg: &mut Playground, p: Point) -> bool {
        if self.last_pos.is_some_and(|last| last != p) {
            self.pointer_move(pg, p);
        }
        self.finish_operation(pg)
    }

    /// The host revoked the gesture: roll back whatever it did.
    pub fn cancel(&mut self, pg: &mut Playground) -> bool {
        self.long_press = None;
        self.last_pos = None;
        let Some(op) = self.operation.take() else {
            return false;
        };
        op.do_undo(pg);
        self.cleanup(pg);
        true
    }

    /// Close the in-flight operation: record it if it changed anything,
    /// roll it back otherwise. Returns `true` if an entry was recorded.
    pub fn finish_operation(&mut self, pg: &mut Playground) -> bool {
        self.long_press = None;
        self.last_pos = None;
        let Some(mut op) = self.operation.take() else {
            return false;
        };
        let changed = op.finish(pg);
        if changed {
            op.do_redo(pg);
            log::debug!("recorded {}", op.description());
            pg.record(UndoEntry::Gesture(op));
        } else {
            op.do_undo(pg);
        }
        self.cleanup(pg);
        changed
    }

    /// Destroy the ghost and a palette widget that never landed.
    fn cleanup(&mut self, pg: &mut Playground) {
        if let Some(ghost) = pg.drop_ghost()
            && ghost.origin.is_none()
            && !pg.tree.is_attached(ghost.widget)
        {
            log::debug!("discarding unplaced {:?}", pg.tree.node(ghost.widget).id);
            pg.tree.remove_subtree(ghost.widget);
        }
        self.validate_selection(pg);
    }

    /// Promote a held press into an in-place drag once the long-press
    /// delay has passed. Returns `true` if it fired.
    pub fn tick(&mut self, pg: &mut Playground, now: Instant) -> bool {
        let (Some(deadline), Some(pos)) = (self.long_press, self.last_pos) else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.long_press = None;
        let Some(op) = self.operation.take() else {
            return false;
        };
        let Some(target) = op.target().filter(|&t| pg.can_reparent(t)) else {
            self.operation = Some(op);
            return false;
        };
        let drag = ReparentOp::begin(pg, target, Some(op), Pointer::at(pos), DragType::InPlace);
        self.operation = Some(Operation::Reparent(Box::new(drag)));
        self.refresh_adorners(pg);
        true
    }

    /// Start dragging a fresh widget of `class` from the palette.
    pub fn begin_palette_drag(&mut self, pg: &mut Playground, class: &str, p: Point) -> Option<NodeIndex> {
        let widget = pg.instantiate(class)?;
        let drag = ReparentOp::begin(pg, widget, None, Pointer::at(p), DragType::NewWidget);
        self.begin_operation(Operation::Reparent(Box::new(drag)));
        self.last_pos = Some(p);
        self.select(pg, Some(widget));
        Some(widget)
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Run an editing action. Ignored while a gesture is in flight.
    pub fn dispatch(&mut self, pg: &mut Playground, action: ShortcutAction) -> bool {
        if self.is_busy() {
            log::debug!("ignoring {action:?} during a gesture");
            return false;
        }
        let done = match action {
            ShortcutAction::Undo => pg.do_undo().is_some(),
            ShortcutAction::Redo => pg.do_redo().is_some(),
            ShortcutAction::Copy => self.selection.is_some_and(|s| pg.do_copy(s)),
            ShortcutAction::Cut => self.selection.is_some_and(|s| pg.do_cut(s)),
            ShortcutAction::Delete => self.selection.is_some_and(|s| pg.do_delete(s)),
            ShortcutAction::Paste => match pg.do_paste(self.selection) {
                Some(pasted) => {
                    self.select(pg, Some(pasted));
                    true
                }
                None => false,
            },
            ShortcutAction::SelectAll => {
                let root = pg.do_select_all();
                self.select(pg, root);
                root.is_some()
            }
            ShortcutAction::NextAdorner => {
                self.next_adorner();
                true
            }
            ShortcutAction::Deselect => {
                self.select(pg, None);
                true
            }
        };
        self.validate_selection(pg);
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::operations::NullOp;
    use kurbo::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wd_core::ClassRegistry;

    fn playground() -> Playground {
        Playground::new(
            EditorConfig::default(),
            ClassRegistry::with_defaults(),
            Rect::new(0.0, 0.0, 400.0, 300.0),
        )
    }

    #[test]
    #[should_panic(expected = "already in flight")]
    fn second_operation_is_fatal() {
        let mut m = Manipulator::new();
        m.begin_operation(Operation::Null(NullOp { target: None }));
        m.begin_operation(Operation::Null(NullOp { target: None }));
    }

    #[test]
    fn click_selects_and_notifies() {
        let mut pg = playground();
        let root = pg.spawn("FloatLayout", None).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut m = Manipulator::new();
        let sink = seen.clone();
        m.on_selection_changed(move |s| sink.borrow_mut().push(s));

        let now = Instant::now();
        m.pointer_down(&mut pg, Point::new(200.0, 150.0), now);
        m.pointer_up(&mut pg, Point::new(200.0, 150.0));
        assert_eq!(m.selection(), Some(root));
        assert_eq!(m.adorner().kind, AdornerKind::Root);
        assert!(!m.is_busy());
        assert!(pg.undo.is_empty());
        assert_eq!(*seen.borrow(), vec![Some(root)]);
    }

    #[test]
    fn next_adorner_cycles() {
        let mut pg = playground();
        let root = pg.spawn("FloatLayout", None).unwrap();
        let button = pg.spawn("Button", Some(root)).unwrap();
        let mut m = Manipulator::new();
        m.select(&pg, Some(button));
        assert_eq!(m.adorner().kind, AdornerKind::Resize);
        assert_eq!(m.next_adorner(), AdornerKind::Anchor);
        assert_eq!(m.next_adorner(), AdornerKind::Resize);
    }
}
