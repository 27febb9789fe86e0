//! Selection adorners.
//!
//! An adorner is the interactive overlay drawn around the selected
//! widget: resize handles, reorder buttons, anchor buttons. Which kinds
//! apply depends on the selection's parent. Every pose is recomputed from
//! the live tree on each call, so adorners follow layout changes and the
//! playground's pan and zoom without invalidation. All rectangles are in
//! window coordinates.

use crate::operations::{HEdge, IndexOp, NullOp, Operation, ResizeOp, TranslateOp, VEdge};
use crate::playground::Playground;
use kurbo::{Point, Rect};
use smallvec::{SmallVec, smallvec};
use wd_core::geometry::{box_position, grid_position};
use wd_core::{HAlign, LayoutKind, NodeIndex, Orientation, VAlign, alignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdornerKind {
    /// Nothing selected, or nothing applies.
    Null,
    /// The project root: no handles.
    Root,
    /// A widget riding in the drag ghost.
    DragGhost,
    /// Reorder buttons in a box layout.
    Stack,
    /// Reorder buttons in a grid layout.
    Grid,
    Resize,
    Anchor,
}

impl AdornerKind {
    /// Candidate kinds in display order.
    pub const ALL: [AdornerKind; 6] = [
        AdornerKind::Root,
        AdornerKind::DragGhost,
        AdornerKind::Stack,
        AdornerKind::Grid,
        AdornerKind::Resize,
        AdornerKind::Anchor,
    ];

    /// An exclusive adorner hides every other applicable one.
    pub fn exclusive(self) -> bool {
        matches!(self, AdornerKind::Root | AdornerKind::DragGhost)
    }

    pub fn applies_to(self, pg: &Playground, target: NodeIndex) -> bool {
        let parent = pg.tree.parent(target);
        let layout = parent.and_then(|p| pg.tree.layout_of(p));
        match self {
            AdornerKind::Null => true,
            AdornerKind::Root => parent.is_some() && parent == Some(pg.tree.root),
            AdornerKind::DragGhost => parent.is_some_and(|p| pg.is_ghost(p)),
            AdornerKind::Stack => matches!(layout, Some(LayoutKind::Box(_))),
            AdornerKind::Grid => matches!(layout, Some(LayoutKind::Grid { .. })),
            AdornerKind::Resize | AdornerKind::Anchor => layout.is_some_and(|l| l.is_free_form()),
        }
    }
}

/// The adorner set for a selection: the exclusive kind alone if one
/// applies, otherwise every applicable kind, never empty.
pub fn adorners_for(pg: &Playground, target: Option<NodeIndex>) -> SmallVec<[AdornerKind; 4]> {
    let Some(target) = target else {
        return smallvec![AdornerKind::Null];
    };
    let matching: SmallVec<[AdornerKind; 4]> = AdornerKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.applies_to(pg, target))
        .collect();
    if let Some(&exclusive) = matching.iter().find(|kind| kind.exclusive()) {
        return smallvec![exclusive];
    }
    if matching.is_empty() {
        smallvec![AdornerKind::Null]
    } else {
        matching
    }
}

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub vertical: Option<VEdge>,
    pub horizontal: Option<HEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockButton {
    pub direction: Direction,
    /// Sibling offset the button swaps with.
    pub delta: isize,
    pub rect: Rect,
    /// `false` at a sequence boundary.
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorButton {
    pub h: HAlign,
    pub v: VAlign,
    pub rect: Rect,
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdornerPart {
    Center,
    Handle(Handle),
    Block(BlockButton),
    Anchor(AnchorButton),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adorner {
    pub kind: AdornerKind,
    pub target: Option<NodeIndex>,
}

impl Adorner {
    pub fn new(kind: AdornerKind, target: Option<NodeIndex>) -> Self {
        Self { kind, target }
    }

    /// Window rectangle of the target.
    pub fn frame(&self, pg: &Playground) -> Option<Rect> {
        let widget = pg.tree.get(self.target?)?;
        Some(pg.to_window_rect(widget.geometry.rect()))
    }

    /// Selection outline: the frame grown by the configured border width.
    pub fn outline(&self, pg: &Playground) -> Option<Rect> {
        let w = pg.config.border_width;
        self.frame(pg).map(|frame| frame.inflate(w, w))
    }

    /// Window rectangle of the target's parent, drawn while dragging.
    pub fn outline_area(&self, pg: &Playground) -> Option<Rect> {
        let parent = pg.tree.parent(self.target?)?;
        Some(pg.to_window_rect(pg.tree.geometry(parent).rect()))
    }

    pub fn handles(&self, pg: &Playground) -> SmallVec<[(Handle, Rect); 8]> {
        let mut out = SmallVec::new();
        if self.kind != AdornerKind::Resize {
            return out;
        }
        let Some(frame) = self.frame(pg) else {
            return out;
        };
        let side = pg.config.handle_width;
        let center = frame.center();
        let columns = [
            (Some(HEdge::Left), frame.x0),
            (None, center.x),
            (Some(HEdge::Right), frame.x1),
        ];
        let rows = [
            (Some(VEdge::Up), frame.y1),
            (None, center.y),
            (Some(VEdge::Down), frame.y0),
        ];
        for (vertical, y) in rows {
            for (horizontal, x) in columns {
                if vertical.is_none() && horizontal.is_none() {
                    continue;
                }
                let rect = Rect::from_center_size(Point::new(x, y), (side, side));
                out.push((
                    Handle {
                        vertical,
                        horizontal,
                    },
                    rect,
                ));
            }
        }
        out
    }

    /// Reorder buttons just outside the frame.
    pub fn block_buttons(&self, pg: &Playground) -> SmallVec<[BlockButton; 4]> {
        let (Some(target), Some(frame)) = (self.target, self.frame(pg)) else {
            return SmallVec::new();
        };
        let specs: SmallVec<[(Direction, isize, bool); 4]> = match self.kind {
            AdornerKind::Stack => {
                let Some(pos) = box_position(&pg.tree, target) else {
                    return SmallVec::new();
                };
                let vertical = pg.tree.parent(target).and_then(|p| pg.tree.layout_of(p))
                    == Some(LayoutKind::Box(Orientation::Vertical));
                if vertical {
                    smallvec![(Direction::Up, -1, !pos.at_front), (Direction::Down, 1, !pos.at_end)]
                } else {
                    smallvec![(Direction::Left, -1, !pos.at_front), (Direction::Right, 1, !pos.at_end)]
                }
            }
            AdornerKind::Grid => {
                let Some(pos) = grid_position(&pg.tree, target) else {
                    return SmallVec::new();
                };
                let cols = pos.cols as isize;
                smallvec![
                    (Direction::Up, -cols, !pos.at_top),
                    (Direction::Down, cols, !pos.at_bottom),
                    (Direction::Left, -1, !pos.at_left),
                    (Direction::Right, 1, !pos.at_right),
                ]
            }
            _ => SmallVec::new(),
        };

        let bw = pg.config.button_width;
        let center = frame.center();
        let rect = |direction: Direction| match direction {
            Direction::Up => Rect::new(center.x - bw / 2.0, frame.y1, center.x + bw / 2.0, frame.y1 + bw),
            Direction::Down => Rect::new(center.x - bw / 2.0, frame.y0 - bw, center.x + bw / 2.0, frame.y0),
            Direction::Left => Rect::new(frame.x0 - bw, center.y - bw / 2.0, frame.x0, center.y + bw / 2.0),
            Direction::Right => Rect::new(frame.x1, center.y - bw / 2.0, frame.x1 + bw, center.y + bw / 2.0),
        };
        specs
            .into_iter()
            .map(|(direction, delta, enabled)| BlockButton {
                direction,
                delta,
                rect: rect(direction),
                enabled,
            })
            .collect()
    }

    /// A 3x3 grid of anchor buttons inside the frame plus a "free"
    /// button above it.
    pub fn anchor_buttons(&self, pg: &Playground) -> SmallVec<[AnchorButton; 10]> {
        let mut out = SmallVec::new();
        if self.kind != AdornerKind::Anchor {
            return out;
        }
        let Some(frame) = self.frame(pg) else {
            return out;
        };
        let bw = pg.config.button_width;
        let center = frame.center();
        let columns = [
            (HAlign::Left, frame.x0 + bw / 2.0),
            (HAlign::Center, center.x),
            (HAlign::Right, frame.x1 - bw / 2.0),
        ];
        let rows = [
            (VAlign::Top, frame.y1 - bw / 2.0),
            (VAlign::Middle, center.y),
            (VAlign::Bottom, frame.y0 + bw / 2.0),
        ];
        for (v, y) in rows {
            for (h, x) in columns {
                out.push(AnchorButton {
                    h,
                    v,
                    rect: Rect::from_center_size(Point::new(x, y), (bw, bw)),
                });
            }
        }
        out.push(AnchorButton {
            h: HAlign::Free,
            v: VAlign::Free,
            rect: Rect::from_center_size(Point::new(center.x, frame.y1 + bw), (bw, bw)),
        });
        out
    }

    /// Window point the target is currently pinned to; a free axis reads
    /// as the centre.
    pub fn anchor_point(&self, pg: &Playground) -> Option<Point> {
        let frame = self.frame(pg)?;
        let (h, v) = alignment(&pg.tree.geometry(self.target?));
        let x = match h {
            HAlign::Left => frame.x0,
            HAlign::Right => frame.x1,
            HAlign::Center | HAlign::Free => frame.center().x,
        };
        let y = match v {
            VAlign::Top => frame.y1,
            VAlign::Bottom => frame.y0,
            VAlign::Middle | VAlign::Free => frame.center().y,
        };
        Some(Point::new(x, y))
    }

    /// Interactive part under window point `p`. Buttons and handles win
    /// over the move region, which only counts where no deeper widget is
    /// under the pointer.
    pub fn hit(&self, pg: &Playground, p: Point) -> Option<AdornerPart> {
        let target = self.target?;
        if let Some((handle, _)) = self.handles(pg).into_iter().find(|(_, r)| r.contains(p)) {
            return Some(AdornerPart::Handle(handle));
        }
        if let Some(button) = self.block_buttons(pg).into_iter().find(|b| b.rect.contains(p)) {
            return Some(AdornerPart::Block(button));
        }
        if let Some(button) = self.anchor_buttons(pg).into_iter().find(|b| b.rect.contains(p)) {
            return Some(AdornerPart::Anchor(button));
        }
        let frame = self.frame(pg)?;
        let inside = frame.x0 <= p.x && p.x <= frame.x1 && frame.y0 <= p.y && p.y <= frame.y1;
        (inside && (pg.in_ghost(target) || pg.pick(p) == Some(target))).then_some(AdornerPart::Center)
    }

    /// Operation a pointer-down at `p` starts, or `None` when `p` is not
    /// on this adorner.
    pub fn prepare_operation(&self, pg: &mut Playground, p: Point) -> Option<Operation> {
        let target = self.target?;
        let null = Operation::Null(NullOp {
            target: Some(target),
        });
        let op = match self.hit(pg, p)? {
            AdornerPart::Handle(h) => Operation::Resize(ResizeOp::new(pg, target, h.vertical, h.horizontal)),
            AdornerPart::Block(b) if b.enabled => match IndexOp::stepped(pg, target, b.delta) {
                Some(op) => Operation::Index(op),
                None => null,
            },
            AdornerPart::Block(_) => null,
            AdornerPart::Anchor(a) => Operation::Translate(TranslateOp::anchored(pg, target, Some(a.h), Some(a.v))),
            AdornerPart::Center => match self.kind {
                AdornerKind::Null | AdornerKind::Root | AdornerKind::DragGhost => null,
                _ => Operation::natural_for(pg, target),
            },
        };
        Some(op)
    }
}
