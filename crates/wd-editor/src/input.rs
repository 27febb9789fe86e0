//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard events into `InputEvent`s
//! consumed by the manipulator. Positions are window coordinates.

use kurbo::{Point, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f64, y: f64 },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64 },

    /// The host revoked the gesture (focus loss, touch cancel).
    PointerCancel,

    /// Keyboard shortcut.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn key(key: &str, ctrl: bool, shift: bool) -> Self {
        Self::Key {
            key: key.to_string(),
            ctrl,
            shift,
            alt: false,
            meta: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }
}

/// Pointer state handed to operations: where it is now and how far it
/// moved since the previous event, both in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub pos: Point,
    pub delta: Vec2,
}

impl Pointer {
    pub fn at(pos: Point) -> Self {
        Self {
            pos,
            delta: Vec2::ZERO,
        }
    }

    pub fn moved(from: Point, to: Point) -> Self {
        Self {
            pos: to,
            delta: to - from,
        }
    }
}
