pub mod geometry;
pub mod id;
pub mod kv;
pub mod layout;
pub mod model;
pub mod registry;
pub mod sandbox;

pub use geometry::{HAlign, VAlign, alignment};
pub use id::NodeId;
pub use kv::{KvDocument, PropertyKind};
pub use layout::{CustomLayout, do_layout};
pub use model::*;
pub use registry::ClassRegistry;
pub use sandbox::LayoutFault;

// Re-export petgraph/kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size, Vec2};
pub use petgraph::graph::NodeIndex;
