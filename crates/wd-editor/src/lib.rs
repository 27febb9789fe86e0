pub mod adorner;
pub mod config;
pub mod input;
pub mod manipulator;
pub mod mirror;
pub mod operations;
pub mod playground;
pub mod shortcuts;
pub mod treeview;
pub mod undo;

pub use adorner::{Adorner, AdornerKind, AdornerPart, adorners_for};
pub use config::EditorConfig;
pub use input::{InputEvent, Pointer};
pub use manipulator::Manipulator;
pub use mirror::MarkupMirror;
pub use operations::{Operation, OperationKind};
pub use playground::{AddOptions, Diagnostic, DragType, Playground, RemoveOptions};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use treeview::WidgetTreeView;
pub use undo::{UndoEntry, UndoLog, WidgetOperation};
