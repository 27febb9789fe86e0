//! Integration tests: structural edits and the undo log.
//!
//! Clipboard, delete and paste go through `Manipulator::dispatch` (or key
//! events) and are replayed with undo/redo against the tree and the
//! markup mirror.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Instant;
use wd_core::{ClassRegistry, Geometry, NodeIndex, Point, PropertyKind, Rect};
use wd_editor::{AddOptions, EditorConfig, InputEvent, Manipulator, Playground, ShortcutAction};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Horizontal box root holding one button.
fn scene() -> (Playground, NodeIndex, NodeIndex) {
    init_logging();
    let mut pg = Playground::new(
        EditorConfig::default(),
        ClassRegistry::with_defaults(),
        Rect::new(0.0, 0.0, 400.0, 300.0),
    );
    let root = pg.spawn("BoxLayout", None).unwrap();
    let button = pg.spawn("Button", Some(root)).unwrap();
    (pg, root, button)
}

/// Free-form root holding one 50x50 button at (10, 10).
fn posed_scene() -> (Playground, NodeIndex, NodeIndex) {
    init_logging();
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

fn key(m: &mut Manipulator, pg: &mut Playground, name: &str, ctrl: bool) -> bool {
    m.handle(pg, &InputEvent::key(name, ctrl, false), Instant::now())
}

// ─── Delete ──────────────────────────────────────────────────────────────

#[test]
fn delete_key_removes_selection_and_undo_restores_it() {
    let (mut pg, root, button) = scene();
    let text = pg.mirror.text();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));

    assert!(key(&mut m, &mut pg, "Delete", false));
    assert!(pg.tree.children(root).is_empty());
    assert_eq!(m.selection(), None);
    assert!(!pg.mirror.text().contains(pg.tree.node(button).id.as_str()));
    assert_eq!(pg.undo.entries()[0].description(), "remove widget");

    assert!(key(&mut m, &mut pg, "z", true));
    assert_eq!(pg.tree.children(root), &[button]);
    assert_eq!(pg.mirror.text(), text);

    assert!(key(&mut m, &mut pg, "y", true));
    assert!(pg.tree.children(root).is_empty());
}

#[test]
fn undoing_a_delete_restores_the_pose_text() {
    let (mut pg, _, button) = posed_scene();
    let before = pg.mirror.text();
    assert!(before.contains("pos: [10, 10]"));
    assert!(before.contains("size: [50, 50]"));

    assert!(pg.do_delete(button));
    assert!(!pg.mirror.text().contains("pos: [10, 10]"));

    pg.do_undo();
    assert_eq!(pg.tree.geometry(button).pos, Point::new(10.0, 10.0));
    assert_eq!(pg.mirror.text(), before);

    pg.do_redo();
    pg.do_undo();
    assert_eq!(pg.mirror.text(), before);
}

#[test]
fn root_cannot_be_added_twice() {
    let (mut pg, root, _) = scene();
    assert_eq!(pg.spawn("FloatLayout", None), None);
    assert_eq!(pg.root, Some(root));
    assert!(pg.undo.is_empty());
}

#[test]
fn deleting_the_root_empties_the_playground() {
    let (mut pg, root, _) = scene();
    let mut m = Manipulator::new();
    assert!(m.dispatch(&mut pg, ShortcutAction::SelectAll));
    assert_eq!(m.selection(), Some(root));

    assert!(m.dispatch(&mut pg, ShortcutAction::Delete));
    assert_eq!(pg.root, None);
    assert_eq!(pg.mirror.text(), "");

    pg.do_undo();
    assert_eq!(pg.root, Some(root));
    assert!(pg.mirror.text().starts_with("BoxLayout:"));
}

// ─── Clipboard ───────────────────────────────────────────────────────────

#[test]
fn copy_paste_clones_class_and_properties() {
    let (mut pg, root, button) = scene();
    pg.tree.node_mut(button).props.insert("text".into(), json!("OK"));
    pg.mirror
        .set_property_value(&pg.tree, button, "text", &json!("OK"), PropertyKind::Text);
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));

    assert!(m.dispatch(&mut pg, ShortcutAction::Copy));
    let clip = pg.clipboard().unwrap();
    assert_eq!(clip.class, "Button");
    assert!(clip.text.contains("text: 'OK'"));
    assert!(!clip.text.contains("id:"));

    assert!(m.dispatch(&mut pg, ShortcutAction::Paste));
    let pasted = m.selection().unwrap();
    assert_ne!(pasted, button);
    assert_eq!(pg.tree.children(root), &[button, pasted]);
    assert_eq!(pg.tree.node(pasted).props["text"], json!("OK"));
    assert_ne!(pg.tree.node(pasted).id, pg.tree.node(button).id);
    assert_eq!(pg.undo.entries()[0].description(), "add widget");

    pg.do_undo();
    assert_eq!(pg.tree.children(root), &[button]);
    pg.do_redo();
    assert_eq!(pg.tree.children(root), &[button, pasted]);
}

#[test]
fn pasted_widget_text_carries_the_pose() {
    let (mut pg, root, button) = posed_scene();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));
    m.dispatch(&mut pg, ShortcutAction::Copy);
    m.select(&pg, Some(root));
    assert!(m.dispatch(&mut pg, ShortcutAction::Paste));
    let pasted = m.selection().unwrap();

    let text: String = pg
        .mirror
        .widget_text(&pg.tree, pasted)
        .lines()
        .filter(|line| !line.trim_start().starts_with("id:"))
        .map(|line| format!("{line}\n"))
        .collect();
    assert!(text.contains("pos: [10, 10]"));
    assert_eq!(text, pg.clipboard().unwrap().text);
}

#[test]
fn paste_goes_into_nearest_layout_ancestor() {
    let (mut pg, root, button) = scene();
    let column = pg.spawn("BoxLayout", Some(root)).unwrap();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));
    m.dispatch(&mut pg, ShortcutAction::Copy);

    // Selected container: paste inside it.
    m.select(&pg, Some(column));
    m.dispatch(&mut pg, ShortcutAction::Paste);
    let pasted = m.selection().unwrap();
    assert_eq!(pg.tree.parent(pasted), Some(column));

    // Selected leaf: paste next to it.
    m.dispatch(&mut pg, ShortcutAction::Paste);
    let again = m.selection().unwrap();
    assert_eq!(pg.tree.children(column), &[pasted, again]);
}

#[test]
fn cut_then_paste_moves_a_copy() {
    let (mut pg, root, button) = scene();
    let other = pg.spawn("Label", Some(root)).unwrap();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));

    assert!(key(&mut m, &mut pg, "x", true));
    assert_eq!(pg.tree.children(root), &[other]);
    assert_eq!(m.selection(), None);

    m.select(&pg, Some(other));
    assert!(key(&mut m, &mut pg, "v", true));
    let pasted = m.selection().unwrap();
    assert_eq!(pg.tree.children(root), &[other, pasted]);
    assert_eq!(pg.tree.node(pasted).class, "Button");
    assert_eq!(pg.undo.len(), 2);

    pg.do_undo();
    pg.do_undo();
    assert_eq!(pg.tree.children(root), &[button, other]);
}

#[test]
fn paste_with_empty_clipboard_does_nothing() {
    let (mut pg, _, button) = scene();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));
    assert!(!m.dispatch(&mut pg, ShortcutAction::Paste));
    assert!(pg.undo.is_empty());
}

// ─── History ─────────────────────────────────────────────────────────────

#[test]
fn new_edit_drops_the_redo_tail() {
    let (mut pg, root, button) = scene();
    let mut m = Manipulator::new();
    m.select(&pg, Some(button));
    m.dispatch(&mut pg, ShortcutAction::Delete);
    pg.do_undo();
    assert!(pg.undo.can_redo());

    m.select(&pg, Some(root));
    m.dispatch(&mut pg, ShortcutAction::Copy);
    m.dispatch(&mut pg, ShortcutAction::Paste);
    assert!(!pg.undo.can_redo());
    assert_eq!(pg.undo.len(), 2);
    assert_eq!(pg.do_redo(), None);
}

#[test]
fn gestures_and_edits_share_one_history() {
    init_logging();
    let mut pg = Playground::new(
        EditorConfig::default(),
        ClassRegistry::with_defaults(),
        Rect::new(0.0, 0.0, 400.0, 300.0),
    );
    let root = pg.spawn("FloatLayout", None).unwrap();
    let button = pg.spawn("Button", Some(root)).unwrap();
    pg.set_geometry(button, wd_core::Geometry::absolute((10.0, 10.0), (50.0, 50.0)));
    let mut m = Manipulator::new();

    m.pointer_down(&mut pg, Point::new(35.0, 35.0), Instant::now());
    m.pointer_move(&mut pg, Point::new(55.0, 35.0));
    m.pointer_up(&mut pg, Point::new(55.0, 35.0));
    m.dispatch(&mut pg, ShortcutAction::Delete);

    let history: Vec<String> = pg.undo.entries().iter().map(|e| e.description()).collect();
    assert_eq!(history, vec!["move widget", "remove widget"]);

    assert_eq!(pg.do_undo().as_deref(), Some("remove widget"));
    assert_eq!(pg.do_undo().as_deref(), Some("move widget"));
    assert_eq!(pg.tree.geometry(button).pos, Point::new(10.0, 10.0));
    assert_eq!(pg.do_undo(), None);
}

#[test]
fn widgets_dropped_from_history_leave_the_graph() {
    init_logging();
    let config = EditorConfig {
        undo_depth: 2,
        ..EditorConfig::default()
    };
    let mut pg = Playground::new(config, ClassRegistry::with_defaults(), Rect::new(0.0, 0.0, 400.0, 300.0));
    let root = pg.spawn("BoxLayout", None).unwrap();
    let a = pg.spawn("Button", Some(root)).unwrap();
    let b = pg.spawn("Label", Some(root)).unwrap();
    let nodes = pg.tree.graph.node_count();

    // Evicted: the oldest removal can no longer be undone.
    pg.do_delete(a);
    pg.do_delete(b);
    let c = pg.instantiate("Button").unwrap();
    assert!(pg.add_widget_to_parent(c, Some(root), AddOptions::default()));
    assert!(!pg.tree.contains_node(a));
    assert!(pg.tree.contains_node(b));
    assert_eq!(pg.tree.graph.node_count(), nodes);

    // Truncated: an undone add can no longer be redone.
    pg.do_undo();
    assert!(pg.tree.contains_node(c));
    pg.do_delete(root);
    assert!(!pg.tree.contains_node(c));
    assert!(pg.tree.contains_node(b));
    assert!(pg.tree.contains_node(root));

    pg.do_undo();
    assert!(pg.tree.children(root).is_empty());
    assert_eq!(pg.root, Some(root));
}
