//! Kv-style text document mirroring the widget tree.
//!
//! The document never decides values on its own: every edit is a replay
//! of state already applied to the live tree. It keeps one rule per
//! widget (class, property text, ordered children) and renders them as an
//! indented `Class:` / `name: value` listing.

use crate::id::NodeId;
use crate::model::WidgetTree;
use petgraph::graph::NodeIndex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// How a property value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    List,
    Dict,
    Numeric,
    Text,
    Literal,
}

impl PropertyKind {
    /// Kind implied by a JSON value's shape.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => PropertyKind::List,
            Value::Object(_) => PropertyKind::Dict,
            Value::Number(_) => PropertyKind::Numeric,
            Value::String(_) => PropertyKind::Text,
            Value::Bool(_) | Value::Null => PropertyKind::Literal,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct KvRule {
    class: String,
    props: BTreeMap<String, String>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct KvDocument {
    rules: HashMap<NodeId, KvRule>,
    root: Option<NodeId>,
}

impl KvDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the subtree at `root` as the document's root rule.
    pub fn from_tree(tree: &WidgetTree, root: NodeIndex) -> Self {
        let mut doc = Self::new();
        doc.insert_widget(tree, root, None, None);
        doc
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.rules.contains_key(&id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&str> {
        self.rules.get(&id)?.props.get(name).map(String::as_str)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.rules
            .get(&id)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    /// Record a property edit. Returns `false` if the widget has no rule.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &Value, kind: PropertyKind) -> bool {
        match self.rules.get_mut(&id) {
            Some(rule) => {
                rule.props.insert(name.to_string(), format_value(value, kind));
                true
            }
            None => {
                log::debug!("kv: no rule for {id:?}, dropping `{name}`");
                false
            }
        }
    }

    /// Drop a property line. Returns `true` if the rule had it.
    pub fn clear_property(&mut self, id: NodeId, name: &str) -> bool {
        self.rules
            .get_mut(&id)
            .is_some_and(|rule| rule.props.remove(name).is_some())
    }

    /// Record `node`'s subtree and link it under `parent` (or as the root
    /// rule when the parent is not part of the document).
    pub fn insert_widget(
        &mut self,
        tree: &WidgetTree,
        node: NodeIndex,
        parent: Option<NodeIndex>,
        index: Option<usize>,
    ) {
        let id = tree.node(node).id;
        for idx in tree.descendants(node) {
            let widget = tree.node(idx);
            let props = widget
                .props
                .iter()
                .map(|(k, v)| (k.clone(), format_value(v, PropertyKind::of(v))))
                .collect();
            let children = tree.children(idx).iter().map(|&c| tree.node(c).id).collect();
            self.rules.insert(
                widget.id,
                KvRule {
                    class: widget.class.clone(),
                    props,
                    children,
                },
            );
        }

        let parent_id = parent.map(|p| tree.node(p).id);
        match parent_id.and_then(|p| self.rules.get_mut(&p)) {
            Some(rule) => {
                rule.children.retain(|&c| c != id);
                let at = index.unwrap_or(rule.children.len()).min(rule.children.len());
                rule.children.insert(at, id);
            }
            None => self.root = Some(id),
        }
    }

    /// Unlink and forget `id`'s subtree, returning its text.
    pub fn remove_widget(&mut self, id: NodeId, parent: Option<NodeId>) -> String {
        let text = self.widget_text(id);
        if let Some(rule) = parent.and_then(|p| self.rules.get_mut(&p)) {
            rule.children.retain(|&c| c != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(rule) = self.rules.remove(&n) {
                stack.extend(rule.children);
            }
        }
        text
    }

    /// Move `child` to position `to` among `parent`'s children.
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, to: usize) -> bool {
        let Some(rule) = self.rules.get_mut(&parent) else {
            return false;
        };
        let Some(from) = rule.children.iter().position(|&c| c == child) else {
            log::warn!("kv: {child:?} is not a child of {parent:?}");
            return false;
        };
        let id = rule.children.remove(from);
        let at = to.min(rule.children.len());
        rule.children.insert(at, id);
        true
    }

    /// Text of one widget's subtree, unindented.
    pub fn widget_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.emit_rule(&mut out, id, 0);
        out
    }

    /// The whole document.
    pub fn text(&self) -> String {
        self.root.map(|r| self.widget_text(r)).unwrap_or_default()
    }

    fn emit_rule(&self, out: &mut String, id: NodeId, depth: usize) {
        let Some(rule) = self.rules.get(&id) else {
            return;
        };
        indent(out, depth);
        let _ = writeln!(out, "{}:", rule.class);
        indent(out, depth + 1);
        let _ = writeln!(out, "id: {id}");
        for (name, value) in &rule.props {
            indent(out, depth + 1);
            let _ = writeln!(out, "{name}: {value}");
        }
        for &child in &rule.children {
            self.emit_rule(out, child, depth + 1);
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}

/// Render a value in kv syntax.
pub fn format_value(value: &Value, kind: PropertyKind) -> String {
    match (kind, value) {
        (_, Value::Null) => "None".to_string(),
        (_, Value::Bool(b)) => if *b { "True" } else { "False" }.to_string(),
        (_, Value::Number(n)) => format_num(n.as_f64().unwrap_or_default()),
        (PropertyKind::Text, Value::String(s)) => format!("'{}'", s.replace('\'', "\\'")),
        (_, Value::String(s)) => s.clone(),
        (_, Value::Array(items)) => {
            let parts: Vec<String> = items
                .iter()
                .map(|v| format_value(v, PropertyKind::of(v)))
                .collect();
            format!("[{}]", parts.join(", "))
        }
        (_, Value::Object(map)) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{k}': {}", format_value(v, PropertyKind::of(v))))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Format a float without trailing zeros for compact output.
fn format_num(n: f64) -> String {
    if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:.4}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayoutKind, WidgetCaps, WidgetNode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> (WidgetTree, NodeIndex, NodeIndex) {
        let mut tree = WidgetTree::new(WidgetNode::new(
            NodeId::intern("kv_sandbox"),
            "Sandbox",
            WidgetCaps::container(LayoutKind::Sandbox),
        ));
        let root = tree.add_node(
            tree.root,
            WidgetNode::new(
                NodeId::intern("kv_root"),
                "FloatLayout",
                WidgetCaps::container(LayoutKind::Float),
            ),
        );
        let mut button = WidgetNode::new(NodeId::intern("kv_ok"), "Button", WidgetCaps::leaf());
        button.props.insert("text".into(), json!("OK"));
        let button = tree.add_node(root, button);
        (tree, root, button)
    }

    #[test]
    fn emits_nested_rules() {
        let (tree, root, _) = sample();
        let doc = KvDocument::from_tree(&tree, root);
        assert_eq!(
            doc.text(),
            "FloatLayout:\n    id: kv_root\n    Button:\n        id: kv_ok\n        text: 'OK'\n"
        );
    }

    #[test]
    fn property_edits_render_by_kind() {
        let (tree, root, button) = sample();
        let mut doc = KvDocument::from_tree(&tree, root);
        let id = tree.node(button).id;
        doc.set_property(id, "pos_hint", &json!({"x": 0.5}), PropertyKind::Dict);
        doc.set_property(id, "size_hint", &json!([0.25, null]), PropertyKind::List);
        doc.set_property(id, "pos", &json!([30.0, 15.0]), PropertyKind::List);
        assert_eq!(doc.property(id, "pos_hint"), Some("{'x': 0.5}"));
        assert_eq!(doc.property(id, "size_hint"), Some("[0.25, None]"));
        assert_eq!(doc.property(id, "pos"), Some("[30, 15]"));
        assert!(!doc.set_property(NodeId::intern("kv_missing"), "pos", &json!(1), PropertyKind::Numeric));

        assert!(doc.clear_property(id, "pos"));
        assert!(!doc.clear_property(id, "pos"));
        assert_eq!(doc.property(id, "pos"), None);
    }

    #[test]
    fn remove_returns_subtree_text() {
        let (tree, root, button) = sample();
        let mut doc = KvDocument::from_tree(&tree, root);
        let text = doc.remove_widget(tree.node(button).id, Some(tree.node(root).id));
        assert_eq!(text, "Button:\n    id: kv_ok\n    text: 'OK'\n");
        assert!(doc.children(tree.node(root).id).is_empty());
        assert!(!doc.contains(tree.node(button).id));
    }
}
