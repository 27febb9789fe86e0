//! Markup mirror contract.
//!
//! The live tree is the source of truth; every change applied to it is
//! replayed into a textual representation through this trait. Calls are
//! idempotent replays: implementations must never decide values.

use serde_json::Value;
use wd_core::{KvDocument, NodeIndex, PropertyKind, WidgetTree};

pub trait MarkupMirror {
    fn set_property_value(
        &mut self,
        tree: &WidgetTree,
        node: NodeIndex,
        name: &str,
        value: &Value,
        kind: PropertyKind,
    );

    /// Forget a property, e.g. an absolute value a hint now overrides.
    fn clear_property(&mut self, tree: &WidgetTree, node: NodeIndex, name: &str);

    /// `node` is already attached to `parent` in `tree`.
    fn add_widget_to_parent(&mut self, tree: &WidgetTree, node: NodeIndex, parent: Option<NodeIndex>);

    /// Forget `node`, which was (or still is) a child of `parent`.
    /// Returns the removed text.
    fn remove_widget_from_parent(
        &mut self,
        tree: &WidgetTree,
        node: NodeIndex,
        parent: Option<NodeIndex>,
    ) -> String;

    /// `node` moved within its parent; `from_index` is where it was.
    fn shift_widget(&mut self, tree: &WidgetTree, node: NodeIndex, from_index: usize);

    fn widget_text(&self, tree: &WidgetTree, node: NodeIndex) -> String;

    /// The whole document.
    fn text(&self) -> String;
}

impl MarkupMirror for KvDocument {
    fn set_property_value(
        &mut self,
        tree: &WidgetTree,
        node: NodeIndex,
        name: &str,
        value: &Value,
        kind: PropertyKind,
    ) {
        if let Some(w) = tree.get(node) {
            self.set_property(w.id, name, value, kind);
        }
    }

    fn clear_property(&mut self, tree: &WidgetTree, node: NodeIndex, name: &str) {
        if let Some(w) = tree.get(node) {
            KvDocument::clear_property(self, w.id, name);
        }
    }

    fn add_widget_to_parent(&mut self, tree: &WidgetTree, node: NodeIndex, parent: Option<NodeIndex>) {
        let index = tree.index_in_parent(node);
        self.insert_widget(tree, node, parent, index);
    }

    fn remove_widget_from_parent(
        &mut self,
        tree: &WidgetTree,
        node: NodeIndex,
        parent: Option<NodeIndex>,
    ) -> String {
        let Some(w) = tree.get(node) else {
            return String::new();
        };
        let parent = parent.and_then(|p| tree.get(p)).map(|p| p.id);
        self.remove_widget(w.id, parent)
    }

    fn shift_widget(&mut self, tree: &WidgetTree, node: NodeIndex, from_index: usize) {
        let (Some(parent), Some(to)) = (tree.parent(node), tree.index_in_parent(node)) else {
            return;
        };
        log::trace!("kv: shift {:?} {from_index} → {to}", tree.node(node).id);
        self.move_child(tree.node(parent).id, tree.node(node).id, to);
    }

    fn widget_text(&self, tree: &WidgetTree, node: NodeIndex) -> String {
        tree.get(node)
            .map(|w| KvDocument::widget_text(self, w.id))
            .unwrap_or_default()
    }

    fn text(&self) -> String {
        KvDocument::text(self)
    }
}
