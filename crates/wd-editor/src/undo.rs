//! Undo log.
//!
//! One linear history with a cursor: entries before the cursor can be
//! undone, entries after it redone, and a push truncates the redo tail.
//! Gestures are recorded as finished `Operation`s; structural edits
//! (add/remove from the palette, clipboard or delete) as
//! `WidgetOperation`s.
//!
//! Replaying an entry must not push new entries. The log enforces that
//! with a replay flag: a push during replay is a protocol violation and
//! panics.

use crate::operations::Operation;
use crate::playground::{AddOptions, Playground, RemoveOptions};
use wd_core::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetAction {
    Add,
    Remove,
}

/// A structural add/remove, replayable against the playground.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOperation {
    pub action: WidgetAction,
    pub widget: NodeIndex,
    /// Container the widget was attached to (the sandbox for the root).
    pub parent: NodeIndex,
    pub index: usize,
}

impl WidgetOperation {
    pub fn add(widget: NodeIndex, parent: NodeIndex, index: usize) -> Self {
        Self {
            action: WidgetAction::Add,
            widget,
            parent,
            index,
        }
    }

    pub fn remove(widget: NodeIndex, parent: NodeIndex, index: usize) -> Self {
        Self {
            action: WidgetAction::Remove,
            widget,
            parent,
            index,
        }
    }

    pub fn undo(&self, pg: &mut Playground) {
        match self.action {
            WidgetAction::Add => self.take_out(pg),
            WidgetAction::Remove => self.put_back(pg),
        }
    }

    pub fn redo(&self, pg: &mut Playground) {
        match self.action {
            WidgetAction::Add => self.put_back(pg),
            WidgetAction::Remove => self.take_out(pg),
        }
    }

    fn put_back(&self, pg: &mut Playground) {
        if pg.tree.parent(self.widget).is_some() {
            log::warn!("undo: {:?} is already attached", pg.tree.node(self.widget).id);
            return;
        }
        let target = (self.parent != pg.tree.root).then_some(self.parent);
        pg.add_widget_to_parent(
            self.widget,
            target,
            AddOptions {
                from_undo: true,
                index: Some(self.index),
                ..AddOptions::default()
            },
        );
    }

    fn take_out(&self, pg: &mut Playground) {
        pg.remove_widget_from_parent(
            self.widget,
            RemoveOptions {
                from_undo: true,
                ..RemoveOptions::default()
            },
        );
    }
}

#[derive(Debug)]
pub enum UndoEntry {
    Gesture(Operation),
    Widget(WidgetOperation),
}

impl UndoEntry {
    pub fn description(&self) -> String {
        match self {
            UndoEntry::Gesture(op) => op.description().to_string(),
            UndoEntry::Widget(w) => match w.action {
                WidgetAction::Add => "add widget".to_string(),
                WidgetAction::Remove => "remove widget".to_string(),
            },
        }
    }

    /// The widget this entry moves, adds or removes.
    pub fn widget(&self) -> Option<NodeIndex> {
        match self {
            UndoEntry::Gesture(op) => op.target(),
            UndoEntry::Widget(w) => Some(w.widget),
        }
    }

    pub fn undo(&self, pg: &mut Playground) {
        match self {
            UndoEntry::Gesture(op) => op.do_undo(pg),
            UndoEntry::Widget(w) => w.undo(pg),
        }
    }

    pub fn redo(&self, pg: &mut Playground) {
        match self {
            UndoEntry::Gesture(op) => op.do_redo(pg),
            UndoEntry::Widget(w) => w.redo(pg),
        }
    }
}

#[derive(Debug)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
    cursor: usize,
    max_depth: usize,
    replaying: bool,
}

impl UndoLog {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
            replaying: false,
        }
    }

    /// Record a new entry, dropping any redo tail. Returns the entries
    /// that fell out of the history: the redo tail, then the oldest entry
    /// when the log is full.
    ///
    /// # Panics
    /// While an entry is being replayed.
    pub fn push(&mut self, entry: UndoEntry) -> Vec<UndoEntry> {
        assert!(!self.replaying, "undo log mutated during replay");
        let mut dropped: Vec<UndoEntry> = self.entries.drain(self.cursor..).collect();
        self.entries.push(entry);
        if self.entries.len() > self.max_depth {
            dropped.push(self.entries.remove(0));
        }
        self.cursor = self.entries.len();
        dropped
    }

    /// Whether any entry still in the log touches `widget`.
    pub fn references(&self, widget: NodeIndex) -> bool {
        self.entries.iter().any(|e| e.widget() == Some(widget))
    }

    /// Take the entry to undo out of the log and enter replay mode.
    /// Hand it back with [`UndoLog::end_undo`].
    pub fn begin_undo(&mut self) -> Option<UndoEntry> {
        assert!(!self.replaying, "nested undo replay");
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.replaying = true;
        Some(self.entries.remove(self.cursor))
    }

    pub fn end_undo(&mut self, entry: UndoEntry) -> String {
        let description = entry.description();
        self.entries.insert(self.cursor, entry);
        self.replaying = false;
        description
    }

    /// Take the entry to redo out of the log and enter replay mode.
    /// Hand it back with [`UndoLog::end_redo`].
    pub fn begin_redo(&mut self) -> Option<UndoEntry> {
        assert!(!self.replaying, "nested redo replay");
        if self.cursor >= self.entries.len() {
            return None;
        }
        self.replaying = true;
        Some(self.entries.remove(self.cursor))
    }

    pub fn end_redo(&mut self, entry: UndoEntry) -> String {
        let description = entry.description();
        self.entries.insert(self.cursor, entry);
        self.cursor += 1;
        self.replaying = false;
        description
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u32) -> UndoEntry {
        UndoEntry::Widget(WidgetOperation::add(
            NodeIndex::new(n as usize),
            NodeIndex::new(0),
            0,
        ))
    }

    #[test]
    fn cursor_walks_history() {
        let mut log = UndoLog::new(10);
        log.push(entry(1));
        log.push(entry(2));
        assert!(log.can_undo() && !log.can_redo());

        let e = log.begin_undo().unwrap();
        assert!(log.is_replaying());
        assert_eq!(log.end_undo(e), "add widget");
        assert!(log.can_redo());

        // New entry drops the redo tail.
        let dropped = log.push(entry(3));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].widget(), Some(NodeIndex::new(2)));
        assert_eq!(log.len(), 2);
        assert!(!log.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut log = UndoLog::new(2);
        log.push(entry(1));
        log.push(entry(2));
        let evicted = log.push(entry(3));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].widget(), Some(NodeIndex::new(1)));
        assert!(!log.references(NodeIndex::new(1)));
        assert!(log.references(NodeIndex::new(3)));
        assert_eq!(log.len(), 2);
        match &log.entries()[0] {
            UndoEntry::Widget(w) => assert_eq!(w.widget, NodeIndex::new(2)),
            other => panic!("expected widget entry, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "mutated during replay")]
    fn push_during_replay_panics() {
        let mut log = UndoLog::new(4);
        log.push(entry(1));
        let _e = log.begin_undo();
        log.push(entry(2));
    }

    #[test]
    fn empty_log_has_nothing_to_replay() {
        let mut log = UndoLog::new(4);
        assert!(log.begin_undo().is_none());
        assert!(log.begin_redo().is_none());
        assert!(!log.is_replaying());
    }
}
