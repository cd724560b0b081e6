//! # Undo/Redo History
//!
//! A linear undo/redo stack pair over reversible commands.
//!
//! ## Design
//!
//! - Each applied command is stored alongside its inverse
//! - Undo applies the inverses and moves the entry to the redo stack
//! - Redo reapplies the original commands
//! - A newly recorded command clears the redo stack (non-branching undo)
//! - Rapid `SetProp` edits on the same `(node, prop)` within
//!   [`COALESCE_WINDOW`] merge into one entry representing the net change,
//!   so continuous text editing is one undo step rather than one per
//!   keystroke
//! - Batches group several commands into one undo step (e.g. a multi-node
//!   paste)

use std::time::{Duration, Instant};

use crate::commands::Command;
use crate::errors::EditorError;
use pagecraft_document::PageDocument;

/// Window inside which same-key `SetProp` edits merge into one undo step.
pub const COALESCE_WINDOW: Duration = Duration::from_millis(500);

/// One undo step: commands in application order, inverses in undo order.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Commands in application order.
    pub commands: Vec<Command>,

    /// Inverse commands in reverse (undo) order.
    pub inverses: Vec<Command>,

    /// When the entry was last extended; drives coalescing.
    applied_at: Instant,

    /// Present only for coalescable commands.
    coalesce_key: Option<String>,

    /// Optional label for history UIs.
    pub description: Option<String>,
}

impl HistoryEntry {
    fn single(command: Command, inverse: Command) -> Self {
        let coalesce_key = command.coalesce_key();
        let description = Some(command.describe());
        Self {
            commands: vec![command],
            inverses: vec![inverse],
            applied_at: Instant::now(),
            coalesce_key,
            description,
        }
    }
}

/// Linear undo/redo history with a configurable size cap.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,

    /// Maximum retained undo entries; oldest are trimmed first.
    max_entries: usize,

    /// Open batch, if any; recorded commands accumulate here.
    current_batch: Option<HistoryEntry>,
}

impl History {
    /// Default cap of 100 undo entries.
    pub fn new() -> Self {
        Self::with_max_entries(100)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
            current_batch: None,
        }
    }

    /// Record an applied command and its inverse.
    ///
    /// Inside a batch the pair accumulates into the open batch entry.
    /// Otherwise, if the previous entry shares this command's coalesce key
    /// and is younger than [`COALESCE_WINDOW`], the two merge: the merged
    /// entry keeps the oldest inverse (undo returns to the pre-burst value)
    /// and the newest command (redo lands on the final value).
    pub fn record(&mut self, command: Command, inverse: Command) {
        self.redo_stack.clear();

        if let Some(batch) = &mut self.current_batch {
            batch.inverses.insert(0, inverse);
            batch.commands.push(command);
            return;
        }

        let key = command.coalesce_key();
        if let (Some(key), Some(last)) = (&key, self.undo_stack.last_mut()) {
            if last.coalesce_key.as_ref() == Some(key)
                && last.applied_at.elapsed() <= COALESCE_WINDOW
            {
                last.commands = vec![command];
                last.applied_at = Instant::now();
                return;
            }
        }

        self.push_entry(HistoryEntry::single(command, inverse));
    }

    /// Open a batch; recorded commands group into one undo step until
    /// `end_batch`.
    pub fn begin_batch(&mut self, description: Option<String>) {
        self.current_batch = Some(HistoryEntry {
            commands: Vec::new(),
            inverses: Vec::new(),
            applied_at: Instant::now(),
            coalesce_key: None,
            description,
        });
    }

    /// Close the open batch and push it as one entry. Empty batches are
    /// dropped. Idempotent when no batch is open.
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.commands.is_empty() {
                self.push_entry(batch);
            }
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        if self.max_entries > 0 && self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Apply the most recent entry's inverses and move it to the redo
    /// stack.
    pub fn undo(&mut self, doc: &mut PageDocument) -> Result<(), EditorError> {
        let entry = self.undo_stack.pop().ok_or(EditorError::NothingToUndo)?;
        for inverse in &entry.inverses {
            inverse.apply(doc)?;
        }
        self.redo_stack.push(entry);
        Ok(())
    }

    /// Reapply the most recently undone entry's commands.
    pub fn redo(&mut self, doc: &mut PageDocument) -> Result<(), EditorError> {
        let entry = self.redo_stack.pop().ok_or(EditorError::NothingToRedo)?;
        for command in &entry.commands {
            command.apply(doc)?;
        }
        self.undo_stack.push(entry);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{ComponentNode, PropValue};

    fn doc_with_heading() -> (PageDocument, String) {
        let mut doc = PageDocument::new();
        let heading = ComponentNode::leaf("Heading").with_prop("text", PropValue::plain("a"));
        let id = heading.id.clone();
        doc.attach_subtree(vec![heading], None, 0).unwrap();
        (doc, id)
    }

    fn apply_set(
        history: &mut History,
        doc: &mut PageDocument,
        id: &str,
        text: &str,
    ) {
        let command = Command::SetProp {
            node_id: id.to_string(),
            prop: "text".to_string(),
            value: Some(PropValue::plain(text)),
        };
        let inverse = command.apply(doc).unwrap();
        history.record(command, inverse);
    }

    #[test]
    fn test_empty_history() {
        let history = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();
        let before = serde_json::to_value(&doc).unwrap();

        apply_set(&mut history, &mut doc, &id, "b");
        let after = serde_json::to_value(&doc).unwrap();

        history.undo(&mut doc).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
        assert!(history.can_redo());

        history.redo(&mut doc).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), after);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();

        apply_set(&mut history, &mut doc, &id, "b");
        history.undo(&mut doc).unwrap();
        assert_eq!(history.redo_depth(), 1);

        // Structural command: no coalescing involved
        let delete = Command::DeleteSubtree {
            root_id: id.clone(),
        };
        let inverse = delete.apply(&mut doc).unwrap();
        history.record(delete, inverse);

        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_rapid_set_prop_coalesces_to_net_change() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();

        // Simulated keystrokes, all inside the window
        apply_set(&mut history, &mut doc, &id, "ab");
        apply_set(&mut history, &mut doc, &id, "abc");
        apply_set(&mut history, &mut doc, &id, "abcd");

        assert_eq!(history.undo_depth(), 1);

        // One undo returns to the pre-burst value
        history.undo(&mut doc).unwrap();
        assert_eq!(
            doc.get(&id).unwrap().props.get("text"),
            Some(&PropValue::plain("a"))
        );

        // Redo lands on the final value
        history.redo(&mut doc).unwrap();
        assert_eq!(
            doc.get(&id).unwrap().props.get("text"),
            Some(&PropValue::plain("abcd"))
        );
    }

    #[test]
    fn test_stale_entries_do_not_coalesce() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();

        apply_set(&mut history, &mut doc, &id, "b");
        // Age the entry past the window
        history.undo_stack.last_mut().unwrap().applied_at =
            Instant::now() - (COALESCE_WINDOW + Duration::from_millis(1));

        apply_set(&mut history, &mut doc, &id, "c");
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_different_props_do_not_coalesce() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();

        apply_set(&mut history, &mut doc, &id, "b");

        let command = Command::SetProp {
            node_id: id.clone(),
            prop: "align".to_string(),
            value: Some(PropValue::plain("center")),
        };
        let inverse = command.apply(&mut doc).unwrap();
        history.record(command, inverse);

        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_batch_is_one_undo_step() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::new();
        let before = serde_json::to_value(&doc).unwrap();

        history.begin_batch(Some("Restyle heading".to_string()));
        apply_set(&mut history, &mut doc, &id, "b");
        let command = Command::SetProp {
            node_id: id.clone(),
            prop: "align".to_string(),
            value: Some(PropValue::plain("center")),
        };
        let inverse = command.apply(&mut doc).unwrap();
        history.record(command, inverse);
        history.end_batch();

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.undo_description(), Some("Restyle heading"));

        history.undo(&mut doc).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
    }

    #[test]
    fn test_max_entries_trims_oldest() {
        let (mut doc, id) = doc_with_heading();
        let mut history = History::with_max_entries(2);

        for text in ["b", "c", "d"] {
            apply_set(&mut history, &mut doc, &id, text);
            // Defeat coalescing so each edit is its own entry
            history.undo_stack.last_mut().unwrap().applied_at =
                Instant::now() - (COALESCE_WINDOW + Duration::from_millis(1));
        }

        assert_eq!(history.undo_depth(), 2);
    }
}
