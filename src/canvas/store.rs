// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation store with undo/redo history.
//!
//! The live collection is what gets drawn. History holds full-collection
//! snapshots and only grows on committed gestures; intermediate drag frames
//! go through [`AnnotationStore::preview_mutate`] and leave it untouched.

use crate::models::annotation::{Annotation, AnnotationId};
use crate::models::document::AnnotationDocument;

/// Default history limit; 0 keeps every snapshot.
pub const DEFAULT_HISTORY_LIMIT: usize = 0;

/// Snapshot history with a cursor. The cursor always points at a valid
/// snapshot, and the first snapshot is the base state undo returns to.
#[derive(Debug, Clone)]
struct History {
    snapshots: Vec<Vec<Annotation>>,
    cursor: usize,
    /// Snapshots kept including the base, or `None` for no limit.
    max_size: Option<usize>,
}

impl History {
    fn new(initial: Vec<Annotation>, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_size: (limit > 0).then(|| limit.max(2)),
        }
    }

    /// Push a snapshot, truncating any redo entries past the cursor.
    ///
    /// Beyond the limit the oldest snapshots after the base are dropped.
    fn push(&mut self, snapshot: Vec<Annotation>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if let Some(max_size) = self.max_size {
            if self.snapshots.len() > max_size {
                let excess = self.snapshots.len() - max_size;
                self.snapshots.drain(1..=excess);
            }
        }
        self.cursor = self.snapshots.len() - 1;
    }

    fn current(&self) -> &[Annotation] {
        &self.snapshots[self.cursor]
    }

    fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    fn undo(&mut self) -> Option<&[Annotation]> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    fn redo(&mut self) -> Option<&[Annotation]> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    fn reset(&mut self, snapshot: Vec<Annotation>) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.cursor = 0;
    }
}

/// Ordered annotation collection; insertion order is z-order.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    live: Vec<Annotation>,
    history: History,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl AnnotationStore {
    /// Create an empty store keeping at most `history_limit` snapshots
    /// (0 for no limit). The empty base state is always kept.
    pub fn new(history_limit: usize) -> Self {
        Self {
            live: Vec::new(),
            history: History::new(Vec::new(), history_limit),
        }
    }

    /// The live collection, bottom-most first.
    pub fn annotations(&self) -> &[Annotation] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.live.iter().find(|a| a.id() == id)
    }

    /// Replace the live collection and record it as a new undoable state.
    pub fn commit(&mut self, collection: Vec<Annotation>) {
        self.live = collection.clone();
        self.history.push(collection);
        log::info!("Committed annotations, total: {}", self.live.len());
    }

    /// Replace the live collection without touching history.
    pub fn preview_mutate(&mut self, collection: Vec<Annotation>) {
        self.live = collection;
    }

    /// Commit the live collection if it differs from the current snapshot.
    ///
    /// Returns whether a snapshot was pushed.
    pub fn commit_if_changed(&mut self) -> bool {
        if self.live.as_slice() == self.history.current() {
            return false;
        }
        self.commit(self.live.clone());
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one snapshot; no-op at the bottom of the stack.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(previous) => {
                self.live = previous.to_vec();
                log::info!("Undo, total: {}", self.live.len());
                true
            }
            None => false,
        }
    }

    /// Step forward one snapshot; no-op at the top of the stack.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(next) => {
                self.live = next.to_vec();
                log::info!("Redo, total: {}", self.live.len());
                true
            }
            None => false,
        }
    }

    /// The live collection as a document, order preserved.
    pub fn serialize(&self) -> AnnotationDocument {
        AnnotationDocument::new(self.live.clone())
    }

    /// Replace the live collection and reset history to this single state.
    pub fn restore(&mut self, document: AnnotationDocument) {
        self.live = document.annotations;
        self.history.reset(self.live.clone());
        log::info!("Restored {} annotations", self.live.len());
    }
}
