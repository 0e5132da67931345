//! One labeling pass: the working subset, the navigation cursor, and
//! the label store live and die together.
//!
//! Applying a new filter builds a new `LabelSession`, so the subset,
//! cursor and labels can never disagree about which pass they belong
//! to. The labeled count is the size of the label map, not a counter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::{FilteredRow, FilteredSubset};

/// Binary tile label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Absent,
    Present,
}

impl Label {
    /// Export encoding: 0 = no kiln, 1 = kiln.
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Absent => 0,
            Label::Present => 1,
        }
    }
}

/// What happens when the cursor lands on an unlabeled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelPolicy {
    /// Rows stay unlabeled until the operator acts.
    Explicit,
    /// Arriving at an unlabeled row records `Absent`; the operator may
    /// override to `Present` and revert. Revisits never relabel.
    DefaultNo,
}

/// Session state for reviewing one filtered subset.
#[derive(Debug, Clone)]
pub struct LabelSession {
    subset: FilteredSubset,
    policy: LabelPolicy,
    cursor: usize,
    labels: HashMap<String, Label>,
}

impl LabelSession {
    /// Start a fresh pass over `subset`: cursor at 0, no labels.
    /// Under `DefaultNo` the first row is labeled on arrival.
    pub fn new(subset: FilteredSubset, policy: LabelPolicy) -> Self {
        let mut session = Self {
            subset,
            policy,
            cursor: 0,
            labels: HashMap::new(),
        };
        session.touch_current();
        session
    }

    pub fn subset(&self) -> &FilteredSubset {
        &self.subset
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.subset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subset.is_empty()
    }

    /// Current position, always within `[0, len-1]` (0 when empty).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The row under the cursor; None only when the subset is empty.
    pub fn current(&self) -> Option<&FilteredRow> {
        self.subset.rows.get(self.cursor)
    }

    /// True when the cursor sits on the last row.
    pub fn at_end(&self) -> bool {
        self.subset.is_empty() || self.cursor + 1 == self.subset.len()
    }

    /// Move forward one row; no-op at the last row and on empty subsets.
    pub fn advance(&mut self) {
        if self.cursor + 1 < self.subset.len() {
            self.cursor += 1;
            self.touch_current();
        }
    }

    /// Move back one row; no-op at row 0.
    pub fn retreat(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.touch_current();
        }
    }

    /// Jump to `index`, rejecting anything outside the subset.
    pub fn goto(&mut self, index: usize) -> Result<()> {
        if index >= self.subset.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.subset.len(),
            });
        }
        self.cursor = index;
        self.touch_current();
        Ok(())
    }

    /// Return the cursor to the first row.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.touch_current();
    }

    /// Label the current row, overwriting any earlier label.
    /// No-op on an empty subset.
    pub fn set_label(&mut self, label: Label) {
        if let Some(row) = self.subset.rows.get(self.cursor) {
            self.labels.insert(row.id.clone(), label);
        }
    }

    /// Quick NO: record `Absent` for the current row, then move on.
    pub fn mark_no_and_advance(&mut self) {
        self.set_label(Label::Absent);
        self.advance();
    }

    pub fn label_of(&self, id: &str) -> Option<Label> {
        self.labels.get(id).copied()
    }

    pub fn current_label(&self) -> Option<Label> {
        self.current().and_then(|row| self.label_of(&row.id))
    }

    /// Discard every label without moving the cursor. Under `DefaultNo`
    /// the current row is immediately relabeled on arrival.
    pub fn remove_all(&mut self) {
        self.labels.clear();
        self.touch_current();
    }

    /// Number of labeled tiles: the size of the label map.
    pub fn labeled_count(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &HashMap<String, Label> {
        &self.labels
    }

    /// Counts shown to the operator: subset size, labeled tiles, kilns,
    /// and the 1-based sequence numbers currently labeled `Present`.
    pub fn summary(&self) -> SessionSummary {
        let mut kiln_sequences = Vec::new();
        for (i, row) in self.subset.rows.iter().enumerate() {
            if self.label_of(&row.id) == Some(Label::Present) {
                kiln_sequences.push(i + 1);
            }
        }
        SessionSummary {
            total: self.subset.len(),
            labeled: self.labeled_count(),
            kilns: kiln_sequences.len(),
            kiln_sequences,
        }
    }

    /// Default-no arrival rule. Checks the store first, so an already
    /// labeled row (auto or operator) is never overwritten.
    fn touch_current(&mut self) {
        if self.policy != LabelPolicy::DefaultNo {
            return;
        }
        if let Some(row) = self.subset.rows.get(self.cursor) {
            if !self.labels.contains_key(&row.id) {
                self.labels.insert(row.id.clone(), Label::Absent);
            }
        }
    }
}

/// Progress counts for the operator-facing status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub labeled: usize,
    pub kilns: usize,
    /// 1-based positions of kiln rows, in subset order.
    pub kiln_sequences: Vec<usize>,
}
