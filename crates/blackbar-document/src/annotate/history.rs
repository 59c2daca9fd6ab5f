// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit history — bounded list of full snapshots with an undo cursor.

use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Snapshot history with undo/redo.
///
/// The entry under the cursor is the current state. Committing while the
/// cursor is behind the newest entry discards everything after it.
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    entries: VecDeque<T>,
    cursor: usize,
    limit: usize,
}

impl<T: Clone> EditHistory<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Forget everything and start again from `baseline`.
    pub fn reset(&mut self, baseline: T) {
        self.entries.clear();
        self.entries.push_back(baseline);
        self.cursor = 0;
    }

    /// Record a new current state.
    pub fn commit(&mut self, snapshot: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back, returning the state to restore.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward, returning the state to restore.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<T: Clone> Default for EditHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> EditHistory<u32> {
        let mut history = EditHistory::new(50);
        history.reset(0);
        history
    }

    #[test]
    fn sixty_commits_keep_fifty_and_undo_49_steps() {
        let mut history = seeded();
        for n in 1..=60 {
            history.commit(n);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.current(), Some(&60));

        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 49);
        // Oldest surviving snapshot is commit 11.
        assert_eq!(history.current(), Some(&11));
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = seeded();
        history.commit(1);
        history.commit(2);
        history.commit(3);
        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));

        history.commit(10);
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), Some(&10));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn undo_then_redo_restores() {
        let mut history = seeded();
        history.commit(1);
        assert_eq!(history.undo(), Some(&0));
        assert!(!history.can_undo());
        assert_eq!(history.redo(), Some(&1));
        assert!(!history.can_redo());
    }

    #[test]
    fn reset_forgets_everything() {
        let mut history = seeded();
        history.commit(1);
        history.reset(0);
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
