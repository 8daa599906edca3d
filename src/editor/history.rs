// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::snapshot::StructureSnapshot;
use crate::editor::settings::DEFAULT_HISTORY_CAPACITY;
use log::{debug, warn};
use std::collections::VecDeque;

/// Bounded undo ring of structure snapshots. The entry at `index` is the state the structure is
/// currently in; entries after it can be redone.
#[derive(Debug, Clone)]
pub struct History {
    states: VecDeque<StructureSnapshot>,
    index: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            states: VecDeque::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// History whose only state is `initial`.
    pub fn with_initial(capacity: usize, initial: StructureSnapshot) -> Self {
        let mut history = Self::new(capacity);
        history.save_state(initial);
        history
    }

    /// Records `snapshot` as the current state, discarding anything that could have been redone.
    pub fn save_state(&mut self, snapshot: StructureSnapshot) {
        if !self.states.is_empty() {
            self.states.truncate(self.index + 1);
        }
        self.states.push_back(snapshot);
        if self.states.len() > self.capacity {
            self.states.pop_front();
            warn!("undo history full, dropped the oldest of {} states", self.capacity);
        }
        self.index = self.states.len() - 1;
        debug!("history: {} states, at {}", self.states.len(), self.index);
    }

    /// Steps back and returns the state to restore.
    pub fn undo(&mut self) -> Option<&StructureSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.states.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&StructureSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.states.get(self.index)
    }

    /// The state [`Self::undo`] would return, without moving.
    pub fn peek_undo(&self) -> Option<&StructureSnapshot> {
        self.index.checked_sub(1).and_then(|i| self.states.get(i))
    }

    pub fn peek_redo(&self) -> Option<&StructureSnapshot> {
        self.states.get(self.index + 1)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    pub fn current(&self) -> Option<&StructureSnapshot> {
        self.states.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.index = 0;
    }
}
