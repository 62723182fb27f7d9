use std::collections::VecDeque;

use image::RgbaImage;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Applied,
    NothingToUndo,
}

impl UndoOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Applied => "undo applied",
            Self::NothingToUndo => "nothing to undo",
        }
    }
}

/// Bounded stack of full clean-image snapshots; the oldest entry is evicted first.
///
/// A snapshot taken at the start of a gesture may hold the stack one over
/// capacity until the gesture commits and [`EditHistory::evict_overflow`] runs,
/// so a cancelled gesture never costs the oldest undo step.
#[derive(Debug, Clone)]
pub struct EditHistory {
    snapshots: VecDeque<RgbaImage>,
    capacity: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl EditHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::new(),
            capacity,
        }
    }

    pub fn snapshot(&mut self, clean: &RgbaImage) {
        self.snapshots.push_back(clean.clone());
    }

    /// Drops the oldest snapshots until the stack is back within capacity.
    pub fn evict_overflow(&mut self) {
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            tracing::debug!(capacity = self.capacity, "history full; evicted oldest snapshot");
        }
    }

    /// Drops the newest snapshot without restoring it.
    pub fn discard_last(&mut self) -> bool {
        self.snapshots.pop_back().is_some()
    }

    pub fn pop(&mut self) -> Option<RgbaImage> {
        self.snapshots.pop_back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([value, value, value, 255]))
    }

    #[test]
    fn snapshot_evicts_oldest_beyond_capacity() {
        let mut history = EditHistory::with_capacity(3);
        for value in 0..5 {
            history.snapshot(&solid(value));
            history.evict_overflow();
        }
        assert_eq!(history.depth(), 3);
        assert_eq!(history.pop(), Some(solid(4)));
        assert_eq!(history.pop(), Some(solid(3)));
        assert_eq!(history.pop(), Some(solid(2)));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn discard_last_pops_without_returning_snapshot() {
        let mut history = EditHistory::default();
        history.snapshot(&solid(1));
        history.snapshot(&solid(2));
        assert!(history.discard_last());
        assert_eq!(history.pop(), Some(solid(1)));
        assert!(!history.discard_last());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = EditHistory::with_capacity(0);
        history.snapshot(&solid(1));
        history.snapshot(&solid(2));
        history.evict_overflow();
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.pop(), Some(solid(2)));
        assert!(!history.can_undo());
    }

    #[test]
    fn discarded_snapshot_at_capacity_keeps_oldest_entry() {
        let mut history = EditHistory::with_capacity(2);
        for value in 1..=2 {
            history.snapshot(&solid(value));
            history.evict_overflow();
        }

        history.snapshot(&solid(3));
        assert_eq!(history.depth(), 3);
        assert!(history.discard_last());

        assert_eq!(history.depth(), 2);
        assert_eq!(history.pop(), Some(solid(2)));
        assert_eq!(history.pop(), Some(solid(1)));
    }
}
