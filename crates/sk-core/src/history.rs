//! Bounded history of applied overrides
//!
//! A linear log, not an undo tree: recording always appends at the end and
//! moves the cursor there, even when the cursor was parked on an older
//! entry. Nothing past the cursor is pruned.

use std::collections::VecDeque;

use crate::types::{HistoryEntry, StyleOverride};

/// Result of moving the cursor by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Cursor moved; the caller re-injects this override.
    Moved(StyleOverride),
    /// Already on the oldest entry. Nothing changed.
    EarliestReached,
    /// Already on the newest entry. Nothing changed.
    LatestReached,
    /// The ledger holds no entries.
    Empty,
}

/// Append-only, size-bounded log with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
}

impl HistoryLedger {
    /// Create an empty ledger holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    /// Rebuild a ledger from persisted entries, cursor on the newest one.
    /// Entries beyond the bound are evicted oldest first.
    pub fn from_entries(entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let mut ledger = Self::new(capacity);
        ledger.entries.extend(entries);
        ledger.evict_overflow();
        ledger.cursor = ledger.entries.len().checked_sub(1);
        ledger
    }

    /// Append `style` unless its CSS equals the newest entry's CSS.
    /// Returns whether an entry was added.
    pub fn record(&mut self, style: StyleOverride, applied_at: u64) -> bool {
        if self.entries.back().is_some_and(|last| last.style.css == style.css) {
            return false;
        }

        self.entries.push_back(HistoryEntry { style, applied_at });
        self.evict_overflow();
        self.cursor = Some(self.entries.len() - 1);
        true
    }

    /// Move the cursor by `direction` (-1 undo, +1 redo).
    ///
    /// Stepping past either end is a no-op that reports the boundary; the
    /// boundary entry itself is not handed back for re-application.
    pub fn navigate(&mut self, direction: i8) -> Navigation {
        if self.entries.is_empty() {
            return Navigation::Empty;
        }

        let current = self.cursor.map_or(-1, |c| c as i64);
        let target = current + i64::from(direction);

        if target < 0 {
            return Navigation::EarliestReached;
        }
        if target >= self.entries.len() as i64 {
            return Navigation::LatestReached;
        }

        let target = target as usize;
        self.cursor = Some(target);
        Navigation::Moved(self.entries[target].style.clone())
    }

    /// Park the cursor on `index` and return that entry's override.
    pub fn jump_to(&mut self, index: usize) -> Option<StyleOverride> {
        let entry = self.entries.get(index)?;
        self.cursor = Some(index);
        Some(entry.style.clone())
    }

    /// Put the cursor back where a failed re-application found it.
    pub fn restore_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor.filter(|&c| c < self.entries.len());
    }

    /// Drop every entry and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Index of the cursor, `None` when there is no history.
    #[inline]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Owned copy in chronological order, as persisted.
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    fn evict_overflow(&mut self) {
        let overflow = self.entries.len().saturating_sub(self.capacity);
        self.entries.drain(..overflow);
    }
}
