//! Fixed-capacity rolling bar window with stable absolute indices.
//!
//! Bars keep the index they had in the stream even after older bars are
//! evicted, so swing levels and transition candidates can reference their
//! origin bar without re-indexing on every eviction.

use crate::domain::Bar;
use std::collections::VecDeque;
use std::ops::Index;

#[derive(Debug, Clone)]
pub struct BarBuffer {
    bars: VecDeque<Bar>,
    capacity: usize,
    /// Absolute stream index of `bars[0]`.
    base: usize,
}

impl BarBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "buffer capacity must be >= 2");
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
            base: 0,
        }
    }

    /// Append a bar, evicting the oldest when full. Returns the bar's
    /// absolute stream index.
    pub fn push(&mut self, bar: Bar) -> usize {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
            self.base += 1;
        }
        self.bars.push_back(bar);
        self.base + self.bars.len() - 1
    }

    /// Bar at an absolute stream index, if still retained.
    pub fn get(&self, index: usize) -> Option<&Bar> {
        index.checked_sub(self.base).and_then(|i| self.bars.get(i))
    }

    /// Absolute index of the oldest retained bar.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Absolute index of the newest bar, if any.
    pub fn latest_index(&self) -> Option<usize> {
        if self.bars.is_empty() {
            None
        } else {
            Some(self.base + self.bars.len() - 1)
        }
    }

    /// Bars currently retained.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Total bars ever pushed.
    pub fn bars_seen(&self) -> usize {
        self.base + self.bars.len()
    }
}

impl Index<usize> for BarBuffer {
    type Output = Bar;

    /// Panics if the bar at `index` was evicted or never pushed. Callers
    /// inside the engine only index bars the trackers are pruned against.
    fn index(&self, index: usize) -> &Bar {
        self.get(index)
            .unwrap_or_else(|| panic!("bar index {index} outside retained window"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar(i: usize) -> Bar {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let price = 100.0 + i as f64;
        Bar {
            time: t0 + Duration::minutes(i as i64),
            open: price,
            high: price + 1.0,
            low: price - 1.0,
            close: price + 0.5,
            volume: 1_000.0,
        }
    }

    #[test]
    fn push_returns_absolute_index() {
        let mut buf = BarBuffer::new(3);
        assert_eq!(buf.push(bar(0)), 0);
        assert_eq!(buf.push(bar(1)), 1);
        assert_eq!(buf.latest_index(), Some(1));
    }

    #[test]
    fn eviction_preserves_absolute_indices() {
        let mut buf = BarBuffer::new(3);
        for i in 0..5 {
            assert_eq!(buf.push(bar(i)), i);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.base(), 2);
        assert_eq!(buf.bars_seen(), 5);

        assert!(buf.get(1).is_none()); // evicted
        assert_eq!(buf.get(2).unwrap().open, 102.0);
        assert_eq!(buf[4].open, 104.0);
    }

    #[test]
    #[should_panic(expected = "outside retained window")]
    fn indexing_evicted_bar_panics() {
        let mut buf = BarBuffer::new(2);
        for i in 0..4 {
            buf.push(bar(i));
        }
        let _ = buf[0];
    }
}
