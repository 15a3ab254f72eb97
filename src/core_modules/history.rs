// THEORY:
// In a live feed every frame yields only a handful of detections, which makes a
// per-frame heatmap sparse and jittery. `DetectionHistory` keeps a sliding window
// of the most recent detections across frames so the heatmap reflects where
// debris has been accumulating over time rather than what a single frame saw.
// The window is bounded: once full, the oldest detections fall out first.

use crate::core_modules::detection::Detection;
use std::collections::VecDeque;

/// Default number of detections retained across frames.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// A bounded FIFO of detections accumulated across frames.
#[derive(Debug, Clone)]
pub struct DetectionHistory {
    capacity: usize,
    detections: VecDeque<Detection>,
}

impl DetectionHistory {
    /// A capacity of zero is bumped to one so the history can always hold the latest detection.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            detections: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends one frame's detections, evicting the oldest ones past capacity.
    /// Returns how many detections were evicted.
    pub fn extend<I>(&mut self, frame: I) -> usize
    where
        I: IntoIterator<Item = Detection>,
    {
        let mut evicted = 0;
        for detection in frame {
            self.detections.push_back(detection);
            if self.detections.len() > self.capacity {
                self.detections.pop_front();
                evicted += 1;
            }
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.detections.clear();
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    /// A contiguous copy of the retained detections, oldest first.
    pub fn snapshot(&self) -> Vec<Detection> {
        self.detections.iter().cloned().collect()
    }
}

impl Default for DetectionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
