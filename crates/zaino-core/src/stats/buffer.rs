//! Fixed-capacity rolling history of flow samples
//!
//! The buffer is pre-filled with zeros so a freshly started session renders a
//! flat baseline instead of an empty chart.

use serde::Serialize;
use std::collections::VecDeque;

/// Default number of samples kept in the rolling history
pub const DEFAULT_CAPACITY: usize = 30;

/// Lower bound always included in the display range (L/min)
pub const SCALE_FLOOR: f64 = 0.0;

/// Upper bound always included in the display range (L/min)
pub const SCALE_CEILING: f64 = 100.0;

/// Rolling FIFO buffer of flow samples (L/min)
///
/// Index 0 is the oldest sample, the back is the newest.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

/// Statistics derived from a [`SampleBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowStats {
    /// `min(buffer ∪ {0})`
    pub min: f64,
    /// `max(buffer ∪ {100})`
    pub max: f64,
    /// Arithmetic mean of the buffer
    pub average: f64,
    /// Value shown as "current" on the gauge
    pub current: f64,
}

impl SampleBuffer {
    /// Create a buffer holding `capacity` zero samples
    pub fn new(capacity: usize) -> Self {
        let mut buffer = Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        };
        buffer.reset(capacity);
        buffer
    }

    /// Drop all samples and refill with `capacity` zeros
    pub fn reset(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.samples.clear();
        self.samples.reserve(capacity);
        self.samples.extend(std::iter::repeat(0.0).take(capacity));
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest sample, if any
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Copy the samples out, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Derive min/max/average, reporting `current` as the gauge value
    ///
    /// The 0 floor and 100 ceiling only widen the display range; samples
    /// outside it are kept as they are.
    pub fn stats(&self, current: f64) -> FlowStats {
        let min = self.iter().fold(SCALE_FLOOR, f64::min);
        let max = self.iter().fold(SCALE_CEILING, f64::max);
        let average = if self.samples.is_empty() {
            0.0
        } else {
            self.iter().sum::<f64>() / self.samples.len() as f64
        };

        FlowStats {
            min,
            max,
            average,
            current,
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
