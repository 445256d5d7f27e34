// Fixed-capacity history per metric stream, oldest first.

use std::collections::VecDeque;

/// Highest sparkline level; levels are in `0..=SPARK_LEVELS`.
pub const SPARK_LEVELS: u8 = 7;

/// Sliding window over the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> HistoryBuffer<T> {
    /// A zero capacity is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Starts full of `fill`, so a sparkline has its final width from the first tick.
    pub fn filled(capacity: usize, fill: T) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.values.extend(std::iter::repeat_n(fill, buffer.capacity));
        buffer
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn values(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Maps values to sparkline levels in `[0, 7]`: `floor(value / max * 7)`.
///
/// The divisor is the largest value when positive, 1 otherwise, so an all-zero window is
/// all zeros. Negative and non-finite values sit at level 0.
pub fn normalize(values: &[f64]) -> Vec<u8> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() || v <= 0.0 {
                return 0;
            }
            let level = (v / divisor * f64::from(SPARK_LEVELS)).floor();
            level.clamp(0.0, f64::from(SPARK_LEVELS)) as u8
        })
        .collect()
}
