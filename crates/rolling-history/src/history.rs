//! Rolling History Implementation

use std::collections::vec_deque::{self, VecDeque};
use thiserror::Error;

/// Errors creating a rolling history
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A window must hold at least one value
    #[error("history length must be at least 1")]
    ZeroCapacity,
}

/// Fixed-length FIFO window, oldest value first
#[derive(Debug, Clone)]
pub struct RollingHistory<T = u64> {
    /// Stored values, always exactly `capacity` long
    values: VecDeque<T>,
    /// Window length
    capacity: usize,
}

impl<T: Clone + Default> RollingHistory<T> {
    /// Create a window of `capacity` default values
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        let mut values = VecDeque::with_capacity(capacity);
        values.resize(capacity, T::default());
        Ok(Self { values, capacity })
    }

    /// Append a value, returning the evicted oldest one
    pub fn push(&mut self, value: T) -> T {
        // Invariant: the window is always full, so there is always a front.
        let evicted = self.values.pop_front().unwrap_or_default();
        self.values.push_back(value);
        evicted
    }
}

impl<T> RollingHistory<T> {
    /// Number of stored values (always equals `capacity`)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; a history is never empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Window length
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: Clone> RollingHistory<T> {
    /// Copy out the window, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_full_of_zeroes() {
        let history: RollingHistory = RollingHistory::new(4).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history.to_vec(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RollingHistory::<u64>::new(0).unwrap_err(),
            HistoryError::ZeroCapacity
        );
    }

    #[test]
    fn test_evicts_oldest() {
        let mut history = RollingHistory::new(3).unwrap();
        for value in [5u64, 7, 9, 11] {
            history.push(value);
        }
        assert_eq!(history.to_vec(), vec![7, 9, 11]);
        assert_eq!(history.iter().last(), Some(&11));
    }

    #[test]
    fn test_push_returns_evicted_value() {
        let mut history = RollingHistory::new(2).unwrap();
        assert_eq!(history.push(1u64), 0);
        assert_eq!(history.push(2), 0);
        assert_eq!(history.push(3), 1);
    }

    proptest! {
        #[test]
        fn prop_length_is_constant(
            capacity in 1usize..64,
            values in proptest::collection::vec(any::<u64>(), 0..200),
        ) {
            let mut history = RollingHistory::new(capacity).unwrap();
            prop_assert_eq!(history.len(), capacity);
            for value in values {
                history.push(value);
                prop_assert_eq!(history.len(), capacity);
            }
        }

        #[test]
        fn prop_keeps_most_recent_in_arrival_order(
            capacity in 1usize..32,
            extra in 0usize..64,
            seed in any::<u64>(),
        ) {
            let total = capacity + extra;
            let values: Vec<u64> = (0..total as u64).map(|i| seed.wrapping_add(i)).collect();

            let mut history = RollingHistory::new(capacity).unwrap();
            for value in &values {
                history.push(*value);
            }

            prop_assert_eq!(history.to_vec(), values[extra..].to_vec());
        }
    }
}
