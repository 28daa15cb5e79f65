//! Grounded-state debouncing.

use std::collections::VecDeque;

/// Rolling window of "touched ground this tick" flags.
///
/// A single tick without a ground contact does not make the player airborne;
/// the player counts as grounded while any entry in the window is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedHistory {
    capacity: usize,
    history: VecDeque<bool>,
}

impl GroundedHistory {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "grounded history capacity must be positive");
        Self {
            capacity,
            history: VecDeque::with_capacity(capacity),
        }
    }

    /// Append this tick's result, evicting the oldest entry when full.
    pub fn push(&mut self, touched_ground: bool) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(touched_ground);
    }

    pub fn is_grounded(&self) -> bool {
        self.history.iter().any(|&touched| touched)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
