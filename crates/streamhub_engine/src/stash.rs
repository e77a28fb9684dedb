//! Overflow stash for entities displaced from a bounded visible set.

use tracing::trace;

/// Holds displaced items and releases them at a throttled rate.
///
/// Items come back last-in-first-out. A release happens only when the
/// cadence counter, ticked once per insertion into the owning list,
/// reaches the release interval, and only while the goal is positive.
/// Releases never exceed the goal units granted since the last
/// `set_goal(0)`.
#[derive(Debug, Clone)]
pub struct OverflowStash<T> {
    stack: Vec<T>,
    goal: usize,
    cadence: usize,
    release_interval: usize,
}

impl<T> OverflowStash<T> {
    /// Creates an empty stash releasing every `release_interval` insertions.
    ///
    /// An interval of zero is raised to one.
    pub fn new(release_interval: usize) -> Self {
        Self {
            stack: Vec::new(),
            goal: 0,
            cadence: 0,
            release_interval: release_interval.max(1),
        }
    }

    /// Pushes a displaced item.
    pub fn stack(&mut self, item: T) {
        self.stack.push(item);
    }

    /// Sets how many items may be released automatically.
    ///
    /// `set_goal(0)` suppresses any pending release immediately.
    pub fn set_goal(&mut self, goal: usize) {
        self.goal = goal;
        if goal == 0 {
            self.cadence = 0;
        }
    }

    /// Returns the remaining goal.
    pub fn goal(&self) -> usize {
        self.goal
    }

    /// Returns the release interval.
    pub fn release_interval(&self) -> usize {
        self.release_interval
    }

    /// Records one insertion into the owning list.
    ///
    /// Returns the released item when this insertion completes an
    /// interval, the goal allows it and the stash is not empty.
    pub fn record_insert(&mut self) -> Option<T> {
        self.cadence += 1;
        if self.cadence < self.release_interval {
            return None;
        }
        self.cadence = 0;
        self.release()
    }

    fn release(&mut self) -> Option<T> {
        if self.goal == 0 {
            trace!(stashed = self.stack.len(), "release suppressed, no goal");
            return None;
        }
        let item = self.stack.pop()?;
        self.goal -= 1;
        Some(item)
    }

    /// Returns the number of stashed items.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if nothing is stashed.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns the item that would be released next.
    pub fn peek(&self) -> Option<&T> {
        self.stack.last()
    }

    /// Finds a stashed item.
    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.stack.iter_mut().rev().find(|item| predicate(item))
    }

    /// Removes and returns the most recently stashed item matching `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.stack.iter().rposition(|item| predicate(item))?;
        Some(self.stack.remove(index))
    }
}

impl<T> Default for OverflowStash<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_ticks(stash: &mut OverflowStash<&'static str>, ticks: usize) -> Vec<&'static str> {
        (0..ticks).filter_map(|_| stash.record_insert()).collect()
    }

    #[test]
    fn releases_last_in_first_out() {
        let mut stash = OverflowStash::new(1);
        stash.stack("a");
        stash.stack("b");
        stash.set_goal(2);

        assert_eq!(stash.record_insert(), Some("b"));
        assert_eq!(stash.record_insert(), Some("a"));
        assert!(stash.is_empty());
    }

    #[test]
    fn releases_on_interval_only() {
        let mut stash = OverflowStash::new(3);
        stash.stack("a");
        stash.set_goal(1);

        assert_eq!(stash.record_insert(), None);
        assert_eq!(stash.record_insert(), None);
        assert_eq!(stash.record_insert(), Some("a"));
        assert_eq!(stash.goal(), 0);
    }

    #[test]
    fn zero_goal_blocks_until_raised() {
        let mut stash = OverflowStash::new(1);
        stash.stack("a");
        stash.stack("b");
        stash.set_goal(5);
        stash.set_goal(0);

        assert!(drain_ticks(&mut stash, 4).is_empty());
        assert_eq!(stash.len(), 2);

        stash.set_goal(1);
        assert_eq!(drain_ticks(&mut stash, 4), vec!["b"]);
    }

    #[test]
    fn empty_stash_does_not_consume_goal() {
        let mut stash: OverflowStash<&str> = OverflowStash::new(1);
        stash.set_goal(1);
        assert_eq!(stash.record_insert(), None);
        assert_eq!(stash.goal(), 1);

        stash.stack("late");
        assert_eq!(stash.record_insert(), Some("late"));
    }

    #[test]
    fn find_and_remove() {
        let mut stash = OverflowStash::new(2);
        stash.stack(1);
        stash.stack(2);
        stash.stack(3);

        if let Some(item) = stash.find_mut(|n| *n == 2) {
            *item = 20;
        }
        assert_eq!(stash.remove_where(|n| *n == 20), Some(20));
        assert_eq!(stash.peek(), Some(&3));
        assert_eq!(stash.len(), 2);
        assert_eq!(OverflowStash::<u8>::default().release_interval(), 1);
    }
}
