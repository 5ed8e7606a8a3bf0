//! Pending timed actions standing in for chained UI timers.
//!
//! The engine never sleeps. It queues the next action with the delay the
//! host should wait, and the host calls back once that delay has elapsed.
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<A> {
    pub delay_ms: u32,
    pub action: A,
}

/// FIFO of pending actions. Only the front one is ever due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline<A> {
    queue: VecDeque<Scheduled<A>>,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<A> Timeline<A> {
    pub fn schedule(&mut self, delay_ms: u32, action: A) {
        self.queue.push_back(Scheduled { delay_ms, action });
    }

    /// Delay before the next action is due, if any.
    #[must_use]
    pub fn next_delay_ms(&self) -> Option<u32> {
        self.queue.front().map(|scheduled| scheduled.delay_ms)
    }

    pub fn pop(&mut self) -> Option<A> {
        self.queue.pop_front().map(|scheduled| scheduled.action)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every pending action.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_fire_in_order() {
        let mut timeline = Timeline::default();
        timeline.schedule(300, 'a');
        timeline.schedule(0, 'b');
        assert_eq!(timeline.next_delay_ms(), Some(300));
        assert_eq!(timeline.pop(), Some('a'));
        assert_eq!(timeline.next_delay_ms(), Some(0));
        assert_eq!(timeline.pop(), Some('b'));
        assert!(timeline.is_empty());
        assert_eq!(timeline.next_delay_ms(), None);
    }

    #[test]
    fn cancel_reports_dropped_count() {
        let mut timeline = Timeline::default();
        timeline.schedule(1, ());
        timeline.schedule(1, ());
        assert_eq!(timeline.cancel(), 2);
        assert!(timeline.is_empty());
    }
}
