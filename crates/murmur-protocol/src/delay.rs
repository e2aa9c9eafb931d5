//! Two-slot delay lines.
//!
//! A delay line realizes bounded message delay without unbounded buffering:
//! two staging slots in front of an immediate inbox. On each round boundary
//! slot 1 spills into the inbox and slot 2 moves up, so a message staged
//! short arrives one round later and a message staged long two rounds later.

use std::collections::VecDeque;

use crate::message::Delay;

/// Per-node staging queue for one message class.
#[derive(Debug)]
pub struct DelayLine<T> {
    immediate: VecDeque<T>,
    short: Vec<T>,
    long: Vec<T>,
}

impl<T> DelayLine<T> {
    /// Create an empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            immediate: VecDeque::new(),
            short: Vec::new(),
            long: Vec::new(),
        }
    }

    /// Stage an item according to its delay outcome.
    pub fn stage(&mut self, item: T, delay: Delay) {
        match delay {
            Delay::Immediate => self.immediate.push_back(item),
            Delay::Short => self.short.push(item),
            Delay::Long => self.long.push(item),
        }
    }

    /// Drain everything due this round, in arrival order.
    pub fn drain_due(&mut self) -> impl Iterator<Item = T> + '_ {
        self.immediate.drain(..)
    }

    /// Advance one round boundary: slot 1 spills into the immediate inbox,
    /// slot 2 is promoted to slot 1.
    pub fn advance(&mut self) {
        self.immediate.extend(self.short.drain(..));
        std::mem::swap(&mut self.short, &mut self.long);
    }

    /// Items waiting anywhere in the line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.immediate.len() + self.short.len() + self.long.len()
    }

    /// Whether nothing is staged or deliverable.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl<T> Default for DelayLine<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due(line: &mut DelayLine<u32>) -> Vec<u32> {
        line.drain_due().collect()
    }

    #[test]
    fn immediate_items_are_due_at_once() {
        let mut line = DelayLine::new();
        line.stage(1, Delay::Immediate);
        line.stage(2, Delay::Immediate);
        assert_eq!(due(&mut line), vec![1, 2]);
        assert!(line.is_idle());
    }

    #[test]
    fn short_delay_arrives_one_round_later() {
        let mut line = DelayLine::new();
        line.stage(7, Delay::Short);
        assert_eq!(due(&mut line), Vec::<u32>::new());

        line.advance();
        assert_eq!(due(&mut line), vec![7]);
    }

    #[test]
    fn long_delay_arrives_two_rounds_later() {
        let mut line = DelayLine::new();
        line.stage(9, Delay::Long);

        line.advance();
        assert_eq!(due(&mut line), Vec::<u32>::new());

        line.advance();
        assert_eq!(due(&mut line), vec![9]);
        assert!(line.is_idle());
    }

    #[test]
    fn mixed_delays_preserve_schedule() {
        let mut line = DelayLine::new();
        line.stage(0, Delay::Immediate);
        line.stage(1, Delay::Short);
        line.stage(2, Delay::Long);
        assert_eq!(line.pending(), 3);

        assert_eq!(due(&mut line), vec![0]);
        line.advance();
        assert_eq!(due(&mut line), vec![1]);
        line.advance();
        assert_eq!(due(&mut line), vec![2]);
    }

    #[test]
    fn items_left_undrained_survive_advances() {
        let mut line = DelayLine::new();
        line.stage(1, Delay::Immediate);
        line.advance();
        line.stage(2, Delay::Short);
        line.advance();
        assert_eq!(due(&mut line), vec![1, 2]);
    }
}
