//! Fixed-size pool of identical service channels.
//!
//! The pool itself holds no lock: it is plain data owned by the
//! dispatcher's single mutex, which is what makes a scan-and-mark in
//! `try_acquire` atomic with respect to every other acquire and release.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::PoolError;
use crate::types::ChannelIndex;

#[derive(Clone, Copy, Debug, Default)]
struct ChannelSlot {
    busy: bool,
    acquired_at: Option<Instant>,
}

#[derive(Debug)]
pub struct ChannelPool {
    slots: Vec<ChannelSlot>,
    busy: usize,
    /// Sum of occupied durations of every completed service.
    busy_time: Duration,
}

impl ChannelPool {
    pub fn new(channels: usize) -> Result<Self, PoolError> {
        if channels == 0 {
            return Err(PoolError::NoChannels);
        }

        Ok(Self {
            slots: vec![ChannelSlot::default(); channels],
            busy: 0,
            busy_time: Duration::ZERO,
        })
    }

    /// Claims the lowest-indexed free channel, stamping it with `now`.
    pub fn try_acquire(&mut self, now: Instant) -> Option<ChannelIndex> {
        let (idx, slot) = self.slots.iter_mut().enumerate().find(|(_, s)| !s.busy)?;

        slot.busy = true;
        slot.acquired_at = Some(now);
        self.busy += 1;

        Some(ChannelIndex(idx))
    }

    /// Frees `channel` and returns how long it was held.
    ///
    /// Releasing a channel that is not busy is rejected without touching
    /// `busy_time`.
    pub fn release(&mut self, channel: ChannelIndex, now: Instant) -> Result<Duration, PoolError> {
        let capacity = self.slots.len();
        let slot = self
            .slots
            .get_mut(channel.get())
            .ok_or(PoolError::OutOfRange(channel, capacity))?;

        let acquired_at = match (slot.busy, slot.acquired_at) {
            (true, Some(at)) => at,
            _ => return Err(PoolError::SlotNotBusy(channel)),
        };

        let held = now.saturating_duration_since(acquired_at);

        slot.busy = false;
        slot.acquired_at = None;
        self.busy -= 1;
        self.busy_time += held;

        Ok(held)
    }

    pub fn busy_count(&self) -> usize {
        self.busy
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_busy(&self, channel: ChannelIndex) -> bool {
        self.slots.get(channel.get()).is_some_and(|s| s.busy)
    }

    pub fn is_idle(&self) -> bool {
        self.busy == 0
    }

    pub fn busy_time(&self) -> Duration {
        self.busy_time
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Acquire,
        Release(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Acquire), (0usize..8).prop_map(Op::Release)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn busy_count_stays_within_capacity(
            channels in 1usize..8,
            ops in prop::collection::vec(op(), 0..200),
        ) {
            let mut pool = ChannelPool::new(channels).unwrap();
            let t0 = Instant::now();
            let mut held = std::collections::HashSet::new();

            for (step, op) in ops.into_iter().enumerate() {
                let now = t0 + Duration::from_millis(step as u64);
                match op {
                    Op::Acquire => {
                        if let Some(ch) = pool.try_acquire(now) {
                            // Never hand out an index that is already held.
                            prop_assert!(held.insert(ch));
                        } else {
                            prop_assert_eq!(held.len(), channels);
                        }
                    }
                    Op::Release(i) => {
                        let ch = ChannelIndex(i);
                        let was_held = held.remove(&ch);
                        prop_assert_eq!(pool.release(ch, now).is_ok(), was_held);
                    }
                }

                prop_assert!(pool.busy_count() <= channels);
                prop_assert_eq!(pool.busy_count(), held.len());
            }

            // Every release covers at most the steps elapsed on one channel.
            let horizon = Duration::from_millis(200);
            prop_assert!(pool.busy_time() <= horizon * channels as u32);
        }
    }
}
