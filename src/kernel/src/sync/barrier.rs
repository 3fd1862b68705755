//! Cyclic barrier for a fixed set of cores.

use core::{
    hint::spin_loop,
    sync::atomic::{AtomicUsize, Ordering},
};

/// A reusable rendezvous point for `participants` cores.
///
/// Each call to [`wait`](Barrier::wait) records the current epoch before
/// arriving. The last arriver of a wave resets the arrival count and advances
/// the epoch; everyone else spins until the epoch moves past the value they
/// recorded. A core can therefore never be released by a wave it did not
/// join.
///
/// Exactly `participants` cores must call `wait` per cycle. With fewer, the
/// arrivals spin forever.
pub struct Barrier {
    participants: AtomicUsize,
    count: AtomicUsize,
    epoch: AtomicUsize,
}

/// Returned by [`Barrier::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    epoch: usize,
    leader: bool,
}

impl BarrierWaitResult {
    /// The epoch this wave released into. Identical for every core of the wave.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// `true` for the single core that completed the wave and advanced the epoch.
    pub fn is_leader(&self) -> bool {
        self.leader
    }
}

impl Barrier {
    /// Create a barrier for `participants` cores.
    pub const fn new(participants: usize) -> Self {
        Self {
            participants: AtomicUsize::new(participants),
            count: AtomicUsize::new(0),
            epoch: AtomicUsize::new(0),
        }
    }

    /// Re-initialize a statically allocated barrier once the core count is known.
    ///
    /// No core may be inside [`wait`](Barrier::wait) while this runs.
    pub fn init(&self, participants: usize) {
        debug_assert!(participants > 0, "barrier needs at least one participant");
        self.participants.store(participants, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
        self.epoch.store(0, Ordering::Release);
    }

    /// Spin until all participants of the current wave have arrived.
    pub fn wait(&self) -> BarrierWaitResult {
        let entry = self.epoch.load(Ordering::Acquire);
        let next = entry.wrapping_add(1);
        let arrived = self.count.fetch_add(1, Ordering::AcqRel) + 1;

        if arrived == self.participants.load(Ordering::Relaxed) {
            // Reset before advancing: released cores may re-enter immediately.
            self.count.store(0, Ordering::Relaxed);
            self.epoch.store(next, Ordering::Release);
            BarrierWaitResult {
                epoch: next,
                leader: true,
            }
        } else {
            while self.epoch.load(Ordering::Acquire) == entry {
                spin_loop();
            }
            BarrierWaitResult {
                epoch: next,
                leader: false,
            }
        }
    }

    /// The number of completed waves.
    pub fn epoch(&self) -> usize {
        self.epoch.load(Ordering::Acquire)
    }

    /// The number of cores each wave waits for.
    pub fn participants(&self) -> usize {
        self.participants.load(Ordering::Relaxed)
    }

    /// Cores that have arrived in the current wave.
    pub fn arrived(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::vec::Vec;

    fn run_wave(participants: usize, rounds: usize) -> Vec<Vec<BarrierWaitResult>> {
        let barrier = Arc::new(Barrier::new(participants));
        let handles: Vec<_> = (0..participants)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || (0..rounds).map(|_| barrier.wait()).collect::<Vec<_>>())
            })
            .collect();

        let per_core: Vec<Vec<BarrierWaitResult>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(barrier.epoch(), rounds);
        assert_eq!(barrier.arrived(), 0);
        per_core
    }

    #[test]
    fn test_single_participant_is_always_leader() {
        let barrier = Barrier::new(1);
        for round in 1..=3 {
            let result = barrier.wait();
            assert!(result.is_leader());
            assert_eq!(result.epoch(), round);
        }
    }

    #[test]
    fn test_exactly_one_leader_per_wave() {
        for participants in 1..=6 {
            let per_core = run_wave(participants, 1);
            let leaders = per_core.iter().filter(|rounds| rounds[0].is_leader()).count();
            assert_eq!(leaders, 1, "participants = {}", participants);
        }
    }

    #[test]
    fn test_reuse_yields_increasing_epochs() {
        const CORES: usize = 4;
        const ROUNDS: usize = 50;

        let per_core = run_wave(CORES, ROUNDS);
        for round in 0..ROUNDS {
            let expected = round + 1;
            for rounds in &per_core {
                assert_eq!(rounds[round].epoch(), expected);
            }
            let leaders = per_core.iter().filter(|r| r[round].is_leader()).count();
            assert_eq!(leaders, 1);
        }
    }

    #[test]
    fn test_init_resets_state() {
        let barrier = Barrier::new(1);
        barrier.wait();
        barrier.wait();
        assert_eq!(barrier.epoch(), 2);

        barrier.init(3);
        assert_eq!(barrier.epoch(), 0);
        assert_eq!(barrier.participants(), 3);
        assert_eq!(barrier.arrived(), 0);
    }
}
