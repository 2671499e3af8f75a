use core::cell::UnsafeCell;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::Sample;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn from_selector(selector: bool) -> Self {
        if selector {
            Slot::B
        } else {
            Slot::A
        }
    }

    fn selector(self) -> bool {
        self == Slot::B
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Completion {
    Swapped { settled: Slot },
    // Previous batch still pending, the completed one is refilled and lost
    Overrun { dropped: u32 },
}

pub struct DoubleBuffer<const N: usize> {
    buffers: [UnsafeCell<[Sample; N]>; 2],
    selector: AtomicBool,
    pending: AtomicBool,
    // Both counters have a single writer, the interrupt handler
    swaps: AtomicU32,
    dropped: AtomicU32,
}

// Access to `buffers` is partitioned by the selector/pending handshake
unsafe impl<const N: usize> Sync for DoubleBuffer<N> {}

impl<const N: usize> DoubleBuffer<N> {
    pub const fn new() -> Self {
        DoubleBuffer {
            buffers: [UnsafeCell::new([0; N]), UnsafeCell::new([0; N])],
            selector: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            swaps: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    pub fn split(&mut self) -> (Filler<'_, N>, Drainer<'_, N>) {
        let active = Slot::from_selector(self.selector.load(Ordering::Relaxed));
        // A swap left unconsumed by a previous split must still be drained
        let last_seen = if self.pending.load(Ordering::Acquire) {
            active.other()
        } else {
            active
        };
        let shared: &Self = self;
        (Filler { shared, active }, Drainer { shared, last_seen })
    }

    fn slot_ptr(&self, slot: Slot) -> *mut Sample {
        self.buffers[slot.index()].get() as *mut Sample
    }
}

impl<const N: usize> Default for DoubleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Filler<'a, const N: usize> {
    shared: &'a DoubleBuffer<N>,
    active: Slot,
}

impl<'a, const N: usize> Filler<'a, N> {
    pub fn active(&self) -> Slot {
        self.active
    }

    pub fn target(&mut self) -> (*mut Sample, usize) {
        (self.shared.slot_ptr(self.active), N)
    }

    pub fn complete(&mut self) -> Completion {
        if self.shared.pending.load(Ordering::Acquire) {
            let dropped = self.shared.dropped.load(Ordering::Relaxed).wrapping_add(1);
            self.shared.dropped.store(dropped, Ordering::Relaxed);
            return Completion::Overrun { dropped };
        }

        let settled = self.active;
        self.active = settled.other();
        self.shared
            .selector
            .store(self.active.selector(), Ordering::Relaxed);
        let swaps = self.shared.swaps.load(Ordering::Relaxed).wrapping_add(1);
        self.shared.swaps.store(swaps, Ordering::Relaxed);
        // Publishes the selector flip together with the flag
        self.shared.pending.store(true, Ordering::Release);
        Completion::Swapped { settled }
    }
}

pub struct Drainer<'a, const N: usize> {
    shared: &'a DoubleBuffer<N>,
    last_seen: Slot,
}

impl<'a, const N: usize> Drainer<'a, N> {
    /// Hands out the buffer settled by the last swap. No further swap happens
    /// until the guard drops.
    pub fn poll(&mut self) -> Option<Settled<'_, N>> {
        if !self.shared.pending.load(Ordering::Acquire) {
            return None;
        }
        let active = Slot::from_selector(self.shared.selector.load(Ordering::Relaxed));
        if active == self.last_seen {
            return None;
        }
        self.last_seen = active;
        Some(Settled {
            shared: self.shared,
            slot: active.other(),
        })
    }

    pub fn swaps(&self) -> u32 {
        self.shared.swaps.load(Ordering::Relaxed)
    }

    pub fn dropped_batches(&self) -> u32 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

pub struct Settled<'d, const N: usize> {
    shared: &'d DoubleBuffer<N>,
    slot: Slot,
}

impl<'d, const N: usize> Settled<'d, N> {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

impl<'d, const N: usize> Deref for Settled<'d, N> {
    type Target = [Sample; N];

    fn deref(&self) -> &Self::Target {
        // The filler never targets the settled slot while pending is set
        unsafe { &*self.shared.buffers[self.slot.index()].get() }
    }
}

impl<'d, const N: usize> Drop for Settled<'d, N> {
    fn drop(&mut self) {
        // All reads of the slot happen before the handler may see pending clear
        self.shared.pending.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(filler: &mut Filler<'_, 4>, samples: [Sample; 4]) {
        let (ptr, len) = filler.target();
        assert_eq!(len, 4);
        unsafe { core::ptr::copy_nonoverlapping(samples.as_ptr(), ptr, len) };
    }

    #[test]
    fn starts_on_a_with_nothing_settled() {
        let mut buffers = DoubleBuffer::<4>::new();
        let (filler, mut drainer) = buffers.split();
        assert_eq!(filler.active(), Slot::A);
        assert!(drainer.poll().is_none());
    }

    #[test]
    fn completion_settles_the_filled_slot() {
        let mut buffers = DoubleBuffer::<4>::new();
        let (mut filler, mut drainer) = buffers.split();

        fill(&mut filler, [1, 2, 3, 4]);
        assert_eq!(filler.complete(), Completion::Swapped { settled: Slot::A });
        assert_eq!(filler.active(), Slot::B);

        let settled = drainer.poll().unwrap();
        assert_eq!(settled.slot(), Slot::A);
        assert_eq!(*settled, [1, 2, 3, 4]);
    }

    #[test]
    fn swap_is_reported_once() {
        let mut buffers = DoubleBuffer::<4>::new();
        let (mut filler, mut drainer) = buffers.split();

        filler.complete();
        drop(drainer.poll().unwrap());
        assert!(drainer.poll().is_none());
    }

    #[test]
    fn held_guard_turns_completion_into_overrun() {
        let mut buffers = DoubleBuffer::<4>::new();
        let (mut filler, mut drainer) = buffers.split();

        filler.complete();
        let settled = drainer.poll().unwrap();
        assert_eq!(filler.complete(), Completion::Overrun { dropped: 1 });
        assert_eq!(filler.active(), Slot::B);
        drop(settled);

        assert_eq!(filler.complete(), Completion::Swapped { settled: Slot::B });
        assert_eq!(filler.active(), Slot::A);
        assert_eq!(drainer.dropped_batches(), 1);
        assert_eq!(drainer.swaps(), 2);
    }

    #[test]
    fn resplit_hands_out_unconsumed_swap() {
        let mut buffers = DoubleBuffer::<4>::new();
        {
            let (mut filler, _drainer) = buffers.split();
            fill(&mut filler, [6, 7, 8, 9]);
            assert_eq!(filler.complete(), Completion::Swapped { settled: Slot::A });
        }

        let (mut filler, mut drainer) = buffers.split();
        assert_eq!(filler.active(), Slot::B);
        let settled = drainer.poll().unwrap();
        assert_eq!(settled.slot(), Slot::A);
        assert_eq!(*settled, [6, 7, 8, 9]);
        drop(settled);

        assert_eq!(filler.complete(), Completion::Swapped { settled: Slot::B });
        assert_eq!(drainer.dropped_batches(), 0);
    }

    #[test]
    fn resplit_without_pending_swap_reports_nothing() {
        let mut buffers = DoubleBuffer::<4>::new();
        {
            let (mut filler, mut drainer) = buffers.split();
            filler.complete();
            drop(drainer.poll().unwrap());
        }

        let (filler, mut drainer) = buffers.split();
        assert_eq!(filler.active(), Slot::B);
        assert!(drainer.poll().is_none());
    }

    #[test]
    fn target_never_points_at_settled_slot() {
        let mut buffers = DoubleBuffer::<4>::new();
        let (mut filler, mut drainer) = buffers.split();

        for _ in 0..5 {
            filler.complete();
            let settled = drainer.poll().unwrap();
            let (target, _) = filler.target();
            assert_ne!(target as *const Sample, settled.as_ptr());
        }
    }
}
