use std::hint;
use std::thread;

/// Escalating wait for the two contention shapes in this ring family.
///
/// [`spin`](Backoff::spin) is for producer-producer races on a shared tail:
/// a lost CAS means another producer advanced the queue, so the wait stays a
/// short exponential burst of PAUSE hints and never leaves the core.
///
/// [`snooze`](Backoff::snooze) is for waiting on the opposite side of a ring
/// (a consumer that has not recycled a slot yet, a reader that has not
/// drained a full output). It burns a fixed pause budget first, then yields
/// to the scheduler on every further call. The waits that use it are
/// unbounded by design, so there is no give-up state to track; start a wait
/// with [`new`](Backoff::new) and drop the value when it ends.
#[derive(Debug, Default)]
pub struct Backoff {
    /// PAUSE iterations burned so far in this wait.
    spent: u32,
}

impl Backoff {
    /// Pause budget consumed before `snooze` starts yielding. Sized to a few
    /// cross-core cache-line round trips; a peer that has not progressed by
    /// then is usually descheduled.
    const SPIN_BUDGET: u32 = 96;

    /// Longest single burst of PAUSE hints.
    const MAX_BURST: u32 = 32;

    /// Starts a fresh wait.
    #[inline]
    pub fn new() -> Self {
        Self { spent: 0 }
    }

    /// Short exponential pause after a lost race. Never yields.
    #[inline]
    pub fn spin(&mut self) {
        let burst = (self.spent + 1).next_power_of_two().min(Self::MAX_BURST);
        for _ in 0..burst {
            hint::spin_loop();
        }
        self.spent = self.spent.saturating_add(burst);
    }

    /// Pause while the budget lasts, then yield to the scheduler.
    #[inline]
    pub fn snooze(&mut self) {
        if self.spent < Self::SPIN_BUDGET {
            self.spin();
        } else {
            thread::yield_now();
        }
    }
}
