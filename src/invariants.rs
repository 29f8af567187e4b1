//! Debug assertion macros for the index and phase invariants of the rings.
//!
//! Only active in debug builds (`debug_assertions`), so there is zero
//! overhead in release builds. Shared by the SPSC ring and both slot-based
//! MPSC rings.

/// Assert that an occupancy count stays within the ring's bound.
///
/// The SPSC ring holds at most `N - 1` items (one slot disambiguates full
/// from empty); the slot-based rings hold at most `N`.
macro_rules! debug_assert_occupancy {
    ($count:expr, $bound:expr) => {
        debug_assert!(
            $count <= $bound,
            "ring occupancy {} exceeds bound {}",
            $count,
            $bound
        )
    };
}

/// Assert that a masked slot index is inside the ring.
///
/// Holds trivially when the mask is `N - 1` and `N` is a power of two;
/// catches arithmetic bugs if the index computation changes.
macro_rules! debug_assert_in_ring {
    ($idx:expr, $capacity:expr) => {
        debug_assert!(
            $idx < $capacity,
            "slot index {} outside ring of {} slots",
            $idx,
            $capacity
        )
    };
}

/// Assert that a slot's sequence is one of the three values its phase cycle
/// permits at position `pos`: `pos` (writable), `pos + 1` (readable), or
/// `pos + N` (consumed, writable next revolution).
macro_rules! debug_assert_phase {
    ($seq:expr, $pos:expr, $capacity:expr) => {
        debug_assert!(
            $seq == $pos
                || $seq == $pos.wrapping_add(1)
                || $seq == $pos.wrapping_add($capacity),
            "slot sequence {} incompatible with position {} (capacity {})",
            $seq,
            $pos,
            $capacity
        )
    };
}

pub(crate) use debug_assert_in_ring;
pub(crate) use debug_assert_occupancy;
pub(crate) use debug_assert_phase;
