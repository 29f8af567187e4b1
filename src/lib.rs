//! seqring - bounded lock-free queues for inter-thread hand-off
//!
//! A family of fixed-capacity, non-blocking queues built on one ring-buffer
//! substrate, for shared-memory multicore hand-off:
//!
//! - [`Spsc`]: single-producer single-consumer ring. Scalar, closure-based,
//!   and bulk operations; cached opposite-side indices; cache-line isolated
//!   producer/consumer state.
//! - [`ShardedMpsc`]: multi-producer over `P` SPSC shards with registered
//!   producer handles and a round-robin consumer. Zero producer-producer
//!   contention, per-producer FIFO.
//! - [`SlotMpsc`]: multi-producer over a single ring where every slot
//!   carries a sequence number encoding its lifecycle phase. Unbounded
//!   producer count, FIFO by commit order.
//! - [`SeqMpsc`]: publication scheduled by caller-supplied sequence numbers;
//!   the consumer sees a gap-free ascending stream even when producers
//!   commit out of order.
//! - [`Reorderer`]: background worker converting an unordered [`SlotMpsc`]
//!   stream of [`Sequenced`] elements into an ordered SPSC output through a
//!   two-level staging cache.
//!
//! All capacities are compile-time powers of two. Every operation is
//! non-blocking and reports "would block" in-band (`bool`, `Option`, or a
//! short count); the only waiting is the spin-yield the sequence-gated
//! queues perform by design. Element types must be [`Copy`]: slots are
//! recycled by raw byte copy and destructors never run - store handles or
//! indices for anything richer.
//!
//! # Example
//!
//! ```
//! use seqring::Spsc;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let ring: Arc<Spsc<u64, 1024>> = Arc::new(Spsc::new());
//!
//! let producer = {
//!     let ring = Arc::clone(&ring);
//!     thread::spawn(move || {
//!         for i in 0..10_000u64 {
//!             while !ring.push(i) {
//!                 std::hint::spin_loop();
//!             }
//!         }
//!     })
//! };
//!
//! let mut next = 0u64;
//! while next < 10_000 {
//!     if let Some(v) = ring.pop() {
//!         assert_eq!(v, next);
//!         next += 1;
//!     }
//! }
//! producer.join().unwrap();
//! ```

mod backoff;
mod invariants;
mod metrics;
mod reorder;
mod ring;
mod seq;
mod sharded;
mod slot;

pub use backoff::Backoff;
pub use metrics::{ReorderSnapshot, ReorderStats};
pub use reorder::{Reorderer, Sequenced};
pub use ring::Spsc;
pub use seq::SeqMpsc;
pub use sharded::{RegisterError, ShardProducer, ShardedMpsc};
pub use slot::SlotMpsc;
