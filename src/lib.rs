//! double-hashmap: a single-threaded, open-addressed map from byte-string
//! keys to `i64` values, with double hashing and tombstone deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build DoubleHashMap in small, verifiable layers so each piece
//!   can be reasoned about independently.
//! - Layers:
//!   - probe::ProbeSeed: per-map hash coefficients and the double-hash
//!     probe sequence; drawn once at construction, immutable afterwards.
//!   - slot::SlotArray: the physical slot array plus the two occupancy
//!     counters; the only place counters change.
//!   - DoubleHashMap: public API that walks probe sequences over the slot
//!     array and triggers load-factor resizes.
//!
//! Constraints
//! - Single-threaded: exclusive access through `&mut self`; external
//!   serialization is the caller's job if a map must cross threads.
//! - Keys are copied into map-owned storage on insert; the map never
//!   aliases caller buffers, so caller lifetimes cannot invalidate it.
//! - A key's probe sequence is identical on every call for the life of the
//!   map. Everything else is built on this: an insert places an entry along
//!   the same path a later lookup will walk.
//! - Capacities are powers of two (8 * 2^k) and probe strides are odd, so
//!   every probe sequence permutes the whole array and insertion below the
//!   load ceiling always finds a free slot.
//!
//! Why this split?
//! - Localize invariants: counter bookkeeping lives entirely in `slot`,
//!   determinism entirely in `probe`, policy (load factors, resize
//!   transitions, update-in-place) entirely in the map layer.
//! - Deletion is lazy: `remove` tombstones its slot so probe sequences that
//!   ran past it keep resolving; tombstones are physically discarded only
//!   when a resize rebuilds the array.
//!
//! Failure semantics
//! - Absent keys and broken resize placements surface as `TableError`
//!   values; no operation aborts the process. Allocation failure follows
//!   the global allocator's abort policy, as for any owned container.
//!
//! Notes and non-goals
//! - No iteration or enumeration API.
//! - Values are `i64` only; keys are immutable finite byte strings.
//! - No internal locking and no `Send`/`Sync` machinery beyond what the
//!   field types derive naturally.
//! - Public API surface is `DoubleHashMap` and `TableError`; `probe` is
//!   exposed for inspection and benchmarks but is an implementation detail.

mod double_hash_map;
mod double_hash_map_proptest;
pub mod probe;
mod slot;

// Public surface
pub use double_hash_map::{DoubleHashMap, TableError, INITIAL_CAPACITY};
